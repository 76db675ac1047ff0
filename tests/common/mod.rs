//! Shared utilities for integration tests: framed mock backends and a
//! bridge bound to loopback.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use game_bridge::config::BridgeConfig;
use game_bridge::protocol::{encode, Reassembler, DEFAULT_MAX_FRAME_SIZE};
use game_bridge::relay::SessionRegistry;
use game_bridge::{BridgeServer, Shutdown};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Frame `payload` for the wire.
pub fn frame(payload: &str) -> Vec<u8> {
    encode(payload).unwrap().to_vec()
}

/// An address nothing is listening on.
pub async fn unused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// An address whose connect attempts hang instead of failing. Returns
/// `None` when the host has no route and refuses straight away.
pub async fn unroutable_addr() -> Option<SocketAddr> {
    let addr: SocketAddr = "10.255.255.1:5050".parse().unwrap();
    match tokio::time::timeout(Duration::from_millis(300), TcpStream::connect(addr)).await {
        Err(_) => Some(addr),
        Ok(_) => None,
    }
}

/// Backend that echoes every frame back on the same connection.
pub async fn start_echo_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut reassembler = Reassembler::new(DEFAULT_MAX_FRAME_SIZE);
                let mut buf = [0u8; 4096];
                loop {
                    let n = match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => n,
                    };
                    for f in reassembler.push(&buf[..n]).frames {
                        let text = f.as_text().unwrap();
                        if socket.write_all(&frame(text)).await.is_err() {
                            return;
                        }
                    }
                }
            });
        }
    });

    addr
}

/// Backend that reads each request to end-of-input, then answers with one
/// frame built by `respond`. Returns the address and a connection counter.
pub async fn start_oneshot_backend<F>(respond: F) -> (SocketAddr, Arc<AtomicUsize>)
where
    F: Fn(&str) -> String + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let connections = Arc::new(AtomicUsize::new(0));
    let counter = connections.clone();
    let respond = Arc::new(respond);

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            counter.fetch_add(1, Ordering::SeqCst);
            let respond = respond.clone();
            tokio::spawn(async move {
                let mut request = Vec::new();
                if socket.read_to_end(&mut request).await.is_err() {
                    return;
                }
                let mut reassembler = Reassembler::new(DEFAULT_MAX_FRAME_SIZE);
                let frames = reassembler.push(&request).frames;
                let Some(first) = frames.first() else {
                    return;
                };
                let reply = respond(first.as_text().unwrap());
                let _ = socket.write_all(&frame(&reply)).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    (addr, connections)
}

/// Backend that answers with raw bytes, ignoring what it was sent.
pub async fn start_raw_backend(reply: Vec<u8>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let reply = reply.clone();
            tokio::spawn(async move {
                let mut sink = Vec::new();
                let _ = socket.read_to_end(&mut sink).await;
                let _ = socket.write_all(&reply).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    addr
}

/// Backend that hands each accepted connection to the test.
pub async fn start_capture_backend() -> (SocketAddr, mpsc::UnboundedReceiver<TcpStream>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            if tx.send(socket).is_err() {
                break;
            }
        }
    });

    (addr, rx)
}

/// Read from `socket` until one full frame arrives; returns its text.
pub async fn read_frame(socket: &mut TcpStream) -> String {
    let mut reassembler = Reassembler::new(DEFAULT_MAX_FRAME_SIZE);
    let mut buf = [0u8; 4096];
    loop {
        let n = socket.read(&mut buf).await.unwrap();
        assert!(n > 0, "connection closed before a full frame");
        if let Some(f) = reassembler.push(&buf[..n]).frames.into_iter().next() {
            return f.as_text().unwrap().to_string();
        }
    }
}

/// Wait until `socket` reaches end-of-input.
pub async fn expect_eof(socket: &mut TcpStream) {
    let mut buf = [0u8; 64];
    let result = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match socket.read(&mut buf).await {
                Ok(0) | Err(_) => return,
                Ok(_) => continue,
            }
        }
    })
    .await;
    assert!(result.is_ok(), "backend socket was not closed");
}

/// Poll `check` until it holds or two seconds pass.
pub async fn eventually<F: Fn() -> bool>(check: F) -> bool {
    for _ in 0..80 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    check()
}

pub struct TestBridge {
    pub http_addr: SocketAddr,
    pub ws_addr: SocketAddr,
    pub registry: SessionRegistry,
    pub shutdown: Shutdown,
    pub config_tx: mpsc::UnboundedSender<BridgeConfig>,
    pub handle: JoinHandle<Result<(), std::io::Error>>,
}

impl TestBridge {
    pub fn http_url(&self, path: &str) -> String {
        format!("http://{}{}", self.http_addr, path)
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}/", self.ws_addr)
    }
}

/// Config pointing at `backend`, with short timeouts.
pub fn test_config(backend: SocketAddr) -> BridgeConfig {
    let mut config = BridgeConfig::default();
    config.backend.host = backend.ip().to_string();
    config.backend.port = backend.port();
    config.timeouts.connect_secs = 2;
    config.timeouts.response_secs = 2;
    config
}

/// Start a bridge on ephemeral loopback ports.
pub async fn start_bridge(config: BridgeConfig) -> TestBridge {
    let http_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let ws_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let http_addr = http_listener.local_addr().unwrap();
    let ws_addr = ws_listener.local_addr().unwrap();

    let server = BridgeServer::new(config);
    let registry = server.registry();
    let shutdown = Shutdown::new();
    let (config_tx, config_rx) = mpsc::unbounded_channel();

    let rx = shutdown.subscribe();
    let handle = tokio::spawn(async move {
        server.run(http_listener, ws_listener, config_rx, rx).await
    });

    TestBridge {
        http_addr,
        ws_addr,
        registry,
        shutdown,
        config_tx,
        handle,
    }
}
