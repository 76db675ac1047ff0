//! HTTP and WebSocket server setup.
//!
//! # Responsibilities
//! - Build the one-shot router (HTTP port) and the session router (WebSocket port)
//! - Wire up middleware (request ID, tracing, timeout, body limit, CORS)
//! - Serve both listeners until shutdown, then drain sessions
//! - Apply configuration updates from the watcher

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::DefaultBodyLimit,
    http::{Method, Request},
    middleware,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::admin;
use crate::config::BridgeConfig;
use crate::http::request::{request_id, MakeBridgeRequestId};
use crate::http::response::json_rejection;
use crate::http::{api, websocket};
use crate::lifecycle::Shutdown;
use crate::net::BackendTarget;
use crate::relay::SessionRegistry;

const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);
const DRAIN_POLL: Duration = Duration::from_millis(25);

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Live configuration; swapped on reload.
    pub config: Arc<ArcSwap<BridgeConfig>>,
    pub registry: SessionRegistry,
    /// Internal shutdown fan-out that every session subscribes to.
    pub shutdown: Shutdown,
}

impl AppState {
    pub fn new(config: BridgeConfig) -> Self {
        Self {
            config: Arc::new(ArcSwap::from_pointee(config)),
            registry: SessionRegistry::new(),
            shutdown: Shutdown::new(),
        }
    }
}

/// The bridge: one-shot HTTP surface plus WebSocket session surface.
pub struct BridgeServer {
    state: AppState,
}

impl BridgeServer {
    pub fn new(config: BridgeConfig) -> Self {
        Self {
            state: AppState::new(config),
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Handle on the session registry, shared with the running server.
    pub fn registry(&self) -> SessionRegistry {
        self.state.registry.clone()
    }

    /// Router for the HTTP port. Middleware settings are read once here.
    #[allow(deprecated)]
    pub fn http_router(&self) -> Router {
        let config = self.state.config.load_full();

        let mut router = Router::new()
            .route("/api/send", post(api::send_handler))
            .route("/health", get(api::health))
            .merge(admin::setup_admin_router(self.state.clone()))
            .with_state(self.state.clone())
            .layer(DefaultBodyLimit::disable())
            .layer(RequestBodyLimitLayer::new(config.limits.max_body_bytes))
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeBridgeRequestId))
                    .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                        tracing::info_span!(
                            "http",
                            method = %request.method(),
                            uri = %request.uri(),
                            request_id = %request_id(request.headers()),
                        )
                    }))
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs))),
            )
            .layer(middleware::map_response(json_rejection));

        if config.http.cors_permissive {
            router = router.layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                    .allow_headers(Any),
            );
        }
        router
    }

    /// Router for the WebSocket port.
    pub fn ws_router(&self) -> Router {
        Router::new()
            .route("/", get(websocket::ws_handler))
            .with_state(self.state.clone())
            .layer(TraceLayer::new_for_http())
    }

    /// Serve both listeners until `shutdown` fires (or its sender drops).
    ///
    /// On shutdown the listeners stop accepting, every session is told to
    /// close, and the registry is drained for up to five seconds.
    pub async fn run(
        self,
        http_listener: TcpListener,
        ws_listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<BridgeConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let http_addr = http_listener.local_addr()?;
        let ws_addr = ws_listener.local_addr()?;
        let backend = BackendTarget::from(&self.state.config.load().backend);
        tracing::info!(http = %http_addr, ws = %ws_addr, backend = %backend, "Bridge server starting");

        let live_config = self.state.config.clone();
        let reload = tokio::spawn(async move {
            while let Some(config) = config_updates.recv().await {
                tracing::info!(
                    backend = %BackendTarget::from(&config.backend),
                    "Applying configuration update"
                );
                live_config.store(Arc::new(config));
            }
        });

        let fan_out = self.state.shutdown.clone();
        let relay_signal = tokio::spawn(async move {
            let _ = shutdown.recv().await;
            fan_out.trigger();
        });

        let http_app = self
            .http_router()
            .into_make_service_with_connect_info::<SocketAddr>();
        let ws_app = self
            .ws_router()
            .into_make_service_with_connect_info::<SocketAddr>();

        let http_stop = self.state.shutdown.subscribe();
        let ws_stop = self.state.shutdown.subscribe();
        let http = async move {
            axum::serve(http_listener, http_app)
                .with_graceful_shutdown(stopped(http_stop))
                .await
        };
        let ws = async move {
            axum::serve(ws_listener, ws_app)
                .with_graceful_shutdown(stopped(ws_stop))
                .await
        };

        let (http_result, ws_result) = tokio::join!(http, ws);
        reload.abort();
        relay_signal.abort();

        drain(&self.state.registry, DRAIN_TIMEOUT).await;
        tracing::info!("Bridge server stopped");

        http_result?;
        ws_result
    }
}

async fn stopped(mut rx: broadcast::Receiver<()>) {
    let _ = rx.recv().await;
}

/// Wait for registered sessions to finish closing.
async fn drain(registry: &SessionRegistry, timeout: Duration) {
    let deadline = Instant::now() + timeout;
    while !registry.is_empty() {
        if Instant::now() >= deadline {
            tracing::warn!(remaining = registry.len(), "Drain deadline reached with sessions still open");
            return;
        }
        tokio::time::sleep(DRAIN_POLL).await;
    }
}
