use clap::{Parser, Subcommand};
use futures_util::{SinkExt, StreamExt};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;
use std::time::Duration;
use tokio_tungstenite::tungstenite::Message;

#[derive(Parser)]
#[command(name = "bridge-cli")]
#[command(about = "Client and management CLI for game-bridge", long_about = None)]
struct Cli {
    /// Base URL of the HTTP port.
    #[arg(long, default_value = "http://localhost:3001")]
    http_url: String,

    /// URL of the WebSocket port.
    #[arg(long, default_value = "ws://localhost:3002")]
    ws_url: String,

    /// Admin API key.
    #[arg(short, long, default_value = "")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send one message through /api/send
    Send { message: String },
    /// Open a session, send each message and print replies
    Session {
        messages: Vec<String>,
        /// Seconds to wait for further replies after the last message
        #[arg(long, default_value_t = 2)]
        linger: u64,
    },
    /// Check bridge status
    Status,
    /// List active sessions
    Sessions,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Send { message } => {
            let res = client
                .post(format!("{}/api/send", cli.http_url))
                .json(&serde_json::json!({ "message": message }))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Session { messages, linger } => {
            run_session(&cli.ws_url, messages, Duration::from_secs(linger)).await?;
        }
        Commands::Status => {
            let res = client
                .get(format!("{}/admin/status", cli.http_url))
                .headers(admin_headers(&cli.key)?)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Sessions => {
            let res = client
                .get(format!("{}/admin/sessions", cli.http_url))
                .headers(admin_headers(&cli.key)?)
                .send()
                .await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

fn admin_headers(key: &str) -> Result<HeaderMap, Box<dyn std::error::Error>> {
    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {}", key))?);
    Ok(headers)
}

async fn run_session(
    url: &str,
    messages: Vec<String>,
    linger: Duration,
) -> Result<(), Box<dyn std::error::Error>> {
    let (stream, _) = tokio_tungstenite::connect_async(url).await?;
    let (mut tx, mut rx) = stream.split();

    for message in messages {
        tx.send(Message::Text(message.into())).await?;
    }

    loop {
        match tokio::time::timeout(linger, rx.next()).await {
            Ok(Some(Ok(Message::Text(text)))) => print_json(text.as_str())?,
            Ok(Some(Ok(Message::Close(frame)))) => {
                if let Some(frame) = frame {
                    eprintln!("Closed: {} {}", u16::from(frame.code), frame.reason);
                }
                break;
            }
            Ok(Some(Ok(_))) => {}
            Ok(Some(Err(e))) => return Err(e.into()),
            Ok(None) | Err(_) => break,
        }
    }

    let _ = tx.close().await;
    Ok(())
}

fn print_json(text: &str) -> Result<(), Box<dyn std::error::Error>> {
    match serde_json::from_str::<Value>(text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", text),
    }
    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    if !status.is_success() {
        eprintln!("Error: bridge returned status {}", status);
    }
    print_json(&text)
}
