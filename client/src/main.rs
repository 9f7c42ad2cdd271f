use std::env;
use std::error::Error;

use tracing_subscriber::EnvFilter;
use tungstenite::{connect, Message};
use url::Url;

mod print_snapshot_table;
use print_snapshot_table::print_snapshot_as_tables;

const DEFAULT_SERVER_URL: &str = "ws://127.0.0.1:5001/ws";

fn print_snapshots(url: &Url) -> Result<(), Box<dyn Error>> {
    let (mut socket, _) = connect(url.as_str())?;
    tracing::info!("Connected to {}", url);

    loop {
        let message = socket.read()?;

        match message {
            Message::Text(text) => match serde_json::from_str::<serde_json::Value>(&text) {
                Ok(snapshot) => print_snapshot_as_tables(&snapshot),
                Err(error) => tracing::warn!("Can't parse snapshot: {}", error),
            },
            Message::Close(_) => {
                tracing::info!("Server closed the connection");
                break;
            }
            _ => {}
        }
    }

    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let server_url = env::var("SERVER_URL").unwrap_or_else(|_| DEFAULT_SERVER_URL.to_string());
    let url = Url::parse(&server_url)?;

    print_snapshots(&url)?;

    Ok(())
}
