use std::net::SocketAddr;

use server::AppState;
use tracing_subscriber::{EnvFilter, prelude::*};

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8787;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let filter_string = format!(
        "warn,server={level},store={level},events={level},assignment={level},client={level}",
        level = log_level
    );
    let env_filter = EnvFilter::try_new(filter_string).expect("Failed to create tracing filter");
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_filter(env_filter))
        .init();

    let host = std::env::var("TD_HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string());
    let port = std::env::var("TD_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(DEFAULT_PORT);
    let addr: SocketAddr = format!("{host}:{port}").parse()?;

    let state = AppState::from_env();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("task server listening on {addr}");
    axum::serve(listener, server::router(state)).await?;

    Ok(())
}
