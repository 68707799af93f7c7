//! Runnable Thicket session server.
//!
//! Configuration comes from the environment:
//! - `THICKET_PORT` — listen port (default 3000)
//! - `THICKET_TUNNEL_URL` — external tunnel URL served by `GET /tunnel`
//! - `RUST_LOG` — tracing filter (e.g. `info,thicket_server=debug`)

use thicket_server::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), ThicketError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env();
    tracing::info!(port = config.port, "starting tag server");

    let server = ServerBuilder::new().config(config).build().await?;
    server.run().await
}
