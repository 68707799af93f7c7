//! `Server` builder and accept loop.
//!
//! This is the entry point for running a Thicket session server. It
//! ties the layers together: transport → protocol → registry/lobby
//! stores → per-connection handlers.

use std::sync::Arc;

use thicket_transport::{Accepted, WebSocketTransport};

use crate::ThicketError;
use crate::config::ServerConfig;
use crate::handler::handle_connection;
use crate::state::ServerState;

/// Builder for configuring and starting a Thicket server.
///
/// # Example
///
/// ```rust,no_run
/// use thicket_server::{ServerBuilder, ServerConfig};
///
/// # async fn run() -> Result<(), thicket_server::ThicketError> {
/// let server = ServerBuilder::new()
///     .config(ServerConfig::from_env())
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct ServerBuilder {
    bind_addr: String,
    tunnel_url: Option<String>,
}

impl ServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: ServerConfig::default().bind_addr(),
            tunnel_url: None,
        }
    }

    /// Applies a full [`ServerConfig`] (port and tunnel URL).
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.bind_addr = config.bind_addr();
        self.tunnel_url = config.tunnel_url;
        self
    }

    /// Sets the exact address to bind to, overriding the config port.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Registers the external tunnel URL served by `GET /tunnel`.
    pub fn tunnel_url(mut self, url: &str) -> Self {
        self.tunnel_url = Some(url.to_string());
        self
    }

    /// Binds the listener and builds the server.
    pub async fn build(self) -> Result<Server, ThicketError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;
        let state = Arc::new(ServerState::new(self.tunnel_url));
        Ok(Server { transport, state })
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running Thicket session server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct Server {
    transport: WebSocketTransport,
    state: Arc<ServerState>,
}

impl Server {
    /// Creates a new builder.
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the accept loop.
    ///
    /// WebSocket upgrades get a connection handler task each;
    /// plain-HTTP requests get the diagnostics responder. Runs until
    /// the process is terminated.
    pub async fn run(mut self) -> Result<(), ThicketError> {
        tracing::info!("thicket server running");

        loop {
            match self.transport.accept_routed().await {
                Ok(Accepted::Socket(conn)) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Ok(Accepted::Http(req)) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(crate::diagnostics::respond(req, state));
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
