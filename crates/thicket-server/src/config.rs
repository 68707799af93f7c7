//! Server configuration: a listen port from the environment with a
//! fixed default, and the optional externally registered tunnel URL.

/// Default listen port when [`PORT_ENV_VAR`] is unset or unparsable.
pub const DEFAULT_PORT: u16 = 3000;

/// Environment variable naming the listen port.
pub const PORT_ENV_VAR: &str = "THICKET_PORT";

/// Environment variable naming the external tunnel URL served by
/// `GET /tunnel`.
pub const TUNNEL_ENV_VAR: &str = "THICKET_TUNNEL_URL";

/// Runtime configuration for a Thicket server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// TCP port to listen on (all interfaces).
    pub port: u16,
    /// Externally registered tunnel URL, if any. Served verbatim by the
    /// `/tunnel` diagnostics endpoint.
    pub tunnel_url: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            tunnel_url: None,
        }
    }
}

impl ServerConfig {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through an injected lookup, so tests don't
    /// have to mutate the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let port = lookup(PORT_ENV_VAR)
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);
        let tunnel_url = lookup(TUNNEL_ENV_VAR).filter(|url| !url.trim().is_empty());
        Self { port, tunnel_url }
    }

    /// The bind address for the listener.
    pub fn bind_addr(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}
