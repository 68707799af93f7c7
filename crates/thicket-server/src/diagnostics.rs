//! Plain-HTTP diagnostics served on the game port.
//!
//! Two unauthenticated GETs, aimed at uptime checks and the dev
//! workflow of pointing a fresh client at a tunnel:
//!
//! - `GET /status` → `{"uptime_secs", "connections", "host"}`
//! - `GET /tunnel` → the externally registered tunnel URL, 404 if none

use std::sync::Arc;

use thicket_transport::PlainHttpRequest;

use crate::state::ServerState;

pub(crate) async fn respond(req: PlainHttpRequest, state: Arc<ServerState>) {
    let result = match (req.method(), req.path()) {
        ("GET", "/status") => {
            let registry = state.registry.lock().await;
            let body = serde_json::json!({
                "uptime_secs": state.started_at.elapsed().as_secs(),
                "connections": registry.len(),
                "host": registry.global_host(),
            });
            drop(registry);
            req.respond(200, "application/json", body.to_string().as_bytes())
                .await
        }
        ("GET", "/tunnel") => match &state.tunnel_url {
            Some(url) => req.respond(200, "text/plain", url.as_bytes()).await,
            None => req.respond(404, "text/plain", b"no tunnel registered").await,
        },
        _ => req.respond(404, "text/plain", b"not found").await,
    };

    if let Err(e) = result {
        tracing::debug!(error = %e, "diagnostics response failed");
    }
}
