//! Error types for the client layer.

/// A remote session's full representation failed to load.
///
/// The proxy stays on its placeholder when this happens; there is no
/// retry policy.
#[derive(Debug, Clone, thiserror::Error)]
#[error("avatar load failed: {0}")]
pub struct AvatarLoadError(pub String);
