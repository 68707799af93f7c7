//! Outbound transform send gate.

use thicket_protocol::Transform;

/// Suppresses redundant transform sends.
///
/// The limiter remembers the last transform actually sent and lets a
/// send through only when any component differs. It is purely a gate:
/// the 50 ms tick in the sync loop is the sole send trigger, and the
/// limiter only decides whether a given tick emits — it never creates
/// additional send opportunities.
#[derive(Debug, Default)]
pub struct ClientRateLimiter {
    last_sent: Option<Transform>,
}

impl ClientRateLimiter {
    pub fn new() -> Self {
        Self { last_sent: None }
    }

    /// Returns `true` if `current` should be sent this tick, recording
    /// it as the last sent value.
    pub fn gate(&mut self, current: &Transform) -> bool {
        if self.last_sent.as_ref() == Some(current) {
            return false;
        }
        self.last_sent = Some(*current);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use thicket_protocol::Vec3;

    fn at(x: f32) -> Transform {
        Transform::new(Vec3::new(x, 0.0, 0.0), Vec3::ZERO)
    }

    #[test]
    fn test_first_transform_is_sent() {
        let mut limiter = ClientRateLimiter::new();
        assert!(limiter.gate(&at(0.0)));
    }

    #[test]
    fn test_identical_transform_is_suppressed() {
        // Two consecutive identical transforms produce at most one send.
        let mut limiter = ClientRateLimiter::new();
        assert!(limiter.gate(&at(1.0)));
        assert!(!limiter.gate(&at(1.0)));
        assert!(!limiter.gate(&at(1.0)));
    }

    #[test]
    fn test_any_component_change_passes() {
        let mut limiter = ClientRateLimiter::new();
        assert!(limiter.gate(&at(1.0)));

        let mut rotated = at(1.0);
        rotated.rotation.y = 0.5;
        assert!(limiter.gate(&rotated));
    }

    #[test]
    fn test_returning_to_previous_value_passes() {
        // Only the *last sent* value is compared, not a history.
        let mut limiter = ClientRateLimiter::new();
        assert!(limiter.gate(&at(1.0)));
        assert!(limiter.gate(&at(2.0)));
        assert!(limiter.gate(&at(1.0)));
    }
}
