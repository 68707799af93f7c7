//! Local attack resolution.
//!
//! When an `AttackLaunched` arrives, each client independently decides
//! whether the swing hit its *own* avatar, using its own last-known
//! copy of the attacker's transform. Observers holding different
//! snapshots may disagree on the outcome; that divergence is accepted
//! (the server holds no physics truth to arbitrate with).

use thicket_protocol::Transform;

/// Tuning for the hit test.
#[derive(Debug, Clone, Copy)]
pub struct AttackParams {
    /// Maximum reach of a swing, in world units.
    pub range: f32,
    /// Cosine of the half-angle of the attack cone. A target is "in
    /// front" when the attacker's forward vector dotted with the
    /// direction to the target is at least this value.
    pub facing_cos: f32,
}

impl Default for AttackParams {
    fn default() -> Self {
        Self {
            range: 2.5,
            facing_cos: 0.5, // 60° half-angle
        }
    }
}

/// Decides whether an attack from `attacker` hits the avatar at
/// `local`. Range test first, then the facing cone, both on the
/// horizontal plane (a swing doesn't care about height differences
/// within reach).
pub fn resolve_attack(attacker: &Transform, local: &Transform, params: &AttackParams) -> bool {
    let dx = local.position.x - attacker.position.x;
    let dz = local.position.z - attacker.position.z;
    let dist = (dx * dx + dz * dz).sqrt();

    if dist > params.range {
        return false;
    }
    if dist < f32::EPSILON {
        return true; // point blank
    }

    // Forward vector from the attacker's yaw.
    let yaw = attacker.rotation.y;
    let (fx, fz) = (yaw.sin(), yaw.cos());
    let dot = (fx * dx + fz * dz) / dist;
    dot >= params.facing_cos
}
