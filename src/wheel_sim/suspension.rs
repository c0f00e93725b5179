// ==============================================================================
// suspension.rs — RAYCAST SUSPENSION LENGTH + SPRING/DAMPER LOAD
// ------------------------------------------------------------------------------
// Suspension length is measured from the wheel mount to the wheel center along
// the wheel's down axis:
//   grounded   : length = hit_distance - radius
//   airborne   : length = rest_length
//
// Load (normal force through the contact):
//   Load = max(0, (rest - length) * k + ((prev - length) / dt) * c)
//
// The spring can only push. Damping uses the finite difference of length, so a
// wheel dropping off a kerb sees negative damper force that is clipped at 0.
// ==============================================================================

use crate::wheel_sim::types::{ContactSample, WheelConfig};

/// Length the suspension takes for this contact, clamped to `[0, rest]`.
#[inline]
pub fn suspension_length(config: &WheelConfig, contact: &ContactSample) -> f32 {
    if contact.grounded {
        (contact.distance - config.radius).clamp(0.0, config.rest_length)
    } else {
        config.rest_length
    }
}

/// Spring + damper force. Caller guarantees `dt > 0`.
#[inline]
pub fn compute_suspension_force(config: &WheelConfig, previous_length: f32, length: f32, dt: f32) -> f32 {
    let spring = (config.rest_length - length) * config.spring_rate;
    let damper = ((previous_length - length) / dt) * config.damper_rate;
    (spring + damper).max(0.0)
}
