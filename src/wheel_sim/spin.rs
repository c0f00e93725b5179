// ==============================================================================
// spin.rs — WHEEL ANGULAR VELOCITY INTEGRATION (EXPLICIT)
// ------------------------------------------------------------------------------
// Order per step:
// 1) motor:    ω += T_motor / I * dt
// 2) friction: the ground pushes back on the wheel with the longitudinal force
//              it produced last step. The reaction torque is
//                τ_f = -clamp(F_vel.y, -|F_tire.y|, |F_tire.y|) * r
//              and the resulting Δω is limited to |slip.y| / r, the change
//              that would bring the wheel to rolling without slip.
// 3) brake:    torque opposes the current spin, Δω clamped to [-|ω|, |ω|] so a
//              brake can stop the wheel but never spin it backwards.
//
// The friction term lags one step behind the tire force. With small inertia or
// a large dt it can overshoot and ring; keep dt at the fixed physics rate.
// ==============================================================================

use nalgebra::Vector2;

use crate::wheel_sim::types::{WheelActuation, WheelConfig};

/// Forces carried over from the previous step (contact-plane coordinates).
#[derive(Debug, Clone, Copy)]
pub struct FrictionReaction {
    pub velocity_force: Vector2<f32>,
    pub tire_force: Vector2<f32>,
}

pub fn integrate_spin(
    config: &WheelConfig,
    angular_velocity: f32,
    actuation: &WheelActuation,
    slip: &Vector2<f32>,
    reaction: Option<&FrictionReaction>,
    dt: f32,
) -> f32 {
    let inertia = config.inertia;
    let mut w = angular_velocity + actuation.motor_torque / inertia * dt;

    if let Some(reaction) = reaction {
        let abs_angular_slip = slip.y.abs() / config.radius;
        let cap = reaction.tire_force.y.abs();
        let friction_torque = -reaction.velocity_force.y.clamp(-cap, cap) * config.radius;
        w += (friction_torque / inertia * dt).clamp(-abs_angular_slip, abs_angular_slip);
    }

    w + brake_delta(w, actuation.brake_torque, inertia, dt)
}

/// Spin change from a brake torque; never crosses zero.
#[inline]
pub fn brake_delta(angular_velocity: f32, brake_torque: f32, inertia: f32, dt: f32) -> f32 {
    let abs_w = angular_velocity.abs();
    let signed = -brake_torque.abs() * angular_velocity.signum();
    (signed / inertia * dt).clamp(-abs_w, abs_w)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn actuation(motor: f32, brake: f32) -> WheelActuation {
        WheelActuation { motor_torque: motor, brake_torque: brake, steer_angle_deg: 0.0 }
    }

    #[test]
    fn motor_accelerates_free_wheel() {
        let cfg = WheelConfig::default();
        let w = integrate_spin(&cfg, 0.0, &actuation(100.0, 0.0), &Vector2::zeros(), None, 0.02);
        assert_relative_eq!(w, 100.0 / cfg.inertia * 0.02);
    }

    #[test]
    fn brake_stops_but_never_reverses() {
        let cfg = WheelConfig::default();
        let w = integrate_spin(&cfg, 3.0, &actuation(0.0, 1.0e6), &Vector2::zeros(), None, 0.02);
        assert_eq!(w, 0.0);
        let w = integrate_spin(&cfg, -3.0, &actuation(0.0, -1.0e6), &Vector2::zeros(), None, 0.02);
        assert_eq!(w, 0.0);
    }

    #[test]
    fn brake_on_still_wheel_does_nothing() {
        assert_eq!(brake_delta(0.0, 5000.0, 1.0, 0.02), 0.0);
    }

    #[test]
    fn friction_reaction_is_limited_by_slip() {
        let cfg = WheelConfig::default();
        let reaction = FrictionReaction {
            velocity_force: Vector2::new(0.0, 1.0e6),
            tire_force: Vector2::new(0.0, 1.0e6),
        };
        let slip = Vector2::new(0.0, 0.68); // 2 rad/s worth at r = 0.34
        let w = integrate_spin(&cfg, 10.0, &actuation(0.0, 0.0), &slip, Some(&reaction), 0.02);
        assert_relative_eq!(w, 8.0, epsilon = 1e-4);
    }

    #[test]
    fn friction_reaction_is_capped_by_tire_force() {
        let cfg = WheelConfig::default();
        let reaction = FrictionReaction {
            velocity_force: Vector2::new(0.0, -500.0),
            tire_force: Vector2::new(0.0, 100.0),
        };
        let w = integrate_spin(&cfg, 0.0, &actuation(0.0, 0.0), &Vector2::new(0.0, 100.0), Some(&reaction), 0.02);
        assert_relative_eq!(w, 100.0 * cfg.radius / cfg.inertia * 0.02, epsilon = 1e-5);
    }
}
