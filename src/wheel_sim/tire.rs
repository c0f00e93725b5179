// ==============================================================================
// tire.rs — SLIP + FRICTION-CIRCLE TIRE FORCE (FORCE DOMAIN)
// ==============================================================================
// All vectors here are contact-plane 2D: x = lateral (right), y = longitudinal
// (forward).
//
// slip = velocity the tire has to cancel:
//   slip.x = -v_lat
//   slip.y = -(v_long - ω r)
//
// Tire force = clamp_mag(F_vel + F_grav, Load)
//   F_vel  = slip * (Load / |g|) / dt
//            force that would cancel the slip in one step for the mass the
//            wheel is carrying
//   F_grav = in-plane part of the force holding Load up against gravity
//            (keeps a parked car from sliding down a slope); its longitudinal
//            part is limited to what the brake can hold, |T_brake| / r
//
// The clamp is a friction circle of radius Load: longitudinal and lateral
// demand share one budget, so braking in a corner costs lateral grip.
// ==============================================================================

use nalgebra::{Vector2, Vector3};

use crate::wheel_sim::kinematics::ContactBasis;

/// Used when the contact normal is (nearly) perpendicular to gravity.
pub const WALL_SUPPORT_FORCE: f32 = 10_000.0;

/// Below this |g| the tire has no mass estimate and produces no force.
pub const MIN_GRAVITY: f32 = 1e-6;

#[inline]
fn usable_gravity(magnitude: f32) -> bool {
    magnitude.is_finite() && magnitude > MIN_GRAVITY
}

#[inline]
pub fn slip(local_velocity: &Vector2<f32>, angular_velocity: f32, radius: f32) -> Vector2<f32> {
    Vector2::new(-local_velocity.x, -(local_velocity.y - angular_velocity * radius))
}

/// In-plane gravity support force, longitudinal part clamped by the brake.
pub fn gravity_force(
    load: f32,
    normal: &Vector3<f32>,
    gravity: &Vector3<f32>,
    basis: &ContactBasis,
    brake_torque: f32,
    radius: f32,
) -> Vector2<f32> {
    if !usable_gravity(gravity.norm()) {
        return Vector2::zeros();
    }
    let up = -gravity.normalize();
    let cos = normal.dot(&up);
    let support = up * if cos > 1e-5 { load / cos } else { WALL_SUPPORT_FORCE };

    let max_brake_force = brake_torque.abs() / radius;
    Vector2::new(
        support.dot(&basis.right),
        support.dot(&basis.forward).clamp(-max_brake_force, max_brake_force),
    )
}

#[inline]
pub fn velocity_force(slip: &Vector2<f32>, load: f32, gravity_magnitude: f32, dt: f32) -> Vector2<f32> {
    if !usable_gravity(gravity_magnitude) {
        return Vector2::zeros();
    }
    slip * ((load / gravity_magnitude) / dt)
}

/// Scale `v` down so its length is at most `max_len`.
#[inline]
pub fn clamp_magnitude(v: Vector2<f32>, max_len: f32) -> Vector2<f32> {
    let len = v.norm();
    if len > max_len && len > 0.0 {
        v * (max_len / len)
    } else {
        v
    }
}

/// Contact-plane forces for one step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TireForces {
    pub velocity_force: Vector2<f32>,
    pub gravity_force: Vector2<f32>,
    pub tire_force: Vector2<f32>,
}

pub struct TireInputs<'a> {
    pub slip: Vector2<f32>,
    pub load: f32,
    pub normal: &'a Vector3<f32>,
    pub gravity: &'a Vector3<f32>,
    pub basis: &'a ContactBasis,
    pub brake_torque: f32,
    pub radius: f32,
    pub dt: f32,
}

pub fn solve_tire(inputs: &TireInputs<'_>) -> TireForces {
    let gravity_force = gravity_force(
        inputs.load,
        inputs.normal,
        inputs.gravity,
        inputs.basis,
        inputs.brake_torque,
        inputs.radius,
    );
    let velocity_force = velocity_force(&inputs.slip, inputs.load, inputs.gravity.norm(), inputs.dt);
    let tire_force = clamp_magnitude(velocity_force + gravity_force, inputs.load);

    TireForces { velocity_force, gravity_force, tire_force }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wheel_sim::kinematics::{contact_basis, wheel_frame};
    use approx::assert_relative_eq;
    use nalgebra::{vector, UnitQuaternion};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    static G: Vector3<f32> = Vector3::new(0.0, -9.81, 0.0);

    fn flat_basis() -> ContactBasis {
        contact_basis(&Vector3::y(), &wheel_frame(&UnitQuaternion::identity(), 0.0))
    }

    #[test]
    fn rolling_wheel_has_no_longitudinal_slip() {
        let s = slip(&Vector2::new(0.0, 10.0), 10.0 / 0.34, 0.34);
        assert_relative_eq!(s, Vector2::zeros(), epsilon = 1e-5);
    }

    #[test]
    fn locked_wheel_slips_backwards() {
        let s = slip(&Vector2::new(0.5, 10.0), 0.0, 0.34);
        assert_relative_eq!(s, Vector2::new(-0.5, -10.0));
    }

    #[test]
    fn flat_ground_has_no_gravity_component() {
        let f = gravity_force(4000.0, &Vector3::y(), &G, &flat_basis(), 0.0, 0.34);
        assert_relative_eq!(f, Vector2::zeros(), epsilon = 1e-3);
    }

    #[test]
    fn slope_hold_is_limited_by_brake() {
        let n = vector![0.0, 1.0, 0.2].normalize();
        let basis = contact_basis(&n, &wheel_frame(&UnitQuaternion::identity(), 0.0));

        let free = gravity_force(4000.0, &n, &G, &basis, 0.0, 0.34);
        assert_eq!(free.y, 0.0);

        let held = gravity_force(4000.0, &n, &G, &basis, 1.0e6, 0.34);
        assert!(held.y.abs() > 100.0);

        let limited = gravity_force(4000.0, &n, &G, &basis, 34.0, 0.34);
        assert_relative_eq!(limited.y.abs(), 100.0, epsilon = 1e-3);
    }

    #[test]
    fn vertical_wall_uses_fallback_support() {
        let n = vector![0.0, 0.0, -1.0];
        let basis = contact_basis(&n, &wheel_frame(&UnitQuaternion::identity(), 0.0));
        let f = gravity_force(1000.0, &n, &G, &basis, 1.0e9, 0.34);
        assert!(f.norm() > 0.0 && f.norm() <= WALL_SUPPORT_FORCE + 1e-2);
    }

    #[test]
    fn zero_gravity_gives_no_tire_force() {
        let basis = flat_basis();
        let zero = Vector3::zeros();
        let out = solve_tire(&TireInputs {
            slip: Vector2::new(-1.0, 3.0),
            load: 5000.0,
            normal: &Vector3::y(),
            gravity: &zero,
            basis: &basis,
            brake_torque: 100.0,
            radius: 0.34,
            dt: 0.02,
        });
        assert_eq!(out.tire_force, Vector2::zeros());
        assert_eq!(velocity_force(&Vector2::new(1.0, 1.0), 5000.0, f32::NAN, 0.02), Vector2::zeros());
    }

    #[test]
    fn clamp_magnitude_keeps_direction() {
        let v = clamp_magnitude(Vector2::new(3.0, 4.0), 2.5);
        assert_relative_eq!(v, Vector2::new(1.5, 2.0), epsilon = 1e-6);
        assert_eq!(clamp_magnitude(Vector2::new(0.3, 0.4), 2.0), Vector2::new(0.3, 0.4));
    }

    #[test]
    fn combined_demand_shares_the_circle() {
        let basis = flat_basis();
        let up = Vector3::y();
        let load = 4000.0;
        let inputs = |slip: Vector2<f32>| TireInputs {
            slip,
            load,
            normal: &up,
            gravity: &G,
            basis: &basis,
            brake_torque: 0.0,
            radius: 0.34,
            dt: 0.02,
        };

        let lateral_only = solve_tire(&inputs(Vector2::new(0.02, 0.0)));
        let braking_too = solve_tire(&inputs(Vector2::new(0.02, -5.0)));

        assert!(braking_too.tire_force.x.abs() < lateral_only.tire_force.x.abs());
        assert_relative_eq!(braking_too.tire_force.norm(), load, epsilon = 1e-1);
    }

    #[test]
    fn tire_force_never_exceeds_load() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..5_000 {
            let steer = rng.gen_range(-40.0..40.0);
            let n: Vector3<f32> = vector![rng.gen_range(-0.5..0.5), 1.0, rng.gen_range(-0.5..0.5)].normalize();
            let basis = contact_basis(&n, &wheel_frame(&UnitQuaternion::identity(), steer));
            let load = rng.gen_range(0.0..30_000.0);
            let out = solve_tire(&TireInputs {
                slip: Vector2::new(rng.gen_range(-50.0..50.0), rng.gen_range(-50.0..50.0)),
                load,
                normal: &n,
                gravity: &G,
                basis: &basis,
                brake_torque: rng.gen_range(0.0..4000.0),
                radius: 0.34,
                dt: rng.gen_range(0.001..0.05),
            });
            assert!(out.tire_force.norm() <= load * (1.0 + 1e-5) + 1e-3);
        }
    }
}
