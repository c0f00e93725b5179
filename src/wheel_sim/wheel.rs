// ==============================================================================
// wheel.rs — PER-WHEEL SIMULATOR
// ------------------------------------------------------------------------------
// One instance per wheel. Each fixed step:
//   ground_ray()  -> host casts it -> ContactSample
//   step()        -> suspension force + tire force at the contact point
//
// step():
// 1) wheel frame from chassis rotation + steer angle
// 2) suspension length and Load (suspension.rs)
// 3) contact-plane basis from the ground normal (kinematics.rs)
// 4) slip from the chassis point velocity at the contact (tire.rs)
// 5) spin: motor, friction reaction, brake (spin.rs)
// 6) tire force, friction circle clamp, back to world space (tire.rs)
// 7) visual spin angle
//
// Airborne: Load 0, no tire force, spin still driven and braked.
// dt <= MIN_DT: zero forces, state untouched.
// ==============================================================================

use nalgebra::{Isometry3, Point3, Vector2, Vector3};
use tracing::trace;

use crate::error::ConfigError;
use crate::wheel_sim::kinematics::{contact_basis, local_velocity, to_world, wheel_frame};
use crate::wheel_sim::spin::{integrate_spin, FrictionReaction};
use crate::wheel_sim::suspension::{compute_suspension_force, suspension_length};
use crate::wheel_sim::tire::{slip, solve_tire, TireInputs};
use crate::wheel_sim::types::{
    AppliedForce, ContactSample, GroundRay, WheelActuation, WheelConfig, WheelId, WheelState,
    WheelStepOutput, MIN_DT,
};

pub const DEFAULT_GRAVITY: Vector3<f32> = Vector3::new(0.0, -9.81, 0.0);

#[derive(Debug, Clone)]
pub struct WheelSimulator {
    id: WheelId,
    config: WheelConfig,
    mount: Point3<f32>, // chassis local
    gravity: Vector3<f32>,
    state: WheelState,
    steer_angle_deg: f32,
    grounded: bool,
}

impl WheelSimulator {
    pub fn new(id: WheelId, config: WheelConfig, mount: Point3<f32>) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            id,
            config,
            mount,
            gravity: DEFAULT_GRAVITY,
            state: WheelState::at_rest(&config),
            steer_angle_deg: 0.0,
            grounded: false,
        })
    }

    pub fn with_gravity(mut self, gravity: Vector3<f32>) -> Self {
        self.gravity = gravity;
        self
    }

    /// Back to rest length, no spin.
    pub fn reset(&mut self) {
        self.state = WheelState::at_rest(&self.config);
        self.steer_angle_deg = 0.0;
        self.grounded = false;
    }

    /// Ray from the wheel mount down the (steered) wheel's up axis.
    pub fn ground_ray(&self, chassis_pose: &Isometry3<f32>, steer_angle_deg: f32) -> GroundRay {
        let frame = wheel_frame(&chassis_pose.rotation, steer_angle_deg);
        GroundRay {
            origin: chassis_pose * self.mount,
            direction: -frame.up,
            max_distance: self.config.rest_length + self.config.radius,
            mask: self.config.ground_mask,
        }
    }

    pub fn step<F>(
        &mut self,
        dt: f32,
        actuation: &WheelActuation,
        chassis_pose: &Isometry3<f32>,
        point_velocity: F,
        contact: &ContactSample,
    ) -> WheelStepOutput
    where
        F: Fn(&Point3<f32>) -> Vector3<f32>,
    {
        let origin = chassis_pose * self.mount;

        if !(dt > MIN_DT) {
            trace!(wheel = %self.id, dt, "degenerate dt, skipping wheel step");
            return WheelStepOutput {
                suspension: AppliedForce::zero_at(origin),
                tire: AppliedForce::zero_at(origin),
                state: self.state,
            };
        }

        let cfg = self.config;
        let frame = wheel_frame(&chassis_pose.rotation, actuation.steer_angle_deg);
        self.steer_angle_deg = actuation.steer_angle_deg;
        self.grounded = contact.grounded;

        // --- suspension ---
        let previous = self.state.suspension_length;
        let length = suspension_length(&cfg, contact);
        self.state.previous_suspension_length = previous;
        self.state.suspension_length = length;

        let (suspension, tire) = if contact.grounded {
            let load = compute_suspension_force(&cfg, previous, length, dt);
            let point = origin - frame.up * contact.distance;
            let normal = contact.normal;

            // --- slip in the contact plane ---
            let basis = contact_basis(&normal, &frame);
            let v = point_velocity(&point);
            let slip = slip(&local_velocity(&v, &basis), self.state.angular_velocity, cfg.radius);

            // --- spin ---
            let reaction = FrictionReaction {
                velocity_force: self.state.velocity_force,
                tire_force: self.state.tire_force,
            };
            self.state.angular_velocity = integrate_spin(
                &cfg,
                self.state.angular_velocity,
                actuation,
                &slip,
                Some(&reaction),
                dt,
            );

            // --- tire ---
            let forces = solve_tire(&TireInputs {
                slip,
                load,
                normal: &normal,
                gravity: &self.gravity,
                basis: &basis,
                brake_torque: actuation.brake_torque,
                radius: cfg.radius,
                dt,
            });
            self.state.velocity_force = forces.velocity_force;
            self.state.tire_force = forces.tire_force;
            self.state.load = load;

            (
                AppliedForce { force: normal * load, point },
                AppliedForce { force: to_world(&forces.tire_force, &basis), point },
            )
        } else {
            self.state.angular_velocity =
                integrate_spin(&cfg, self.state.angular_velocity, actuation, &Vector2::zeros(), None, dt);
            self.state.velocity_force = Vector2::zeros();
            self.state.tire_force = Vector2::zeros();
            self.state.load = 0.0;

            let point = origin - frame.up * (length + cfg.radius);
            (AppliedForce::zero_at(point), AppliedForce::zero_at(point))
        };

        // --- visual ---
        self.state.visual_spin_angle =
            wrap_degrees(self.state.visual_spin_angle + self.state.angular_velocity.to_degrees() * dt);

        WheelStepOutput { suspension, tire, state: self.state }
    }

    pub fn id(&self) -> WheelId {
        self.id
    }

    pub fn config(&self) -> &WheelConfig {
        &self.config
    }

    pub fn mount(&self) -> &Point3<f32> {
        &self.mount
    }

    pub fn state(&self) -> &WheelState {
        &self.state
    }

    pub fn is_grounded(&self) -> bool {
        self.grounded
    }

    pub fn load(&self) -> f32 {
        self.state.load
    }

    pub fn angular_velocity(&self) -> f32 {
        self.state.angular_velocity
    }

    pub fn visual_spin_angle(&self) -> f32 {
        self.state.visual_spin_angle
    }

    /// Wheel center offset from the mount along wheel-local up.
    pub fn suspension_offset(&self) -> f32 {
        -self.state.suspension_length
    }

    pub fn steer_angle_deg(&self) -> f32 {
        self.steer_angle_deg
    }
}

/// Wrap into [0, 360). `rem_euclid` can round up to exactly 360.
#[inline]
fn wrap_degrees(deg: f32) -> f32 {
    let wrapped = deg.rem_euclid(360.0);
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}
