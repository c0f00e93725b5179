//! Core shared types for `wheel_sim` (engine-agnostic).
// wheel_sim/types.rs
use std::fmt;

use nalgebra::{Point3, Vector2, Vector3};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Below this step length the wheel produces no force and keeps its state.
pub const MIN_DT: f32 = 1e-6;

/// Collision layer mask matching every layer.
pub const ALL_LAYERS: u32 = u32::MAX;

// ============================================
// Wheel identification
// ============================================

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum WheelId { FL, FR, RL, RR }

impl WheelId {
    pub const ALL: [WheelId; 4] = [WheelId::FL, WheelId::FR, WheelId::RL, WheelId::RR];

    pub fn as_str(&self) -> &'static str {
        match self {
            WheelId::FL => "FL",
            WheelId::FR => "FR",
            WheelId::RL => "RL",
            WheelId::RR => "RR",
        }
    }

    /// Slot in `[FL, FR, RL, RR]` ordered arrays.
    pub fn index(&self) -> usize {
        match self {
            WheelId::FL => 0,
            WheelId::FR => 1,
            WheelId::RL => 2,
            WheelId::RR => 3,
        }
    }

    pub fn is_front(&self) -> bool {
        matches!(self, WheelId::FL | WheelId::FR)
    }

    pub fn is_rear(&self) -> bool {
        matches!(self, WheelId::RL | WheelId::RR)
    }
}

impl fmt::Display for WheelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================
// ----- configs ------------------------------
// ============================================

/// Immutable per-wheel parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WheelConfig {
    pub radius: f32,       // m
    pub inertia: f32,      // kg·m²
    pub rest_length: f32,  // m, suspension fully extended
    pub spring_rate: f32,  // N/m
    pub damper_rate: f32,  // N·s/m
    pub ground_mask: u32,  // collision layers the ray may hit
}

impl Default for WheelConfig {
    fn default() -> Self {
        Self {
            radius: 0.34,
            inertia: 1.156,
            rest_length: 0.5,
            spring_rate: 50_000.0,
            damper_rate: 2_500.0,
            ground_mask: ALL_LAYERS,
        }
    }
}

impl WheelConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("wheel.radius", self.radius)?;
        positive("wheel.inertia", self.inertia)?;
        positive("wheel.rest_length", self.rest_length)?;
        non_negative("wheel.spring_rate", self.spring_rate)?;
        non_negative("wheel.damper_rate", self.damper_rate)?;
        Ok(())
    }
}

pub(crate) fn positive(field: &str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            field: field.to_string(),
            message: format!("{value} must be finite and > 0"),
        })
    }
}

pub(crate) fn valid_gravity(field: &str, gravity: &Vector3<f32>) -> Result<(), ConfigError> {
    positive(field, gravity.norm()).map_err(|_| ConfigError::InvalidValue {
        field: field.to_string(),
        message: format!("{:?} must be finite and non-zero", gravity.as_slice()),
    })
}

pub(crate) fn non_negative(field: &str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            field: field.to_string(),
            message: format!("{value} must be finite and >= 0"),
        })
    }
}

// ============================================
// ----- per-wheel persistent state -----------
// ============================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelState {
    pub suspension_length: f32,
    pub previous_suspension_length: f32,
    pub angular_velocity: f32,   // rad/s
    pub visual_spin_angle: f32,  // degrees, [0, 360)
    pub load: f32,               // N, last computed suspension force

    // contact-plane (x = lateral, y = longitudinal) forces from the last step,
    // read back by the spin integrator's friction reaction
    pub velocity_force: Vector2<f32>,
    pub tire_force: Vector2<f32>,
}

impl WheelState {
    pub fn at_rest(config: &WheelConfig) -> Self {
        Self {
            suspension_length: config.rest_length,
            previous_suspension_length: config.rest_length,
            angular_velocity: 0.0,
            visual_spin_angle: 0.0,
            load: 0.0,
            velocity_force: Vector2::zeros(),
            tire_force: Vector2::zeros(),
        }
    }
}

// ============================================
// ----- per-step inputs ----------------------
// ============================================

/// Per-wheel share of the drivetrain output for one step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct WheelActuation {
    pub motor_torque: f32,    // N·m
    pub brake_torque: f32,    // N·m
    pub steer_angle_deg: f32,
}

/// Ray the host casts for a wheel before stepping it.
#[derive(Debug, Clone, Copy)]
pub struct GroundRay {
    pub origin: Point3<f32>,
    pub direction: Vector3<f32>,
    pub max_distance: f32,
    pub mask: u32,
}

/// Result of the ground query for one wheel, one step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactSample {
    pub grounded: bool,
    pub distance: f32,
    pub normal: Vector3<f32>,
}

impl ContactSample {
    pub fn airborne() -> Self {
        Self { grounded: false, distance: 0.0, normal: Vector3::zeros() }
    }

    pub fn hit(distance: f32, normal: Vector3<f32>) -> Self {
        Self { grounded: true, distance, normal }
    }
}

// ============================================
// ----- per-step outputs ---------------------
// ============================================

/// A world-space force and the world-space point it acts at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AppliedForce {
    pub force: Vector3<f32>,
    pub point: Point3<f32>,
}

impl AppliedForce {
    pub fn zero_at(point: Point3<f32>) -> Self {
        Self { force: Vector3::zeros(), point }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelStepOutput {
    pub suspension: AppliedForce,
    pub tire: AppliedForce,
    pub state: WheelState,
}
