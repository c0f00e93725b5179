// ==============================================================================
// drivetrain.rs — FORWARD / NEUTRAL / REVERSE DRIVETRAIN
// ------------------------------------------------------------------------------
// Maps pedals to aggregate motor/brake torque and the steering wheel to a
// centerline steer angle.
//
//   Neutral --brake edge--> Reverse     Neutral --throttle > 0--> Forward
//   Forward --|v| < 0.1 && throttle == 0--> Neutral
//   Reverse --|v| < 0.1 && brake == 0-----> Neutral
//
// In Reverse the pedals swap roles: brake drives backwards, throttle brakes.
// Reverse is only entered on a fresh brake press, so holding the brake to stop
// does not roll the car backwards once it is stationary.
//
// Torques are evaluated for the direction at the start of the step; a
// transition shows up in the torques one step later.
// ==============================================================================

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;
use crate::input::{InputSampler, InputSource, VehicleInputState};
use crate::wheel_sim::curve::TorqueCurve;
use crate::wheel_sim::types::{non_negative, positive};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DriveDirection {
    Reverse,
    #[default]
    Neutral,
    Forward,
}

impl DriveDirection {
    /// Anything other than -1 / 0 / 1 decodes to `Neutral`.
    pub fn from_raw(raw: i32) -> Self {
        match raw {
            -1 => DriveDirection::Reverse,
            1 => DriveDirection::Forward,
            _ => DriveDirection::Neutral,
        }
    }

    pub fn as_raw(&self) -> i32 {
        match self {
            DriveDirection::Reverse => -1,
            DriveDirection::Neutral => 0,
            DriveDirection::Forward => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DrivetrainState {
    pub direction: DriveDirection,
    pub motor_torque: f32,     // N·m, whole vehicle
    pub brake_torque: f32,     // N·m, whole vehicle
    pub steer_angle_deg: f32,  // centerline angle
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrivetrainConfig {
    pub motor_torque_curve: TorqueCurve,
    pub reverse_torque_curve: TorqueCurve,
    pub max_brake_torque: f32,       // N·m
    pub max_handbrake_torque: f32,   // N·m per rear wheel
    pub max_steer_angle: f32,        // degrees
    pub stationary_speed: f32,       // km/h
}

impl Default for DrivetrainConfig {
    fn default() -> Self {
        Self {
            motor_torque_curve: TorqueCurve::new(vec![
                (0.0, 1600.0),
                (60.0, 1400.0),
                (150.0, 900.0),
                (220.0, 0.0),
            ]),
            reverse_torque_curve: TorqueCurve::new(vec![(0.0, 1000.0), (30.0, 600.0), (50.0, 0.0)]),
            max_brake_torque: 8000.0,
            max_handbrake_torque: 4000.0,
            max_steer_angle: 40.0,
            stationary_speed: 0.1,
        }
    }
}

impl DrivetrainConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.motor_torque_curve.validate("motor_torque_curve")?;
        self.reverse_torque_curve.validate("reverse_torque_curve")?;
        non_negative("drivetrain.max_brake_torque", self.max_brake_torque)?;
        non_negative("drivetrain.max_handbrake_torque", self.max_handbrake_torque)?;
        non_negative("drivetrain.max_steer_angle", self.max_steer_angle)?;
        positive("drivetrain.stationary_speed", self.stationary_speed)?;
        Ok(())
    }
}

/// One drivetrain step. Pure: depends only on its arguments.
pub fn update(
    config: &DrivetrainConfig,
    input: &VehicleInputState,
    abs_speed: f32,
    prev: &DrivetrainState,
) -> DrivetrainState {
    let mut next = *prev;
    let stationary = abs_speed < config.stationary_speed;

    match prev.direction {
        DriveDirection::Reverse => {
            next.motor_torque = -input.brake * config.reverse_torque_curve.evaluate(abs_speed);
            next.brake_torque = input.throttle * config.max_brake_torque;

            if stationary && input.brake == 0.0 {
                next.direction = DriveDirection::Neutral;
            }
        }
        DriveDirection::Neutral => {
            next.motor_torque = 0.0;
            next.brake_torque = input.brake * config.max_brake_torque;

            if input.brake_just_pressed {
                next.direction = DriveDirection::Reverse;
            }
            if input.throttle > 0.0 {
                next.direction = DriveDirection::Forward;
            }
        }
        DriveDirection::Forward => {
            next.motor_torque = input.throttle * config.motor_torque_curve.evaluate(abs_speed);
            next.brake_torque = input.brake * config.max_brake_torque;

            if stationary && input.throttle == 0.0 {
                next.direction = DriveDirection::Neutral;
            }
        }
    }

    next.steer_angle_deg = config.max_steer_angle * input.steer;
    next
}

/// Drivetrain with its injected input source.
pub struct DrivetrainController<S: InputSource> {
    config: DrivetrainConfig,
    input: InputSampler<S>,
    state: DrivetrainState,
    last_input: VehicleInputState,
}

impl<S: InputSource> DrivetrainController<S> {
    pub fn new(config: DrivetrainConfig, source: S) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            input: InputSampler::new(source),
            state: DrivetrainState::default(),
            last_input: VehicleInputState::default(),
        })
    }

    /// Poll the input source and advance one step.
    pub fn step(&mut self, abs_speed: f32) -> DrivetrainState {
        let input = self.input.sample();
        let next = update(&self.config, &input, abs_speed, &self.state);

        if next.direction != self.state.direction {
            debug!(from = ?self.state.direction, to = ?next.direction, abs_speed, "drive direction changed");
        }

        self.last_input = input;
        self.state = next;
        next
    }

    pub fn reset(&mut self) {
        self.state = DrivetrainState::default();
        self.last_input = VehicleInputState::default();
        self.input.reset();
    }

    pub fn state(&self) -> &DrivetrainState {
        &self.state
    }

    /// Input sampled on the most recent step.
    pub fn last_input(&self) -> &VehicleInputState {
        &self.last_input
    }

    pub fn config(&self) -> &DrivetrainConfig {
        &self.config
    }

    pub fn source_mut(&mut self) -> &mut S {
        self.input.source_mut()
    }
}
