// ==============================================================================
// config.rs — HOST SIMULATION CONFIG
// ------------------------------------------------------------------------------
// JSON file, every field optional:
// {
//   "dt": 0.02,
//   "duration": 15.0,
//   "vehicle": { "mass": 1350.0, "wheels": [ ... ], "drivetrain": { ... } },
//   "script": [ { "at": 0.5, "input": { "throttle": 0.6 } } ]
// }
// ==============================================================================

use std::fs;
use std::path::Path;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ConfigError;
use crate::input::{InputSegment, RawInput, ScriptedInput};
use crate::vehicle::VehicleConfig;
use crate::wheel_sim::types::{non_negative, valid_gravity, MIN_DT};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub dt: f32,                 // s, fixed step
    pub duration: f32,           // s, 0 = run until ctrl-c
    pub gravity: [f32; 3],
    pub spawn_position: [f32; 3],
    pub telemetry_every: u32,    // steps between telemetry lines, 0 = off
    pub vehicle: VehicleConfig,
    pub script: Vec<InputSegment>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            dt: 0.02,
            duration: 15.0,
            gravity: [0.0, -9.81, 0.0],
            spawn_position: [0.0, 1.3, 0.0],
            telemetry_every: 25,
            vehicle: VehicleConfig::hatchback(),
            script: demo_script(),
        }
    }
}

/// Pull away, turn right, brake to a stop, back up.
fn demo_script() -> Vec<InputSegment> {
    let seg = |at: f32, throttle: f32, brake: f32, steer: f32| InputSegment {
        at,
        input: RawInput { throttle, brake, steer, handbrake: 0.0 },
    };
    vec![
        seg(0.0, 0.0, 0.0, 0.0),
        seg(1.0, 0.6, 0.0, 0.0),
        seg(4.0, 0.6, 0.0, 0.5),
        seg(6.0, 0.0, 1.0, 0.0),
        seg(9.0, 0.0, 0.0, 0.0),
        seg(9.5, 0.0, 0.6, 0.0),
        seg(12.0, 0.0, 0.0, 0.0),
    ]
}

impl SimConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let config = Self::from_json(&text)?;
        info!(path = %path.display(), "loaded sim config");
        Ok(config)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Config file from the first CLI argument, built-in defaults otherwise.
    pub fn from_args(mut args: impl Iterator<Item = String>) -> Result<Self, ConfigError> {
        match args.nth(1) {
            Some(path) => Self::load(path),
            None => {
                let config = Self::default();
                config.validate()?;
                Ok(config)
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.dt.is_finite() && self.dt > MIN_DT) {
            return Err(ConfigError::InvalidDt(self.dt));
        }
        non_negative("duration", self.duration)?;
        valid_gravity("gravity", &self.gravity_vector())?;
        for seg in &self.script {
            non_negative("script.at", seg.at)?;
        }
        self.vehicle.validate()
    }

    pub fn gravity_vector(&self) -> Vector3<f32> {
        Vector3::from(self.gravity)
    }

    /// Number of steps to run, `None` when unbounded.
    pub fn steps(&self) -> Option<u64> {
        (self.duration > 0.0).then(|| (self.duration / self.dt).round() as u64)
    }

    pub fn scripted_input(&self) -> ScriptedInput {
        ScriptedInput::new(self.script.clone(), self.dt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wheel_sim::types::WheelId;
    use approx::assert_relative_eq;

    #[test]
    fn defaults_are_valid() {
        let c = SimConfig::default();
        c.validate().unwrap();
        assert_eq!(c.steps(), Some(750));
    }

    #[test]
    fn empty_json_gives_defaults() {
        assert_eq!(SimConfig::from_json("{}").unwrap(), SimConfig::default());
    }

    #[test]
    fn partial_json_overrides_fields() {
        let c = SimConfig::from_json(
            r#"{
                "dt": 0.01,
                "duration": 0,
                "vehicle": { "mass": 900.0 },
                "script": [ { "at": 0.0, "input": { "throttle": 1.0 } } ]
            }"#,
        )
        .unwrap();

        assert_relative_eq!(c.dt, 0.01);
        assert_eq!(c.steps(), None);
        assert_relative_eq!(c.vehicle.mass, 900.0);
        assert_eq!(c.vehicle.wheels.len(), 4);
        assert_relative_eq!(c.script[0].input.throttle, 1.0);
        assert_eq!(c.script[0].input.brake, 0.0);
    }

    #[test]
    fn wheel_overrides_keep_other_defaults() {
        let c = SimConfig::from_json(
            r#"{ "vehicle": { "wheels": [
                { "id": "FL", "position": [0.8, -0.2, 1.4], "wheel": { "radius": 0.3 } },
                { "id": "FR", "position": [-0.8, -0.2, 1.4] },
                { "id": "RL", "position": [0.8, -0.2, -1.4] },
                { "id": "RR", "position": [-0.8, -0.2, -1.4] }
            ] } }"#,
        )
        .unwrap();

        let fl = c.vehicle.mount(WheelId::FL).unwrap();
        assert_relative_eq!(fl.wheel.radius, 0.3);
        assert_relative_eq!(fl.wheel.spring_rate, 50_000.0);
    }

    #[test]
    fn zero_dt_is_rejected() {
        let err = SimConfig::from_json(r#"{ "dt": 0.0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidDt(_)));
    }

    #[test]
    fn dt_below_wheel_minimum_is_rejected() {
        let err = SimConfig::from_json(r#"{ "dt": 1e-7 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidDt(_)));
        assert!(SimConfig::from_json(r#"{ "dt": 0.001 }"#).is_ok());
    }

    #[test]
    fn bad_wheel_is_rejected() {
        let err = SimConfig::from_json(
            r#"{ "vehicle": { "wheels": [
                { "id": "FL", "position": [0.8, 0, 1.4], "wheel": { "inertia": 0.0 } },
                { "id": "FR", "position": [-0.8, 0, 1.4] },
                { "id": "RL", "position": [0.8, 0, -1.4] },
                { "id": "RR", "position": [-0.8, 0, -1.4] }
            ] } }"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "wheel.inertia"));
    }

    #[test]
    fn missing_wheel_is_rejected() {
        let err = SimConfig::from_json(
            r#"{ "vehicle": { "wheels": [ { "id": "FL", "position": [0.8, 0, 1.4] } ] } }"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingMount(_)));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(SimConfig::from_json("{ dt: "), Err(ConfigError::Json(_))));
    }

    #[test]
    fn unreadable_file_is_an_io_error() {
        let err = SimConfig::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn no_argument_uses_defaults() {
        let c = SimConfig::from_args(["wheel-collider".to_string()].into_iter()).unwrap();
        assert_eq!(c, SimConfig::default());
    }
}
