// ==============================================================================
// curve.rs — SAMPLED TORQUE CURVES
// ------------------------------------------------------------------------------
// Torque available at the wheels as a function of vehicle speed (km/h).
// Keys are (speed, torque) pairs with strictly increasing speed; sampling is
// piecewise linear between keys and holds the end values outside the range.
// ==============================================================================

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TorqueCurve {
    pub keys: Vec<(f32, f32)>,
}

impl TorqueCurve {
    pub fn new(keys: Vec<(f32, f32)>) -> Self {
        Self { keys }
    }

    /// Same torque at every speed.
    pub fn constant(torque: f32) -> Self {
        Self { keys: vec![(0.0, torque)] }
    }

    pub fn validate(&self, name: &str) -> Result<(), ConfigError> {
        let err = |message: String| ConfigError::InvalidCurve { name: name.to_string(), message };

        if self.keys.is_empty() {
            return Err(err("curve has no keys".into()));
        }
        for (i, &(s, t)) in self.keys.iter().enumerate() {
            if !s.is_finite() || !t.is_finite() {
                return Err(err(format!("key {i} is not finite")));
            }
        }
        for (i, pair) in self.keys.windows(2).enumerate() {
            if pair[1].0 <= pair[0].0 {
                return Err(err(format!("key {} speed does not increase", i + 1)));
            }
        }
        Ok(())
    }

    pub fn evaluate(&self, speed: f32) -> f32 {
        let Some(&(first_s, first_t)) = self.keys.first() else { return 0.0 };
        if speed <= first_s {
            return first_t;
        }

        for pair in self.keys.windows(2) {
            let (s0, t0) = pair[0];
            let (s1, t1) = pair[1];
            if speed <= s1 {
                let t = (speed - s0) / (s1 - s0);
                return t0 + (t1 - t0) * t;
            }
        }

        self.keys.last().map(|&(_, t)| t).unwrap_or(0.0)
    }
}
