//! Raycast wheel colliders and a forward/neutral/reverse drivetrain for a
//! four-wheeled vehicle, plus a rapier host that drives them.

pub mod config;
pub mod debug_builders;
pub mod error;
pub mod input;
pub mod physics;
pub mod vehicle;
pub mod wheel_sim;

pub use config::SimConfig;
pub use error::ConfigError;
pub use input::{InputSampler, InputSource, RawInput, ScriptedInput, VehicleInputState};
pub use physics::PhysicsWorld;
pub use vehicle::{Vehicle, VehicleConfig, VehicleStepOutput, WheelMountConfig};
