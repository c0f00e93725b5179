//! wheel_sim - engine-agnostic drivetrain + raycast wheel model (pure types + solver)

pub mod types;
pub mod curve;
pub mod drivetrain;
pub mod steering;
pub mod kinematics;
pub mod suspension;
pub mod spin;
pub mod tire;
pub mod wheel;
pub mod services;

pub use types::*;
pub use curve::TorqueCurve;
pub use drivetrain::{DriveDirection, DrivetrainConfig, DrivetrainController, DrivetrainState};
pub use steering::{ackermann_angles, SteeringGeometry};
pub use services::{FlatGround, GroundHit, GroundQueryService, RigidBodyService};
pub use wheel::WheelSimulator;
