// ==============================================================================
// vehicle.rs — FOUR-WHEEL ASSEMBLY
// ------------------------------------------------------------------------------
// Per step:
//   1) speed along chassis forward (km/h)
//   2) drivetrain update (polls the injected input source)
//   3) torque split 25% per wheel, handbrake on the rear pair
//   4) Ackermann angles for the front pair
//   5) ground query + step for each wheel
// Forces are returned, not applied: the caller applies all four wheels' forces
// after every wheel has stepped.
// ==============================================================================

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ConfigError;
use crate::input::InputSource;
use crate::wheel_sim::drivetrain::{DrivetrainConfig, DrivetrainController, DrivetrainState};
use crate::wheel_sim::services::{GroundQueryService, RigidBodyService};
use crate::wheel_sim::steering::SteeringGeometry;
use crate::wheel_sim::types::{positive, valid_gravity, WheelActuation, WheelConfig, WheelId, WheelStepOutput};
use crate::wheel_sim::wheel::WheelSimulator;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WheelMountConfig {
    pub id: WheelId,
    pub position: [f32; 3], // chassis local, +Z forward, -X right
    #[serde(default)]
    pub wheel: WheelConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleConfig {
    pub mass: f32,                      // kg
    pub linear_damping: f32,            // drag
    pub angular_damping: f32,           // rotational drag
    pub chassis_half_extents: [f32; 3], // [hx, hy, hz] meters
    pub chassis_com_offset: [f32; 3],   // local offset from collider center

    pub drivetrain: DrivetrainConfig,
    pub wheels: Vec<WheelMountConfig>,
}

impl Default for VehicleConfig {
    fn default() -> Self {
        Self::hatchback()
    }
}

impl VehicleConfig {
    /// 1.35 t hatchback, 2.5 m wheel base, 1.5 m track.
    pub fn hatchback() -> Self {
        let mount = |id, x: f32, z: f32| WheelMountConfig {
            id,
            position: [x, -0.2, z],
            wheel: WheelConfig::default(),
        };

        Self {
            mass: 1350.0,
            linear_damping: 0.05,
            angular_damping: 0.5,
            chassis_half_extents: [0.85, 0.35, 2.1],
            chassis_com_offset: [0.0, -0.15, 0.0],
            drivetrain: DrivetrainConfig::default(),
            wheels: vec![
                mount(WheelId::FL, 0.75, 1.25),
                mount(WheelId::FR, -0.75, 1.25),
                mount(WheelId::RL, 0.75, -1.25),
                mount(WheelId::RR, -0.75, -1.25),
            ],
        }
    }

    pub fn mount(&self, id: WheelId) -> Result<&WheelMountConfig, ConfigError> {
        self.wheels
            .iter()
            .find(|w| w.id == id)
            .ok_or_else(|| ConfigError::MissingMount(id.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("vehicle.mass", self.mass)?;
        for (axis, &h) in ["x", "y", "z"].iter().zip(self.chassis_half_extents.iter()) {
            positive(&format!("vehicle.chassis_half_extents.{axis}"), h)?;
        }
        self.drivetrain.validate()?;
        for id in WheelId::ALL {
            self.mount(id)?.wheel.validate()?;
        }
        Ok(())
    }
}

/// Split aggregate drivetrain output into per-wheel commands `[FL, FR, RL, RR]`.
pub fn distribute(
    state: &DrivetrainState,
    geometry: &SteeringGeometry,
    handbrake: f32,
    max_handbrake_torque: f32,
) -> [WheelActuation; 4] {
    let motor = state.motor_torque * 0.25;
    let brake = state.brake_torque * 0.25;
    let rear_brake = brake + handbrake * max_handbrake_torque;
    let (left, right) = geometry.front_angles(state.steer_angle_deg);

    [
        WheelActuation { motor_torque: motor, brake_torque: brake, steer_angle_deg: left },
        WheelActuation { motor_torque: motor, brake_torque: brake, steer_angle_deg: right },
        WheelActuation { motor_torque: motor, brake_torque: rear_brake, steer_angle_deg: 0.0 },
        WheelActuation { motor_torque: motor, brake_torque: rear_brake, steer_angle_deg: 0.0 },
    ]
}

#[derive(Debug, Clone, Copy)]
pub struct VehicleStepOutput {
    pub drivetrain: DrivetrainState,
    pub speed_kmh: f32,
    pub wheels: [WheelStepOutput; 4],
}

impl VehicleStepOutput {
    /// Push every wheel's suspension and tire force onto the chassis.
    pub fn apply<B: RigidBodyService + ?Sized>(&self, body: &mut B) {
        for w in &self.wheels {
            body.add_force_at_point(w.suspension.force, w.suspension.point);
            body.add_force_at_point(w.tire.force, w.tire.point);
        }
    }

    pub fn net_force(&self) -> Vector3<f32> {
        self.wheels
            .iter()
            .map(|w| w.suspension.force + w.tire.force)
            .sum()
    }
}

pub struct Vehicle<S: InputSource> {
    drivetrain: DrivetrainController<S>,
    wheels: [WheelSimulator; 4],
    geometry: SteeringGeometry,
    actuation: [WheelActuation; 4],
    speed_kmh: f32,
    enabled: bool,
}

impl<S: InputSource> Vehicle<S> {
    pub fn new(config: &VehicleConfig, gravity: Vector3<f32>, source: S) -> Result<Self, ConfigError> {
        config.validate()?;
        valid_gravity("gravity", &gravity)?;

        let build = |id: WheelId| -> Result<WheelSimulator, ConfigError> {
            let m = config.mount(id)?;
            let [x, y, z] = m.position;
            Ok(WheelSimulator::new(id, m.wheel, Point3::new(x, y, z))?.with_gravity(gravity))
        };
        let wheels = [build(WheelId::FL)?, build(WheelId::FR)?, build(WheelId::RL)?, build(WheelId::RR)?];
        let geometry = SteeringGeometry::from_mounts(wheels[0].mount(), wheels[2].mount());

        Ok(Self {
            drivetrain: DrivetrainController::new(config.drivetrain.clone(), source)?,
            wheels,
            geometry,
            actuation: [WheelActuation::default(); 4],
            speed_kmh: 0.0,
            enabled: true,
        })
    }

    /// One fixed step. `None` once the vehicle has been disabled.
    pub fn step<B, G>(&mut self, dt: f32, body: &B, ground: &G) -> Option<VehicleStepOutput>
    where
        B: RigidBodyService + ?Sized,
        G: GroundQueryService + ?Sized,
    {
        if !self.enabled {
            return None;
        }

        self.speed_kmh = body.longitudinal_speed_kmh();
        let state = self.drivetrain.step(self.speed_kmh.abs());
        let handbrake = self.drivetrain.last_input().handbrake;
        self.actuation = distribute(
            &state,
            &self.geometry,
            handbrake,
            self.drivetrain.config().max_handbrake_torque,
        );

        let pose = body.pose();
        let point_velocity = |p: &Point3<f32>| body.point_velocity(p);

        let actuation = self.actuation;
        let wheels = &mut self.wheels;
        let outputs = std::array::from_fn(|i| {
            let wheel = &mut wheels[i];
            let act = actuation[i];
            let contact = ground.sample(&wheel.ground_ray(&pose, act.steer_angle_deg));
            wheel.step(dt, &act, &pose, point_velocity, &contact)
        });

        Some(VehicleStepOutput {
            drivetrain: state,
            speed_kmh: self.speed_kmh,
            wheels: outputs,
        })
    }

    /// Stop simulating for the rest of this vehicle's life.
    pub fn disable(&mut self, reason: &str) {
        if self.enabled {
            warn!(reason, "disabling vehicle");
            self.enabled = false;
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn reset(&mut self) {
        self.drivetrain.reset();
        for w in &mut self.wheels {
            w.reset();
        }
        self.actuation = [WheelActuation::default(); 4];
        self.speed_kmh = 0.0;
    }

    pub fn wheels(&self) -> &[WheelSimulator; 4] {
        &self.wheels
    }

    pub fn wheel(&self, id: WheelId) -> &WheelSimulator {
        &self.wheels[id.index()]
    }

    pub fn actuation(&self) -> &[WheelActuation; 4] {
        &self.actuation
    }

    pub fn drivetrain(&self) -> &DrivetrainController<S> {
        &self.drivetrain
    }

    pub fn drivetrain_mut(&mut self) -> &mut DrivetrainController<S> {
        &mut self.drivetrain
    }

    pub fn geometry(&self) -> &SteeringGeometry {
        &self.geometry
    }

    pub fn speed_kmh(&self) -> f32 {
        self.speed_kmh
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{RawInput, ScriptedInput};
    use crate::wheel_sim::drivetrain::DriveDirection;
    use crate::wheel_sim::services::FlatGround;
    use crate::wheel_sim::wheel::DEFAULT_GRAVITY;
    use approx::assert_relative_eq;
    use nalgebra::Isometry3;

    const DT: f32 = 0.02;

    #[derive(Default)]
    struct FakeBody {
        pose: Isometry3<f32>,
        velocity: Vector3<f32>,
        forces: Vec<(Vector3<f32>, Point3<f32>)>,
    }

    impl RigidBodyService for FakeBody {
        fn pose(&self) -> Isometry3<f32> {
            self.pose
        }

        fn linear_velocity(&self) -> Vector3<f32> {
            self.velocity
        }

        fn point_velocity(&self, _point: &Point3<f32>) -> Vector3<f32> {
            self.velocity
        }

        fn add_force_at_point(&mut self, force: Vector3<f32>, point: Point3<f32>) {
            self.forces.push((force, point));
        }
    }

    fn parked(height: f32) -> FakeBody {
        FakeBody { pose: Isometry3::translation(0.0, height, 0.0), ..Default::default() }
    }

    fn vehicle(input: RawInput) -> Vehicle<ScriptedInput> {
        Vehicle::new(&VehicleConfig::hatchback(), DEFAULT_GRAVITY, ScriptedInput::constant(input, DT))
            .expect("hatchback preset is valid")
    }

    #[test]
    fn torque_is_split_evenly_and_handbrake_is_rear_only() {
        let geometry = SteeringGeometry { wheel_base: 2.5, wheel_track: 1.5 };
        let state = DrivetrainState {
            direction: DriveDirection::Forward,
            motor_torque: 1000.0,
            brake_torque: 400.0,
            steer_angle_deg: 0.0,
        };

        let out = distribute(&state, &geometry, 0.5, 4000.0);

        for a in &out {
            assert_relative_eq!(a.motor_torque, 250.0);
            assert_eq!(a.steer_angle_deg, 0.0);
        }
        assert_relative_eq!(out[WheelId::FL.index()].brake_torque, 100.0);
        assert_relative_eq!(out[WheelId::FR.index()].brake_torque, 100.0);
        assert_relative_eq!(out[WheelId::RL.index()].brake_torque, 2100.0);
        assert_relative_eq!(out[WheelId::RR.index()].brake_torque, 2100.0);
    }

    #[test]
    fn only_front_wheels_steer() {
        let geometry = SteeringGeometry { wheel_base: 2.5, wheel_track: 1.5 };
        let state = DrivetrainState { steer_angle_deg: 20.0, ..Default::default() };

        let out = distribute(&state, &geometry, 0.0, 4000.0);

        assert!(out[WheelId::FL.index()].steer_angle_deg > 0.0);
        assert!(out[WheelId::FR.index()].steer_angle_deg > out[WheelId::FL.index()].steer_angle_deg);
        assert_eq!(out[WheelId::RL.index()].steer_angle_deg, 0.0);
        assert_eq!(out[WheelId::RR.index()].steer_angle_deg, 0.0);
    }

    #[test]
    fn hatchback_geometry_matches_mounts() {
        let v = vehicle(RawInput::default());
        assert_relative_eq!(v.geometry().wheel_base, 2.5);
        assert_relative_eq!(v.geometry().wheel_track, 1.5);
    }

    #[test]
    fn missing_mount_is_rejected() {
        let mut cfg = VehicleConfig::hatchback();
        cfg.wheels.retain(|w| w.id != WheelId::RR);

        let err = Vehicle::new(&cfg, DEFAULT_GRAVITY, ScriptedInput::default()).err();
        assert!(matches!(err, Some(ConfigError::MissingMount(ref id)) if id == "RR"));
    }

    #[test]
    fn unusable_gravity_is_rejected() {
        for g in [Vector3::zeros(), Vector3::new(0.0, f32::NAN, 0.0), Vector3::new(0.0, f32::INFINITY, 0.0)] {
            let err = Vehicle::new(&VehicleConfig::hatchback(), g, ScriptedInput::default()).err();
            assert!(matches!(err, Some(ConfigError::InvalidValue { ref field, .. }) if field == "gravity"));
        }
    }

    #[test]
    fn parked_vehicle_pushes_up_on_all_four_wheels() {
        let mut v = vehicle(RawInput::default());
        let mut body = parked(0.6);

        let out = v.step(DT, &body, &FlatGround::at(0.0)).expect("enabled");
        out.apply(&mut body);

        assert_eq!(body.forces.len(), 8);
        for w in v.wheels() {
            assert!(w.is_grounded());
            assert!(w.load() > 0.0);
        }
        assert!(out.net_force().y > 0.0);
        assert_relative_eq!(out.net_force().x, 0.0, epsilon = 1e-2);
    }

    #[test]
    fn airborne_vehicle_produces_no_force() {
        let mut v = vehicle(RawInput::default());
        let out = v.step(DT, &parked(5.0), &FlatGround::at(0.0)).expect("enabled");

        assert_eq!(out.net_force(), Vector3::zeros());
        assert!(v.wheels().iter().all(|w| !w.is_grounded()));
    }

    #[test]
    fn throttle_engages_forward_and_drives_every_wheel() {
        let mut v = vehicle(RawInput { throttle: 0.5, ..Default::default() });
        let body = parked(0.6);
        let ground = FlatGround::at(0.0);

        v.step(DT, &body, &ground);
        assert_eq!(v.drivetrain().state().direction, DriveDirection::Forward);

        v.step(DT, &body, &ground);
        let expected = 0.5 * v.drivetrain().config().motor_torque_curve.evaluate(0.0) * 0.25;
        for a in v.actuation() {
            assert_relative_eq!(a.motor_torque, expected);
        }
        assert!(v.wheels().iter().all(|w| w.angular_velocity() > 0.0));
    }

    #[test]
    fn speed_is_measured_along_chassis_forward() {
        let mut v = vehicle(RawInput::default());
        let mut body = parked(5.0);
        body.velocity = Vector3::new(0.0, 0.0, -10.0);

        let out = v.step(DT, &body, &FlatGround::at(0.0)).expect("enabled");
        assert_relative_eq!(out.speed_kmh, -36.0, epsilon = 1e-4);
    }

    #[test]
    fn disabled_vehicle_stops_stepping() {
        let mut v = vehicle(RawInput::default());
        v.disable("chassis body removed");
        v.disable("logged once");

        assert!(!v.is_enabled());
        assert!(v.step(DT, &parked(0.6), &FlatGround::at(0.0)).is_none());
    }

    #[test]
    fn reset_returns_wheels_to_rest() {
        let mut v = vehicle(RawInput { throttle: 1.0, ..Default::default() });
        let body = parked(0.6);
        for _ in 0..10 {
            v.step(DT, &body, &FlatGround::at(0.0));
        }
        v.reset();

        assert_eq!(v.drivetrain().state().direction, DriveDirection::Neutral);
        for w in v.wheels() {
            assert_eq!(w.angular_velocity(), 0.0);
            assert_eq!(w.state().suspension_length, w.config().rest_length);
        }
    }
}
