// ==============================================================================
// debug_builders.rs — TELEMETRY SNAPSHOTS
// ------------------------------------------------------------------------------
// Serializable per-step snapshots of a vehicle:
// - DebugRay: suspension ray and its hit point
// - WheelTelemetry: per-wheel load, spin, suspension offset, commands
// - VehicleTelemetry: chassis pose, speed, drivetrain state, input, wheels
//
// Read-only: building a snapshot never touches simulation state.
// ==============================================================================

use nalgebra::{Isometry3, Point3, Vector3};
use serde::Serialize;

use crate::input::{InputSource, VehicleInputState};
use crate::vehicle::Vehicle;
use crate::wheel_sim::drivetrain::DriveDirection;
use crate::wheel_sim::types::WheelActuation;
use crate::wheel_sim::wheel::WheelSimulator;

const RAY_GROUNDED: [f32; 3] = [0.1, 0.9, 0.2];
const RAY_AIRBORNE: [f32; 3] = [0.9, 0.2, 0.1];

#[inline]
fn v3(v: &Vector3<f32>) -> [f32; 3] {
    [v.x, v.y, v.z]
}

#[inline]
fn p3(p: &Point3<f32>) -> [f32; 3] {
    [p.x, p.y, p.z]
}

#[derive(Debug, Clone, Serialize)]
pub struct DebugRay {
    pub origin: [f32; 3],
    pub direction: [f32; 3],
    pub length: f32,
    pub hit: Option<[f32; 3]>,
    pub color: [f32; 3],
}

#[derive(Debug, Clone, Serialize)]
pub struct WheelTelemetry {
    pub id: &'static str,
    pub grounded: bool,
    pub load: f32,
    pub angular_velocity: f32,
    pub visual_spin_angle: f32,
    pub suspension_offset: f32,
    pub steer_angle_deg: f32,
    pub command: WheelActuation,
    pub ray: DebugRay,
}

#[derive(Debug, Clone, Serialize)]
pub struct VehicleTelemetry {
    pub name: String,
    pub tick: u64,
    pub position: [f32; 3],
    pub rotation: [f32; 4], // quaternion (i, j, k, w)
    pub speed_kmh: f32,
    pub direction: DriveDirection,
    pub motor_torque: f32,
    pub brake_torque: f32,
    pub steer_angle_deg: f32,
    pub input: VehicleInputState,
    pub wheels: Vec<WheelTelemetry>,
}

/// Suspension ray as cast this step. The hit sits at the current suspension
/// length plus radius along the ray.
pub fn build_wheel_ray(pose: &Isometry3<f32>, wheel: &WheelSimulator) -> DebugRay {
    let ray = wheel.ground_ray(pose, wheel.steer_angle_deg());
    let reach = wheel.state().suspension_length + wheel.config().radius;
    let hit = wheel.is_grounded().then(|| p3(&(ray.origin + ray.direction * reach)));

    DebugRay {
        origin: p3(&ray.origin),
        direction: v3(&ray.direction),
        length: ray.max_distance,
        hit,
        color: if wheel.is_grounded() { RAY_GROUNDED } else { RAY_AIRBORNE },
    }
}

pub fn build_wheel_telemetry(
    pose: &Isometry3<f32>,
    wheel: &WheelSimulator,
    command: WheelActuation,
) -> WheelTelemetry {
    WheelTelemetry {
        id: wheel.id().as_str(),
        grounded: wheel.is_grounded(),
        load: wheel.load(),
        angular_velocity: wheel.angular_velocity(),
        visual_spin_angle: wheel.visual_spin_angle(),
        suspension_offset: wheel.suspension_offset(),
        steer_angle_deg: wheel.steer_angle_deg(),
        command,
        ray: build_wheel_ray(pose, wheel),
    }
}

pub fn build_vehicle_telemetry<S: InputSource>(
    name: &str,
    tick: u64,
    pose: &Isometry3<f32>,
    vehicle: &Vehicle<S>,
) -> VehicleTelemetry {
    let state = vehicle.drivetrain().state();
    let q = pose.rotation.coords;

    VehicleTelemetry {
        name: name.to_owned(),
        tick,
        position: v3(&pose.translation.vector),
        rotation: [q.x, q.y, q.z, q.w],
        speed_kmh: vehicle.speed_kmh(),
        direction: state.direction,
        motor_torque: state.motor_torque,
        brake_torque: state.brake_torque,
        steer_angle_deg: state.steer_angle_deg,
        input: *vehicle.drivetrain().last_input(),
        wheels: vehicle
            .wheels()
            .iter()
            .zip(vehicle.actuation().iter())
            .map(|(w, a)| build_wheel_telemetry(pose, w, *a))
            .collect(),
    }
}
