// ==============================================================================
// kinematics.rs — WHEEL FRAME + CONTACT-PLANE BASIS (WORLD SPACE)
// ------------------------------------------------------------------------------
// Chassis local convention: +Z forward, +Y up, -X right (right-handed).
//
// wheel_frame(...):
// - Rotates the chassis forward/right/up by the steer angle about local up.
//   Positive steer swings forward toward the right side.
//
// contact_basis(...):
// - Projects the wheel's rolling and lateral directions into the ground plane
//   through cross products with the contact normal:
//     forward_g = n × right
//     right_g   = forward × n
//   On flat ground these equal the wheel forward/right; on slopes they follow
//   the surface so slip and tire force stay in the contact plane.
//
// local_velocity(...):
// - (x = lateral, y = longitudinal) components of a world velocity in that
//   basis.
// ==============================================================================

use nalgebra::{Isometry3, Point3, UnitQuaternion, Vector2, Vector3};

pub const LOCAL_FORWARD: Vector3<f32> = Vector3::new(0.0, 0.0, 1.0);
pub const LOCAL_UP: Vector3<f32> = Vector3::new(0.0, 1.0, 0.0);
pub const LOCAL_RIGHT: Vector3<f32> = Vector3::new(-1.0, 0.0, 0.0);

/// World-space orthonormal wheel axes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelFrame {
    pub forward: Vector3<f32>,
    pub right: Vector3<f32>,
    pub up: Vector3<f32>,
}

/// Ground-plane rolling (forward) and lateral (right) directions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactBasis {
    pub forward: Vector3<f32>,
    pub right: Vector3<f32>,
}

/// Rotation that turns the wheel by `steer_angle_deg` (positive = right).
#[inline]
pub fn steer_rotation(steer_angle_deg: f32) -> UnitQuaternion<f32> {
    UnitQuaternion::from_axis_angle(&-Vector3::y_axis(), steer_angle_deg.to_radians())
}

pub fn wheel_frame(chassis_rotation: &UnitQuaternion<f32>, steer_angle_deg: f32) -> WheelFrame {
    let rot = chassis_rotation * steer_rotation(steer_angle_deg);
    WheelFrame {
        forward: rot * LOCAL_FORWARD,
        right: rot * LOCAL_RIGHT,
        up: rot * LOCAL_UP,
    }
}

#[inline]
pub fn contact_basis(normal: &Vector3<f32>, frame: &WheelFrame) -> ContactBasis {
    ContactBasis {
        forward: normal.cross(&frame.right),
        right: frame.forward.cross(normal),
    }
}

/// (lateral, longitudinal) velocity in the contact plane.
#[inline]
pub fn local_velocity(world_velocity: &Vector3<f32>, basis: &ContactBasis) -> Vector2<f32> {
    Vector2::new(world_velocity.dot(&basis.right), world_velocity.dot(&basis.forward))
}

/// Contact-plane force back to world space.
#[inline]
pub fn to_world(local: &Vector2<f32>, basis: &ContactBasis) -> Vector3<f32> {
    basis.forward * local.y + basis.right * local.x
}

/// World-space velocity of an arbitrary point rigidly attached to the body:
/// v(p) = v_com + ω × (p - com)
#[inline]
pub fn point_velocity(
    linvel: &Vector3<f32>,
    angvel: &Vector3<f32>,
    com: &Point3<f32>,
    p: &Point3<f32>,
) -> Vector3<f32> {
    let r = p.coords - com.coords;
    linvel + angvel.cross(&r)
}

/// Chassis forward direction in world space.
#[inline]
pub fn chassis_forward(pose: &Isometry3<f32>) -> Vector3<f32> {
    pose.rotation * LOCAL_FORWARD
}
