//! Collaborators the core consumes but does not implement: the chassis rigid
//! body and the ground ray query. The host wires these to a physics engine.

use nalgebra::{Isometry3, Point3, Vector3};

use crate::wheel_sim::kinematics::chassis_forward;
use crate::wheel_sim::types::{ContactSample, GroundRay};

pub trait RigidBodyService {
    /// World pose of the chassis.
    fn pose(&self) -> Isometry3<f32>;

    fn linear_velocity(&self) -> Vector3<f32>;

    /// World velocity of a point rigidly attached to the chassis.
    fn point_velocity(&self, point: &Point3<f32>) -> Vector3<f32>;

    /// Accumulate a world-space force at a world-space point.
    fn add_force_at_point(&mut self, force: Vector3<f32>, point: Point3<f32>);

    fn forward(&self) -> Vector3<f32> {
        chassis_forward(&self.pose())
    }

    /// Signed speed along the chassis forward axis, km/h.
    fn longitudinal_speed_kmh(&self) -> f32 {
        self.linear_velocity().dot(&self.forward()) * 3.6
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundHit {
    pub distance: f32,
    pub normal: Vector3<f32>,
}

pub trait GroundQueryService {
    /// First hit along `direction` within `max_distance`, restricted to the
    /// layers in `mask`.
    fn cast(
        &self,
        origin: &Point3<f32>,
        direction: &Vector3<f32>,
        max_distance: f32,
        mask: u32,
    ) -> Option<GroundHit>;

    fn sample(&self, ray: &GroundRay) -> ContactSample {
        match self.cast(&ray.origin, &ray.direction, ray.max_distance, ray.mask) {
            Some(hit) => ContactSample::hit(hit.distance, hit.normal),
            None => ContactSample::airborne(),
        }
    }
}

/// Infinite horizontal plane at `height`, for tests and tools.
#[derive(Debug, Clone, Copy)]
pub struct FlatGround {
    pub height: f32,
    pub layers: u32,
}

impl FlatGround {
    pub fn at(height: f32) -> Self {
        Self { height, layers: 1 }
    }
}

impl GroundQueryService for FlatGround {
    fn cast(
        &self,
        origin: &Point3<f32>,
        direction: &Vector3<f32>,
        max_distance: f32,
        mask: u32,
    ) -> Option<GroundHit> {
        if mask & self.layers == 0 || direction.y >= 0.0 {
            return None;
        }
        let distance = (self.height - origin.y) / direction.y;
        (distance >= 0.0 && distance <= max_distance).then(|| GroundHit { distance, normal: Vector3::y() })
    }
}
