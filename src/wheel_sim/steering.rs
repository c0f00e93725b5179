// ==============================================================================
// steering.rs — ACKERMANN STEERING GEOMETRY (FRONT AXLE)
// ==============================================================================
// Given the centerline steer angle from the drivetrain and the axle geometry,
// produce the left/right front wheel angles.
//
//   R     = wheel_base / tan(steer)
//   left  = atan(wheel_base / (R + track/2))
//   right = atan(wheel_base / (R - track/2))
//
// R carries the sign of the steer angle, so the same two formulas put the
// sharper angle on the inner wheel for both turn directions.
//
// Not clamped: once |R| approaches track/2 the inner wheel angle runs to ±90°
// and past it flips sign. Keep max steer well inside that.
// ==============================================================================

use nalgebra::Point3;

/// Axle dimensions derived from wheel mount positions (chassis local, z forward).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SteeringGeometry {
    pub wheel_base: f32,   // m, front axle to rear axle
    pub wheel_track: f32,  // m, left to right at the front axle
}

impl SteeringGeometry {
    pub fn from_mounts(front_left: &Point3<f32>, rear_left: &Point3<f32>) -> Self {
        Self {
            wheel_base: front_left.z.abs() + rear_left.z.abs(),
            wheel_track: front_left.x.abs() * 2.0,
        }
    }

    /// (left, right) front wheel angles in degrees.
    pub fn front_angles(&self, steer_angle_deg: f32) -> (f32, f32) {
        ackermann_angles(steer_angle_deg, self.wheel_base, self.wheel_track)
    }
}

/// Compute (left, right) wheel angles, degrees in and out.
pub fn ackermann_angles(steer_angle_deg: f32, wheel_base: f32, wheel_track: f32) -> (f32, f32) {
    if steer_angle_deg == 0.0 {
        return (0.0, 0.0);
    }

    // Bicycle-model turning radius
    let r = wheel_base / steer_angle_deg.to_radians().tan();
    let half_track = wheel_track * 0.5;

    let left = (wheel_base / (r + half_track)).atan().to_degrees();
    let right = (wheel_base / (r - half_track)).atan().to_degrees();

    (left, right)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::point;

    #[test]
    fn straight_ahead_is_exactly_zero() {
        assert_eq!(ackermann_angles(0.0, 2.5, 1.5), (0.0, 0.0));
    }

    #[test]
    fn reference_turn() {
        let r = 2.5 / 20f32.to_radians().tan();
        assert_relative_eq!(r, 6.87, epsilon = 0.01);

        let (left, right) = ackermann_angles(20.0, 2.5, 1.5);
        assert_relative_eq!(left, 18.2, epsilon = 0.1);
        assert_relative_eq!(right, 22.2, epsilon = 0.1);
        assert!(right.abs() > left.abs());
    }

    #[test]
    fn inner_wheel_is_sharper_both_ways() {
        let (l, r) = ackermann_angles(15.0, 2.6, 1.6);
        assert!(r > l && l > 0.0);

        let (l, r) = ackermann_angles(-15.0, 2.6, 1.6);
        assert!(l < r && r < 0.0);
        assert!(l.abs() > r.abs());
    }

    #[test]
    fn mirrored_turns_are_symmetric() {
        let (l, r) = ackermann_angles(25.0, 2.5, 1.5);
        let (ml, mr) = ackermann_angles(-25.0, 2.5, 1.5);
        assert_relative_eq!(l, -mr, epsilon = 1e-4);
        assert_relative_eq!(r, -ml, epsilon = 1e-4);
    }

    #[test]
    fn extreme_angle_is_not_clamped() {
        // R < track/2: the inner wheel formula crosses its pole and flips sign.
        let (_, right) = ackermann_angles(80.0, 2.5, 1.5);
        assert!(right < 0.0);
    }

    #[test]
    fn geometry_from_mounts() {
        let g = SteeringGeometry::from_mounts(&point![0.75, 0.0, 1.3], &point![0.75, 0.0, -1.2]);
        assert_relative_eq!(g.wheel_base, 2.5);
        assert_relative_eq!(g.wheel_track, 1.5);
    }
}
