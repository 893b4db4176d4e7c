use std::fmt::{Debug, Display};

use nalgebra::{Quaternion, UnitQuaternion, Vector3};

/// A generic value with a timestamp.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Stamped<T: Clone + Debug> {
    /// Timestamp of the value.
    pub time: f64,
    /// Monotonic sequence counter
    pub seq: u64,
    /// The value.
    pub value: T,
}

impl<T: Clone + Debug> Stamped<T> {
    /// Creates a new value with a timestamp.
    pub fn from_stamp_counter_and_value(time: f64, seq: u64, value: &T) -> Self {
        Self {
            time,
            seq,
            value: value.clone(),
        }
    }
}

impl<T: Display + Clone + Debug> Display for Stamped<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "@{} {}", self.time, self.value)
    }
}

/// Yaw of an orientation quaternion: `atan2(2(wz + xy), 1 - 2(y² + z²))`.
///
/// The quaternion is used as given, without normalization.
pub fn yaw_from_quaternion(q: &Quaternion<f64>) -> f64 {
    let (x, y, z, w) = (q.i, q.j, q.k, q.w);
    (2.0 * (w * z + x * y)).atan2(1.0 - 2.0 * (y * y + z * z))
}

/// Robot pose as reported by odometry.
#[derive(Clone, Debug, PartialEq)]
pub struct Pose {
    /// Position in meters.
    pub position: Vector3<f64>,
    /// Orientation quaternion.
    pub orientation: Quaternion<f64>,
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            position: Vector3::zeros(),
            orientation: Quaternion::identity(),
        }
    }
}

impl Pose {
    /// Pose in the ground plane at `(x, y)` facing `yaw`.
    pub fn planar(x: f64, y: f64, yaw: f64) -> Self {
        Self {
            position: Vector3::new(x, y, 0.0),
            orientation: UnitQuaternion::from_euler_angles(0.0, 0.0, yaw).into_inner(),
        }
    }

    /// Heading around the z axis.
    pub fn yaw(&self) -> f64 {
        yaw_from_quaternion(&self.orientation)
    }

    /// Ground plane distance to `other`.
    pub fn planar_distance(&self, other: &Vector3<f64>) -> f64 {
        (self.position.xy() - other.xy()).norm()
    }
}

impl Display for Pose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "position: ({:.3}, {:.3}, {:.3}), yaw: {:.3}",
            self.position.x,
            self.position.y,
            self.position.z,
            self.yaw()
        )
    }
}
