/// Normalize angle to [-π, π]
#[inline]
pub fn normalize_angle(angle: f64) -> f64 {
    angle.sin().atan2(angle.cos())
}

/// Yaw bookkeeping: the yaw of the first sample is the origin of all later differences.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HeadingTracker {
    start_yaw: Option<f64>,
    current_yaw: Option<f64>,
}

impl HeadingTracker {
    /// Process a yaw sample.
    pub fn observe(&mut self, yaw: f64) {
        self.current_yaw = Some(yaw);
        self.start_yaw.get_or_insert(yaw);
    }

    /// Yaw of the first sample.
    pub fn start_yaw(&self) -> Option<f64> {
        self.start_yaw
    }

    /// Yaw of the latest sample.
    pub fn current_yaw(&self) -> Option<f64> {
        self.current_yaw
    }
}

/// Difference of two yaw angles, optionally wrapped to [-π, π].
pub fn yaw_difference(current: f64, start: f64, normalize: bool) -> f64 {
    let diff = current - start;
    if normalize {
        normalize_angle(diff)
    } else {
        diff
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    #[test]
    fn first_sample_is_the_origin() {
        let mut heading = HeadingTracker::default();
        assert!(heading.start_yaw().is_none());
        heading.observe(0.5);
        heading.observe(1.5);
        assert_eq!(heading.start_yaw(), Some(0.5));
        assert_eq!(heading.current_yaw(), Some(1.5));
    }

    #[test]
    fn raw_difference_is_not_wrapped() {
        // crossing the ±π seam yields a jump of almost 2π
        assert_relative_eq!(yaw_difference(-3.0, 3.0, false), -6.0);
        assert_relative_eq!(
            yaw_difference(-3.0, 3.0, true),
            2.0 * PI - 6.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn normalize_keeps_small_angles() {
        assert_relative_eq!(normalize_angle(0.25), 0.25);
        assert_relative_eq!(normalize_angle(2.0 * PI + 0.5), 0.5, epsilon = 1e-12);
        assert_relative_eq!(normalize_angle(-2.0 * PI - 0.5), -0.5, epsilon = 1e-12);
    }
}
