use nalgebra::Vector2;

fn cross(a: &Vector2<f64>, b: &Vector2<f64>) -> f64 {
    a.x * b.y - a.y * b.x
}

/// A straight wall piece.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
    /// First end point.
    pub start: Vector2<f64>,
    /// Second end point.
    pub end: Vector2<f64>,
}

impl Segment {
    /// Create a segment.
    pub fn new(start: Vector2<f64>, end: Vector2<f64>) -> Self {
        Self { start, end }
    }

    /// Distance along the ray `origin + t * direction` to this segment, if it is hit.
    ///
    /// `direction` is expected to be a unit vector. Rays parallel to the segment never hit.
    pub fn ray_intersection(&self, origin: &Vector2<f64>, direction: &Vector2<f64>) -> Option<f64> {
        let edge = self.end - self.start;
        let denom = cross(direction, &edge);
        if denom.abs() < 1e-12 {
            return None;
        }
        let offset = self.start - origin;
        let t = cross(&offset, &edge) / denom;
        let s = cross(&offset, direction) / denom;
        (t >= 0.0 && (0.0..=1.0).contains(&s)).then_some(t)
    }

    /// Euclidean distance from `point` to the closest point of the segment.
    pub fn distance_to(&self, point: &Vector2<f64>) -> f64 {
        let edge = self.end - self.start;
        let length_squared = edge.norm_squared();
        let s = if length_squared > 0.0 {
            ((point - self.start).dot(&edge) / length_squared).clamp(0.0, 1.0)
        } else {
            0.0
        };
        (self.start + edge * s - point).norm()
    }
}

/// A rectangular room with optional box shaped obstacles.
#[derive(Clone, Debug, PartialEq)]
pub struct Room {
    segments: Vec<Segment>,
    min: Vector2<f64>,
    max: Vector2<f64>,
}

fn box_segments(min: Vector2<f64>, max: Vector2<f64>) -> [Segment; 4] {
    let lower_right = Vector2::new(max.x, min.y);
    let upper_left = Vector2::new(min.x, max.y);
    [
        Segment::new(min, lower_right),
        Segment::new(lower_right, max),
        Segment::new(max, upper_left),
        Segment::new(upper_left, min),
    ]
}

impl Room {
    /// Walls of a `width` x `height` room with its lower left corner at the origin.
    pub fn rectangle(width: f64, height: f64) -> Self {
        let min = Vector2::zeros();
        let max = Vector2::new(width, height);
        Self {
            segments: box_segments(min, max).to_vec(),
            min,
            max,
        }
    }

    /// Adds an axis aligned box obstacle.
    pub fn with_obstacle(mut self, min: Vector2<f64>, max: Vector2<f64>) -> Self {
        self.segments.extend(box_segments(min, max));
        self
    }

    /// All wall segments.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Lower left corner of the outer walls.
    pub fn min(&self) -> Vector2<f64> {
        self.min
    }

    /// Upper right corner of the outer walls.
    pub fn max(&self) -> Vector2<f64> {
        self.max
    }

    /// True if `point` lies within the outer walls.
    pub fn contains(&self, point: &Vector2<f64>) -> bool {
        (self.min.x..=self.max.x).contains(&point.x) && (self.min.y..=self.max.y).contains(&point.y)
    }

    /// Distance to the closest wall hit by a ray from `origin` along `heading`, or `None` if
    /// nothing is within `max_range`.
    pub fn ray_cast(&self, origin: &Vector2<f64>, heading: f64, max_range: f64) -> Option<f64> {
        let direction = Vector2::new(heading.cos(), heading.sin());
        self.segments
            .iter()
            .filter_map(|segment| segment.ray_intersection(origin, &direction))
            .filter(|distance| *distance <= max_range)
            .min_by(|a, b| a.total_cmp(b))
    }

    /// Distance from `point` to the closest wall.
    pub fn clearance(&self, point: &Vector2<f64>) -> f64 {
        self.segments
            .iter()
            .map(|segment| segment.distance_to(point))
            .fold(f64::INFINITY, f64::min)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

    #[test]
    fn ray_cast_in_empty_room() {
        let room = Room::rectangle(4.0, 4.0);
        let center = Vector2::new(2.0, 2.0);
        assert_relative_eq!(room.ray_cast(&center, 0.0, 3.5).unwrap(), 2.0);
        assert_relative_eq!(room.ray_cast(&center, FRAC_PI_2, 3.5).unwrap(), 2.0);
        assert_relative_eq!(room.ray_cast(&center, PI, 3.5).unwrap(), 2.0, epsilon = 1e-9);
        assert_relative_eq!(
            room.ray_cast(&center, FRAC_PI_4, 3.5).unwrap(),
            2.0 * 2f64.sqrt(),
            epsilon = 1e-9
        );
        assert!(room.ray_cast(&center, 0.0, 1.5).is_none());
    }

    #[test]
    fn obstacles_shadow_the_walls() {
        let room = Room::rectangle(4.0, 4.0)
            .with_obstacle(Vector2::new(3.0, 1.5), Vector2::new(3.5, 2.5));
        let origin = Vector2::new(1.0, 2.0);
        assert_relative_eq!(room.ray_cast(&origin, 0.0, 3.5).unwrap(), 2.0);
        assert_relative_eq!(room.clearance(&Vector2::new(2.8, 2.0)), 0.2, epsilon = 1e-9);
    }

    #[test]
    fn clearance_and_containment() {
        let room = Room::rectangle(4.0, 3.0);
        assert_relative_eq!(room.clearance(&Vector2::new(1.0, 2.0)), 1.0);
        assert_relative_eq!(room.clearance(&Vector2::new(3.9, 0.5)), 0.1, epsilon = 1e-9);
        assert!(room.contains(&Vector2::new(3.9, 0.5)));
        assert!(!room.contains(&Vector2::new(4.1, 0.5)));
    }

    #[test]
    fn segment_end_points() {
        let segment = Segment::new(Vector2::new(0.0, 0.0), Vector2::new(1.0, 0.0));
        assert_relative_eq!(segment.distance_to(&Vector2::new(2.0, 0.0)), 1.0);
        assert!(segment
            .ray_intersection(&Vector2::new(2.0, 1.0), &Vector2::new(0.0, -1.0))
            .is_none());
        assert_relative_eq!(
            segment
                .ray_intersection(&Vector2::new(0.5, 1.0), &Vector2::new(0.0, -1.0))
                .unwrap(),
            1.0
        );
    }
}
