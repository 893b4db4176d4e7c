use nalgebra::Vector3;

/// Distance bookkeeping for the random walk.
///
/// The distance is accumulated per control tick between the current position and the position
/// saved at the previous accumulation, so it measures straight segments between ticks rather
/// than the true path length.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Odometer {
    start: Option<Vector3<f64>>,
    last_saved: Option<Vector3<f64>>,
    total_distance: f64,
}

impl Odometer {
    /// Process a position sample. The first sample becomes start and last saved position.
    pub fn observe(&mut self, position: &Vector3<f64>) {
        self.start.get_or_insert(*position);
        self.last_saved.get_or_insert(*position);
    }

    /// Add the planar distance from the last saved position to `current` and save `current`.
    ///
    /// Returns the added distance.
    pub fn accumulate(&mut self, current: &Vector3<f64>) -> f64 {
        let step = self
            .last_saved
            .map(|saved| (current.xy() - saved.xy()).norm())
            .unwrap_or(0.0);
        self.last_saved = Some(*current);
        self.total_distance += step;
        step
    }

    /// Start a new trial. Only the accumulated distance is cleared.
    pub fn reset_trial(&mut self) {
        self.total_distance = 0.0;
    }

    /// Position of the first sample.
    pub fn start(&self) -> Option<Vector3<f64>> {
        self.start
    }

    /// Position saved by the last accumulation.
    pub fn last_saved(&self) -> Option<Vector3<f64>> {
        self.last_saved
    }

    /// Accumulated distance in meters.
    pub fn total_distance(&self) -> f64 {
        self.total_distance
    }
}
