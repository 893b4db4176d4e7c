//! Sensor preprocessing: range scan cleaning, sector reduction and pose handling.

/// Range scans and the sentinel cleaning step.
pub mod scan;
pub use scan::{clean, clean_reading, CleanedScan, LaserScan, ScanGeometry};

/// Angular sectors of a cleaned scan and their minima.
pub mod sectors;
pub use sectors::{aggregate, SectorBounds, SectorMinima};

/// Robot pose and time stamped samples.
pub mod pose;
pub use pose::{yaw_from_quaternion, Pose, Stamped};
