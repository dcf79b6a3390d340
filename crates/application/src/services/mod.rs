mod conflict_detector;

pub use conflict_detector::{effective_deadline, ConflictDetector, DeadlineSource};
