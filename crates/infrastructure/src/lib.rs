pub mod arp;
pub mod detector;
pub mod system;

pub use detector::open_conflict_detector;
