pub mod timer;

pub use timer::{CalibrationStats, FrameTimer, Timer};
