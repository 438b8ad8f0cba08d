pub mod synthetic;

pub use synthetic::{SyntheticDetector, SyntheticFrameSource, SyntheticScene};
