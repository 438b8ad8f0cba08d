pub mod engine;
pub mod transmitter;

pub use engine::Engine;
pub use transmitter::Transmitter;
