pub mod model;
pub mod registry;

pub use model::RobotModel;
pub use registry::RobotRegistry;
