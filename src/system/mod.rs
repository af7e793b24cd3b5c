pub mod dubins;
pub mod state;
pub mod system;
pub mod trajectory;

pub use dubins::{Dubins, DubinsOptData, GoalRegion};
pub use state::RealVectorState;
pub use system::{Cost, System};
pub use trajectory::Trajectory;
