pub mod error;
pub mod neighbors;
pub mod rrt_star;
pub mod vertex;

pub use error::{IterationError, SwitchRootError, TreeRepairError};
pub use neighbors::{KdTreeNearestNeighbors, LinearNearestNeighbors, NearestNeighbors};
pub use rrt_star::{optimal_gamma, PlannerConfig, RrtStar};
pub use vertex::{Edge, Vertex};
