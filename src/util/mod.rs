pub mod ordered_cost;

pub use ordered_cost::OrderedCost;
