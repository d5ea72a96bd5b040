//! REST storage implementation for goals.

mod model;
mod repository;

pub use model::{GoalPatch, GoalRow, NewGoalRow};
pub use repository::RestGoalRepository;
