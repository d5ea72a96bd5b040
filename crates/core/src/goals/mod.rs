//! Goals module - domain models, collection store, statistics, and traits.

mod goals_model;
mod goals_store;
mod goals_traits;

pub mod goals_stats;

#[cfg(test)]
mod goals_store_tests;

pub use goals_model::{Goal, GoalCategory, GoalInsert, GoalStatus, GoalUpdate, NewGoal};
pub use goals_stats::GoalStats;
pub use goals_store::{GoalSnapshot, GoalStore};
pub use goals_traits::{GoalRepositoryTrait, GoalStoreTrait, IdentityProviderTrait};
