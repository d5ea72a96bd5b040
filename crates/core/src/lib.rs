//! GoalPath Core - Domain entities, services, and traits.
//!
//! This crate holds the learning-goal domain: the goal collection store that
//! reconciles local state with the hosted table, the derived statistics, and
//! the events emitted after confirmed mutations. It is storage-agnostic and
//! defines traits that are implemented by the `storage-remote` crate.

pub mod constants;
pub mod errors;
pub mod events;
pub mod goals;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
