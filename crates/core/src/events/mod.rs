//! Domain events module.
//!
//! Provides domain event types and the sink trait for emitting events after
//! the goal store reconciles a change. Presentation layers either poll the
//! store snapshot or subscribe through a [`BroadcastEventSink`].

mod domain_event;
mod sink;

pub use domain_event::*;
pub use sink::*;
