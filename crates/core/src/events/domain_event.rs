//! Domain event types.

use serde::{Deserialize, Serialize};

use crate::goals::GoalStatus;

/// Domain events emitted by the goal store after the remote store confirmed
/// a change (or a load failed).
///
/// Presentation layers subscribe to these to know when to re-read the
/// snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    /// The collection was replaced by a fresh load.
    GoalsLoaded { owner_id: String, count: usize },

    /// A load failed; the previous snapshot is still in place.
    GoalsLoadFailed { message: String },

    /// A goal was created and prepended to the collection.
    GoalCreated { goal_id: String },

    /// A goal was updated in place.
    GoalUpdated {
        goal_id: String,
        /// Fields sent to the remote store (camelCase names).
        changed_fields: Vec<String>,
    },

    /// A goal moved into the completed status.
    GoalCompleted {
        goal_id: String,
        previous_status: GoalStatus,
    },

    /// A goal was removed from the collection.
    GoalDeleted { goal_id: String },
}

impl DomainEvent {
    /// Creates a GoalsLoaded event.
    pub fn goals_loaded(owner_id: String, count: usize) -> Self {
        Self::GoalsLoaded { owner_id, count }
    }

    /// Creates a GoalsLoadFailed event.
    pub fn goals_load_failed(message: String) -> Self {
        Self::GoalsLoadFailed { message }
    }

    /// Creates a GoalCreated event.
    pub fn goal_created(goal_id: String) -> Self {
        Self::GoalCreated { goal_id }
    }

    /// Creates a GoalUpdated event.
    pub fn goal_updated(goal_id: String, changed_fields: Vec<String>) -> Self {
        Self::GoalUpdated {
            goal_id,
            changed_fields,
        }
    }

    /// Creates a GoalCompleted event.
    pub fn goal_completed(goal_id: String, previous_status: GoalStatus) -> Self {
        Self::GoalCompleted {
            goal_id,
            previous_status,
        }
    }

    /// Creates a GoalDeleted event.
    pub fn goal_deleted(goal_id: String) -> Self {
        Self::GoalDeleted { goal_id }
    }

    /// Id of the goal this event concerns, if it is about a single goal.
    pub fn goal_id(&self) -> Option<&str> {
        match self {
            Self::GoalCreated { goal_id }
            | Self::GoalUpdated { goal_id, .. }
            | Self::GoalCompleted { goal_id, .. }
            | Self::GoalDeleted { goal_id } => Some(goal_id),
            Self::GoalsLoaded { .. } | Self::GoalsLoadFailed { .. } => None,
        }
    }
}
