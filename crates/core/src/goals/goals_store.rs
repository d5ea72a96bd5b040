use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};

use super::goals_model::{Goal, GoalStatus, GoalUpdate, NewGoal};
use super::goals_stats::GoalStats;
use super::goals_traits::{GoalRepositoryTrait, GoalStoreTrait, IdentityProviderTrait};
use crate::constants::{DEFAULT_PROGRESS_STEP, MAX_PROGRESS};
use crate::errors::{Error, Result, ValidationError};
use crate::events::{DomainEvent, DomainEventSink};

/// Read-only view of the store at a point in time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalSnapshot {
    pub goals: Vec<Goal>,
    pub loading: bool,
    pub mutating: bool,
    pub error: Option<String>,
}

#[derive(Default)]
struct StoreState {
    owner_id: Option<String>,
    goals: Vec<Goal>,
    pending_loads: usize,
    pending_mutations: usize,
    error: Option<String>,
}

#[derive(Clone, Copy)]
enum Pending {
    Load,
    Mutation,
}

/// Keeps an in-flight counter raised for as long as a remote call is
/// outstanding, including when the caller drops the future.
struct PendingGuard<'a> {
    state: &'a RwLock<StoreState>,
    kind: Pending,
}

impl<'a> PendingGuard<'a> {
    fn begin(state: &'a RwLock<StoreState>, kind: Pending) -> Self {
        {
            let mut s = state.write().unwrap_or_else(PoisonError::into_inner);
            match kind {
                Pending::Load => s.pending_loads += 1,
                Pending::Mutation => s.pending_mutations += 1,
            }
        }
        PendingGuard { state, kind }
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        let mut s = self.state.write().unwrap_or_else(PoisonError::into_inner);
        match self.kind {
            Pending::Load => s.pending_loads = s.pending_loads.saturating_sub(1),
            Pending::Mutation => s.pending_mutations = s.pending_mutations.saturating_sub(1),
        }
    }
}

/// Single source of truth for the signed-in user's goals.
///
/// Every mutation goes to the remote store first; the in-memory collection is
/// only changed once the remote store has confirmed the write.
pub struct GoalStore {
    repository: Arc<dyn GoalRepositoryTrait>,
    identity: Arc<dyn IdentityProviderTrait>,
    event_sink: Arc<dyn DomainEventSink>,
    state: RwLock<StoreState>,
}

impl GoalStore {
    pub fn new(
        repository: Arc<dyn GoalRepositoryTrait>,
        identity: Arc<dyn IdentityProviderTrait>,
        event_sink: Arc<dyn DomainEventSink>,
    ) -> Self {
        GoalStore {
            repository,
            identity,
            event_sink,
            state: RwLock::new(StoreState::default()),
        }
    }

    fn read_state(&self) -> RwLockReadGuard<'_, StoreState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Resolves the current user. Goals held for a different user (after a
    /// sign-out/sign-in) are dropped here.
    fn current_owner(&self) -> Result<String> {
        let Some(user_id) = self.identity.current_user_id() else {
            let mut state = self.write_state();
            if state.owner_id.take().is_some() {
                info!("User signed out, dropping cached goals");
                state.goals.clear();
            }
            return Err(Error::NotAuthenticated);
        };

        let mut state = self.write_state();
        if state.owner_id.as_deref() != Some(user_id.as_str()) {
            if state.owner_id.is_some() {
                info!("Signed-in user changed, dropping cached goals");
            }
            state.goals.clear();
            state.error = None;
            state.owner_id = Some(user_id.clone());
        }
        Ok(user_id)
    }

    fn tracked_goal(&self, goal_id: &str) -> Result<Goal> {
        self.read_state()
            .goals
            .iter()
            .find(|g| g.id == goal_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(goal_id.to_string()))
    }

    fn record_load_failure(&self, err: &Error) {
        let message = err.to_string();
        self.write_state().error = Some(message.clone());
        self.event_sink.emit(DomainEvent::goals_load_failed(message));
    }

    /// Drops rows that belong to someone else and orders newest first.
    fn reconcile_loaded(owner_id: &str, goals: Vec<Goal>) -> Vec<Goal> {
        let total = goals.len();
        let mut owned: Vec<Goal> = goals.into_iter().filter(|g| g.owner_id == owner_id).collect();
        if owned.len() != total {
            warn!(
                "Ignored {} goal(s) not owned by the signed-in user",
                total - owned.len()
            );
        }
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        owned
    }

    /// Sends `changes` for a goal that is known to be tracked.
    async fn apply_update(&self, current: Goal, changes: GoalUpdate) -> Result<Goal> {
        let changes = changes.prepare_for(&current)?;
        let changed_fields = changes.field_names();
        debug!("Updating goal {} fields {:?}", current.id, changed_fields);

        let updated = {
            let _pending = PendingGuard::begin(&self.state, Pending::Mutation);
            self.repository
                .update_goal(&current.id, changes)
                .await
                .inspect_err(|e| warn!("Failed to update goal {}: {}", current.id, e))?
        };

        {
            let mut state = self.write_state();
            match state.goals.iter_mut().find(|g| g.id == updated.id) {
                Some(entry) => *entry = updated.clone(),
                None => debug!("Goal {} left the collection during update", updated.id),
            }
        }

        self.event_sink.emit(DomainEvent::goal_updated(
            updated.id.clone(),
            changed_fields,
        ));
        if !current.is_completed() && updated.is_completed() {
            info!("Goal {} completed", updated.id);
            self.event_sink.emit(DomainEvent::goal_completed(
                updated.id.clone(),
                current.status,
            ));
        }
        Ok(updated)
    }

    async fn set_status(&self, goal_id: &str, status: GoalStatus) -> Result<Goal> {
        self.update_goal(goal_id, GoalUpdate::status(status)).await
    }
}

#[async_trait]
impl GoalStoreTrait for GoalStore {
    async fn load(&self) -> Result<Vec<Goal>> {
        let owner_id = match self.current_owner() {
            Ok(id) => id,
            Err(e) => {
                warn!("Cannot load goals: {}", e);
                self.record_load_failure(&e);
                return Err(e);
            }
        };

        debug!("Loading goals for user {}", owner_id);
        let result = {
            let _pending = PendingGuard::begin(&self.state, Pending::Load);
            self.repository.list_goals(&owner_id).await
        };

        match result {
            Ok(goals) => {
                let goals = Self::reconcile_loaded(&owner_id, goals);
                {
                    let mut state = self.write_state();
                    if state.owner_id.as_deref() == Some(owner_id.as_str()) {
                        state.goals = goals.clone();
                        state.error = None;
                    }
                }
                debug!("Loaded {} goal(s)", goals.len());
                self.event_sink
                    .emit(DomainEvent::goals_loaded(owner_id, goals.len()));
                Ok(goals)
            }
            Err(e) => {
                error!("Error fetching goals: {}", e);
                self.record_load_failure(&e);
                Err(e)
            }
        }
    }

    async fn create_goal(&self, new_goal: NewGoal) -> Result<Goal> {
        let insert = new_goal.validate()?;
        let owner_id = self.current_owner()?;

        let created = {
            let _pending = PendingGuard::begin(&self.state, Pending::Mutation);
            self.repository
                .insert_goal(&owner_id, insert)
                .await
                .inspect_err(|e| warn!("Failed to create goal: {}", e))?
        };

        if created.owner_id != owner_id {
            error!(
                "Remote store returned goal {} for a different owner",
                created.id
            );
            return Err(Error::Unexpected(format!(
                "Created goal {} is not owned by the signed-in user",
                created.id
            )));
        }

        {
            let mut state = self.write_state();
            if state.owner_id.as_deref() != Some(owner_id.as_str()) {
                warn!(
                    "Signed-in user changed while goal {} was being created, not caching it",
                    created.id
                );
                return Ok(created);
            }
            state.goals.insert(0, created.clone());
        }
        debug!("Created goal {}", created.id);
        self.event_sink
            .emit(DomainEvent::goal_created(created.id.clone()));
        Ok(created)
    }

    async fn update_goal(&self, goal_id: &str, changes: GoalUpdate) -> Result<Goal> {
        self.current_owner()?;
        let current = self.tracked_goal(goal_id)?;
        self.apply_update(current, changes).await
    }

    async fn delete_goal(&self, goal_id: &str) -> Result<()> {
        self.current_owner()?;
        self.tracked_goal(goal_id)?;

        {
            let _pending = PendingGuard::begin(&self.state, Pending::Mutation);
            self.repository
                .delete_goal(goal_id)
                .await
                .inspect_err(|e| warn!("Failed to delete goal {}: {}", goal_id, e))?;
        }

        self.write_state().goals.retain(|g| g.id != goal_id);
        debug!("Deleted goal {}", goal_id);
        self.event_sink
            .emit(DomainEvent::goal_deleted(goal_id.to_string()));
        Ok(())
    }

    async fn increment_progress(&self, goal_id: &str, step: i32) -> Result<Goal> {
        if step <= 0 {
            return Err(ValidationError::InvalidInput(format!(
                "Progress step must be positive, got {}",
                step
            ))
            .into());
        }
        self.current_owner()?;
        let current = self.tracked_goal(goal_id)?;
        let progress = current
            .progress_percentage
            .saturating_add(step)
            .min(MAX_PROGRESS);
        self.apply_update(current, GoalUpdate::progress(progress))
            .await
    }

    async fn log_progress(&self, goal_id: &str) -> Result<Goal> {
        self.increment_progress(goal_id, DEFAULT_PROGRESS_STEP).await
    }

    async fn pause_goal(&self, goal_id: &str) -> Result<Goal> {
        self.set_status(goal_id, GoalStatus::Paused).await
    }

    async fn resume_goal(&self, goal_id: &str) -> Result<Goal> {
        self.set_status(goal_id, GoalStatus::Active).await
    }

    async fn complete_goal(&self, goal_id: &str) -> Result<Goal> {
        self.set_status(goal_id, GoalStatus::Completed).await
    }

    fn snapshot(&self) -> GoalSnapshot {
        let state = self.read_state();
        GoalSnapshot {
            goals: state.goals.clone(),
            loading: state.pending_loads > 0,
            mutating: state.pending_mutations > 0,
            error: state.error.clone(),
        }
    }

    fn goals(&self) -> Vec<Goal> {
        self.read_state().goals.clone()
    }

    fn get_goal(&self, goal_id: &str) -> Option<Goal> {
        self.tracked_goal(goal_id).ok()
    }

    fn is_loading(&self) -> bool {
        self.read_state().pending_loads > 0
    }

    fn is_mutating(&self) -> bool {
        self.read_state().pending_mutations > 0
    }

    fn error(&self) -> Option<String> {
        self.read_state().error.clone()
    }

    fn stats(&self) -> GoalStats {
        GoalStats::from_goals(&self.read_state().goals)
    }

    fn clear(&self) {
        let mut state = self.write_state();
        state.owner_id = None;
        state.goals.clear();
        state.error = None;
    }
}
