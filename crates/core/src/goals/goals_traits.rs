use crate::errors::Result;
use crate::goals::goals_model::{Goal, GoalInsert, GoalUpdate, NewGoal};
use crate::goals::goals_stats::GoalStats;
use crate::goals::goals_store::GoalSnapshot;
use async_trait::async_trait;

/// Contract of the hosted goals table.
///
/// Every call is authorized by the remote service against the signed-in user;
/// an implementation must surface row-level rejections as errors rather than
/// empty results where it can tell them apart.
#[async_trait]
pub trait GoalRepositoryTrait: Send + Sync {
    /// Lists the goals owned by `owner_id`, newest first.
    async fn list_goals(&self, owner_id: &str) -> Result<Vec<Goal>>;
    async fn insert_goal(&self, owner_id: &str, new_goal: GoalInsert) -> Result<Goal>;
    /// Applies a partial update. Returns `Error::NotFound` when no row
    /// matches `goal_id` under the caller's authorization scope.
    async fn update_goal(&self, goal_id: &str, changes: GoalUpdate) -> Result<Goal>;
    async fn delete_goal(&self, goal_id: &str) -> Result<()>;
}

/// Source of the currently authenticated user.
pub trait IdentityProviderTrait: Send + Sync {
    fn current_user_id(&self) -> Option<String>;
}

/// Commands and read model the goal store exposes to presentation layers.
#[async_trait]
pub trait GoalStoreTrait: Send + Sync {
    /// Replaces the collection with the signed-in user's goals.
    async fn load(&self) -> Result<Vec<Goal>>;
    async fn create_goal(&self, new_goal: NewGoal) -> Result<Goal>;
    async fn update_goal(&self, goal_id: &str, changes: GoalUpdate) -> Result<Goal>;
    async fn delete_goal(&self, goal_id: &str) -> Result<()>;
    /// Raises progress by `step`, capped at 100. Reaching 100 completes the goal.
    async fn increment_progress(&self, goal_id: &str, step: i32) -> Result<Goal>;
    /// `increment_progress` with the default step.
    async fn log_progress(&self, goal_id: &str) -> Result<Goal>;
    async fn pause_goal(&self, goal_id: &str) -> Result<Goal>;
    async fn resume_goal(&self, goal_id: &str) -> Result<Goal>;
    async fn complete_goal(&self, goal_id: &str) -> Result<Goal>;

    fn snapshot(&self) -> GoalSnapshot;
    fn goals(&self) -> Vec<Goal>;
    fn get_goal(&self, goal_id: &str) -> Option<Goal>;
    fn is_loading(&self) -> bool;
    fn is_mutating(&self) -> bool;
    fn error(&self) -> Option<String>;
    fn stats(&self) -> GoalStats;
    /// Forgets every cached goal, e.g. on sign-out.
    fn clear(&self);
}
