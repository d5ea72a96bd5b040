use async_trait::async_trait;
use log::debug;

use goalpath_core::errors::{Error, Result};
use goalpath_core::goals::{Goal, GoalInsert, GoalRepositoryTrait, GoalUpdate};

use super::model::{GoalPatch, GoalRow, NewGoalRow};
use crate::client::{eq, RestClient};
use crate::errors::StorageError;

/// Goals table reached through the hosted REST API.
pub struct RestGoalRepository {
    client: RestClient,
    table: String,
}

impl RestGoalRepository {
    pub fn new(client: RestClient) -> Self {
        let table = client.config().goals_table.clone();
        RestGoalRepository { client, table }
    }

    fn into_goals(rows: Vec<GoalRow>) -> Result<Vec<Goal>> {
        rows.into_iter().map(Goal::try_from).collect()
    }

    fn single(rows: Vec<GoalRow>, target: &str) -> Result<Goal> {
        match rows.into_iter().next() {
            Some(row) => Goal::try_from(row),
            None => Err(StorageError::NoRows(target.to_string()).into()),
        }
    }
}

#[async_trait]
impl GoalRepositoryTrait for RestGoalRepository {
    async fn list_goals(&self, owner_id: &str) -> Result<Vec<Goal>> {
        let rows: Vec<GoalRow> = self
            .client
            .select(
                &self.table,
                &[
                    ("select", "*".to_string()),
                    ("user_id", eq(owner_id)),
                    ("order", "created_at.desc".to_string()),
                ],
            )
            .await?;
        debug!("Fetched {} goal row(s)", rows.len());
        Self::into_goals(rows)
    }

    async fn insert_goal(&self, owner_id: &str, new_goal: GoalInsert) -> Result<Goal> {
        let body = NewGoalRow::new(owner_id, new_goal);
        let rows: Vec<GoalRow> = self.client.insert(&self.table, &body).await?;
        Self::single(rows, "inserted goal").map_err(|e| match e {
            // An insert that echoes nothing back was filtered by row policies.
            Error::NotFound(_) => Error::Unexpected("Insert returned no row".to_string()),
            other => other,
        })
    }

    async fn update_goal(&self, goal_id: &str, changes: GoalUpdate) -> Result<Goal> {
        let patch = GoalPatch::from(changes);
        let rows: Vec<GoalRow> = self
            .client
            .update(&self.table, &[("id", eq(goal_id))], &patch)
            .await?;
        Self::single(rows, goal_id)
    }

    async fn delete_goal(&self, goal_id: &str) -> Result<()> {
        let rows: Vec<GoalRow> = self
            .client
            .delete(&self.table, &[("id", eq(goal_id))])
            .await?;
        // Row policies hide rows instead of refusing the delete.
        if rows.is_empty() {
            return Err(StorageError::NoRows(goal_id.to_string()).into());
        }
        debug!("Deleted {} goal row(s)", rows.len());
        Ok(())
    }
}
