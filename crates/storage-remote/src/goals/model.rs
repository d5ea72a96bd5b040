//! Wire models for the goals table.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use goalpath_core::errors::{Error, PersistenceError};
use goalpath_core::goals::{Goal, GoalCategory, GoalInsert, GoalStatus, GoalUpdate};

/// Row as returned by the REST API. Most columns are nullable in the hosted
/// schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalRow {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub progress_percentage: Option<i32>,
    #[serde(default)]
    pub target_date: Option<NaiveDate>,
    #[serde(default)]
    pub estimated_hours_per_week: Option<i32>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub streak: Option<i32>,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert body. `streak` is left to the column default.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewGoalRow {
    pub title: String,
    pub description: String,
    pub category: GoalCategory,
    pub target_date: NaiveDate,
    pub estimated_hours_per_week: i32,
    pub progress_percentage: i32,
    pub status: GoalStatus,
    pub user_id: String,
}

/// Partial update body; absent fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GoalPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<GoalCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_hours_per_week: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress_percentage: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<GoalStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub streak: Option<i32>,
}

// Conversion to domain models
impl TryFrom<GoalRow> for Goal {
    type Error = Error;

    fn try_from(row: GoalRow) -> Result<Self, Self::Error> {
        let status = match row.status.as_deref() {
            None => GoalStatus::Active,
            Some(raw) => raw.parse().map_err(|_| {
                Error::Persistence(PersistenceError::Decode(format!(
                    "Goal {} has unknown status '{}'",
                    row.id, raw
                )))
            })?,
        };

        Ok(Goal {
            id: row.id,
            title: row.title,
            description: row.description.unwrap_or_default(),
            category: row
                .category
                .as_deref()
                .map(GoalCategory::from_stored)
                .unwrap_or(GoalCategory::Other),
            target_date: row.target_date,
            hours_per_week: row.estimated_hours_per_week.unwrap_or(0),
            progress_percentage: row.progress_percentage.unwrap_or(0),
            status,
            streak: row.streak.unwrap_or(0),
            owner_id: row.user_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl NewGoalRow {
    pub fn new(owner_id: &str, goal: GoalInsert) -> Self {
        Self {
            title: goal.title,
            description: goal.description,
            category: goal.category,
            target_date: goal.target_date,
            estimated_hours_per_week: goal.hours_per_week,
            progress_percentage: goal.progress_percentage,
            status: goal.status,
            user_id: owner_id.to_string(),
        }
    }
}

impl From<GoalUpdate> for GoalPatch {
    fn from(update: GoalUpdate) -> Self {
        Self {
            title: update.title,
            description: update.description,
            category: update.category,
            target_date: update.target_date,
            estimated_hours_per_week: update.hours_per_week,
            progress_percentage: update.progress_percentage,
            status: update.status,
            streak: update.streak,
        }
    }
}
