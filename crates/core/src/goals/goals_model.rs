//! Goals domain models.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{MAX_HOURS_PER_WEEK, MAX_PROGRESS, MIN_HOURS_PER_WEEK};
use crate::errors::{Result, ValidationError};

/// Learning area a goal belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GoalCategory {
    Programming,
    Design,
    Marketing,
    #[serde(rename = "Data Science")]
    DataScience,
    Business,
    Language,
    Music,
    Art,
    Science,
    Other,
}

impl GoalCategory {
    pub const ALL: [GoalCategory; 10] = [
        GoalCategory::Programming,
        GoalCategory::Design,
        GoalCategory::Marketing,
        GoalCategory::DataScience,
        GoalCategory::Business,
        GoalCategory::Language,
        GoalCategory::Music,
        GoalCategory::Art,
        GoalCategory::Science,
        GoalCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GoalCategory::Programming => "Programming",
            GoalCategory::Design => "Design",
            GoalCategory::Marketing => "Marketing",
            GoalCategory::DataScience => "Data Science",
            GoalCategory::Business => "Business",
            GoalCategory::Language => "Language",
            GoalCategory::Music => "Music",
            GoalCategory::Art => "Art",
            GoalCategory::Science => "Science",
            GoalCategory::Other => "Other",
        }
    }

    /// Maps a stored category label to a category, falling back to `Other`
    /// for labels outside the known set.
    pub fn from_stored(value: &str) -> Self {
        value.parse().unwrap_or(GoalCategory::Other)
    }
}

impl fmt::Display for GoalCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GoalCategory {
    type Err = ValidationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim();
        GoalCategory::ALL
            .iter()
            .copied()
            .find(|c| {
                c.as_str().eq_ignore_ascii_case(wanted)
                    || c.as_str().replace(' ', "").eq_ignore_ascii_case(wanted)
                    || c.as_str().replace(' ', "-").eq_ignore_ascii_case(wanted)
            })
            .ok_or_else(|| ValidationError::InvalidInput(format!("Unknown category '{}'", s)))
    }
}

/// Lifecycle status of a goal.
///
/// `Active` and `Paused` toggle freely; either may move to `Completed`, which
/// is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalStatus {
    #[default]
    Active,
    Paused,
    Completed,
}

impl GoalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalStatus::Active => "active",
            GoalStatus::Paused => "paused",
            GoalStatus::Completed => "completed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, GoalStatus::Completed)
    }

    pub fn can_transition_to(&self, next: GoalStatus) -> bool {
        !self.is_terminal() || next == GoalStatus::Completed
    }
}

impl fmt::Display for GoalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GoalStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(GoalStatus::Active),
            "paused" => Ok(GoalStatus::Paused),
            "completed" => Ok(GoalStatus::Completed),
            other => Err(ValidationError::InvalidInput(format!(
                "Unknown goal status '{}'",
                other
            ))),
        }
    }
}

/// Domain model representing a learning goal
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: GoalCategory,
    pub target_date: Option<NaiveDate>,
    pub hours_per_week: i32,
    pub progress_percentage: i32,
    pub status: GoalStatus,
    pub streak: i32,
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Goal {
    pub fn is_active(&self) -> bool {
        self.status == GoalStatus::Active
    }

    pub fn is_completed(&self) -> bool {
        self.status == GoalStatus::Completed
    }
}

/// Input model for creating a new goal.
///
/// Fields are optional so that incomplete form input can be represented;
/// [`NewGoal::validate`] rejects anything missing.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct NewGoal {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category: Option<GoalCategory>,
    pub target_date: Option<NaiveDate>,
    pub hours_per_week: Option<i32>,
}

impl NewGoal {
    /// Checks that every required field is present and in range, producing the
    /// payload sent to the remote store.
    pub fn validate(&self) -> Result<GoalInsert> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(ValidationError::MissingField("title".to_string()).into());
        }
        let description = self.description.trim();
        if description.is_empty() {
            return Err(ValidationError::MissingField("description".to_string()).into());
        }
        let category = self
            .category
            .ok_or_else(|| ValidationError::MissingField("category".to_string()))?;
        let target_date = self
            .target_date
            .ok_or_else(|| ValidationError::MissingField("targetDate".to_string()))?;
        let hours_per_week = self
            .hours_per_week
            .ok_or_else(|| ValidationError::MissingField("hoursPerWeek".to_string()))?;
        validate_hours(hours_per_week)?;

        Ok(GoalInsert {
            title: title.to_string(),
            description: description.to_string(),
            category,
            target_date,
            hours_per_week,
            progress_percentage: 0,
            status: GoalStatus::Active,
            streak: 0,
        })
    }

    /// Rejects target dates in the past. This is a boundary check for input
    /// forms; the store does not re-validate dates.
    pub fn validate_target_date(&self, today: NaiveDate) -> Result<()> {
        match self.target_date {
            Some(date) if date < today => Err(ValidationError::InvalidInput(format!(
                "Target date {} is earlier than {}",
                date, today
            ))
            .into()),
            _ => Ok(()),
        }
    }
}

/// Validated insert payload handed to the remote store.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GoalInsert {
    pub title: String,
    pub description: String,
    pub category: GoalCategory,
    pub target_date: NaiveDate,
    pub hours_per_week: i32,
    pub progress_percentage: i32,
    pub status: GoalStatus,
    pub streak: i32,
}

/// Partial update for a goal. Only fields set to `Some` are sent.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GoalUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<GoalCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hours_per_week: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress_percentage: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<GoalStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub streak: Option<i32>,
}

impl GoalUpdate {
    pub fn status(status: GoalStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn progress(progress_percentage: i32) -> Self {
        Self {
            progress_percentage: Some(progress_percentage),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == GoalUpdate::default()
    }

    /// Validates the supplied fields and applies the status rules against the
    /// goal being changed: a completed goal stays completed, and progress
    /// reaching 100 completes the goal.
    pub fn prepare_for(mut self, current: &Goal) -> Result<GoalUpdate> {
        if self.is_empty() {
            return Err(ValidationError::InvalidInput("Update contains no fields".to_string()).into());
        }
        if let Some(title) = self.title.as_mut() {
            let trimmed = title.trim();
            if trimmed.is_empty() {
                return Err(ValidationError::MissingField("title".to_string()).into());
            }
            *title = trimmed.to_string();
        }
        if let Some(hours) = self.hours_per_week {
            validate_hours(hours)?;
        }
        if let Some(progress) = self.progress_percentage {
            if !(0..=MAX_PROGRESS).contains(&progress) {
                return Err(ValidationError::out_of_range(
                    "progressPercentage",
                    0,
                    MAX_PROGRESS,
                    progress,
                )
                .into());
            }
        }
        if let Some(streak) = self.streak {
            if streak < 0 {
                return Err(ValidationError::InvalidInput(format!(
                    "Streak cannot be negative, got {}",
                    streak
                ))
                .into());
            }
        }

        if self.progress_percentage == Some(MAX_PROGRESS) {
            self.status = Some(GoalStatus::Completed);
        }

        if let Some(next) = self.status {
            if !current.status.can_transition_to(next) {
                return Err(ValidationError::InvalidStatusTransition {
                    from: current.status.to_string(),
                    to: next.to_string(),
                }
                .into());
            }
        }

        Ok(self)
    }

    /// camelCase names of the fields this update carries.
    pub fn field_names(&self) -> Vec<String> {
        let fields = [
            ("title", self.title.is_some()),
            ("description", self.description.is_some()),
            ("category", self.category.is_some()),
            ("targetDate", self.target_date.is_some()),
            ("hoursPerWeek", self.hours_per_week.is_some()),
            ("progressPercentage", self.progress_percentage.is_some()),
            ("status", self.status.is_some()),
            ("streak", self.streak.is_some()),
        ];
        fields
            .iter()
            .filter(|(_, present)| *present)
            .map(|(name, _)| name.to_string())
            .collect()
    }

    /// Overlays the supplied fields onto `goal`.
    #[cfg(test)]
    pub(crate) fn apply_to(&self, goal: &mut Goal) {
        if let Some(title) = &self.title {
            goal.title = title.clone();
        }
        if let Some(description) = &self.description {
            goal.description = description.clone();
        }
        if let Some(category) = self.category {
            goal.category = category;
        }
        if let Some(target_date) = self.target_date {
            goal.target_date = Some(target_date);
        }
        if let Some(hours) = self.hours_per_week {
            goal.hours_per_week = hours;
        }
        if let Some(progress) = self.progress_percentage {
            goal.progress_percentage = progress;
        }
        if let Some(status) = self.status {
            goal.status = status;
        }
        if let Some(streak) = self.streak {
            goal.streak = streak;
        }
    }
}

fn validate_hours(hours: i32) -> Result<()> {
    if !(MIN_HOURS_PER_WEEK..=MAX_HOURS_PER_WEEK).contains(&hours) {
        return Err(ValidationError::out_of_range(
            "hoursPerWeek",
            MIN_HOURS_PER_WEEK,
            MAX_HOURS_PER_WEEK,
            hours,
        )
        .into());
    }
    Ok(())
}
