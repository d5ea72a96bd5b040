//! Aggregates computed from a goal collection snapshot.
//!
//! Every function here is total: an empty slice yields zeros and an empty
//! histogram rather than an error.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::goals_model::{Goal, GoalCategory, GoalStatus};

/// Dashboard summary of a goal collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalStats {
    pub total_goals: usize,
    pub active_count: usize,
    pub paused_count: usize,
    pub completed_count: usize,
    pub total_weekly_hours: i64,
    pub average_progress: f64,
    pub best_streak: i32,
    pub category_histogram: BTreeMap<GoalCategory, usize>,
}

impl GoalStats {
    pub fn from_goals(goals: &[Goal]) -> Self {
        GoalStats {
            total_goals: goals.len(),
            active_count: active_count(goals),
            paused_count: paused_count(goals),
            completed_count: completed_count(goals),
            total_weekly_hours: total_weekly_hours(goals),
            average_progress: average_progress(goals),
            best_streak: best_streak(goals),
            category_histogram: category_histogram(goals),
        }
    }
}

fn count_with_status(goals: &[Goal], status: GoalStatus) -> usize {
    goals.iter().filter(|g| g.status == status).count()
}

pub fn active_count(goals: &[Goal]) -> usize {
    count_with_status(goals, GoalStatus::Active)
}

pub fn paused_count(goals: &[Goal]) -> usize {
    count_with_status(goals, GoalStatus::Paused)
}

pub fn completed_count(goals: &[Goal]) -> usize {
    count_with_status(goals, GoalStatus::Completed)
}

/// Weekly hours committed across active goals. Paused and completed goals
/// don't count.
pub fn total_weekly_hours(goals: &[Goal]) -> i64 {
    goals
        .iter()
        .filter(|g| g.is_active())
        .map(|g| i64::from(g.hours_per_week))
        .sum()
}

/// Mean progress of active goals, or 0 when nothing is active.
pub fn average_progress(goals: &[Goal]) -> f64 {
    let (sum, count) = goals
        .iter()
        .filter(|g| g.is_active())
        .fold((0i64, 0usize), |(sum, count), g| {
            (sum + i64::from(g.progress_percentage), count + 1)
        });
    if count == 0 {
        return 0.0;
    }
    sum as f64 / count as f64
}

pub fn best_streak(goals: &[Goal]) -> i32 {
    goals.iter().map(|g| g.streak).max().unwrap_or(0)
}

/// Goal count per category, regardless of status.
pub fn category_histogram(goals: &[Goal]) -> BTreeMap<GoalCategory, usize> {
    let mut histogram = BTreeMap::new();
    for goal in goals {
        *histogram.entry(goal.category).or_insert(0) += 1;
    }
    histogram
}
