use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use serde_json::{json, Value};

use goalpath_core::goals::{GoalCategory, GoalStatus, GoalStoreTrait, GoalUpdate, NewGoal};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser, Debug)]
#[command(name = "goalpath", version = VERSION, about = "Track learning goals", propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List goals, newest first.
    #[command(alias = "ls")]
    List {
        #[arg(long)]
        status: Option<GoalStatus>,
    },
    /// Show derived statistics.
    #[command(alias = "stat")]
    Stats,
    /// Create a new goal.
    #[command(alias = "add")]
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        category: GoalCategory,
        #[arg(long)]
        target_date: NaiveDate,
        #[arg(long)]
        hours: i32,
    },
    /// Change fields of an existing goal.
    Update {
        goal_id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        category: Option<GoalCategory>,
        #[arg(long)]
        target_date: Option<NaiveDate>,
        #[arg(long)]
        hours: Option<i32>,
        #[arg(long)]
        progress: Option<i32>,
        #[arg(long)]
        status: Option<GoalStatus>,
        #[arg(long)]
        streak: Option<i32>,
    },
    /// Log progress on a goal (10 points unless --step is given).
    #[command(alias = "log")]
    Progress {
        goal_id: String,
        #[arg(long)]
        step: Option<i32>,
    },
    Pause {
        goal_id: String,
    },
    Resume {
        goal_id: String,
    },
    #[command(alias = "done")]
    Complete {
        goal_id: String,
    },
    #[command(alias = "rm")]
    Delete {
        goal_id: String,
    },
}

/// Runs one command against a loaded store and returns its JSON output.
pub async fn run(store: &dyn GoalStoreTrait, command: Commands) -> anyhow::Result<Value> {
    let output = match command {
        Commands::List { status } => {
            let goals: Vec<_> = store
                .goals()
                .into_iter()
                .filter(|g| status.map_or(true, |s| g.status == s))
                .collect();
            serde_json::to_value(goals)?
        }
        Commands::Stats => serde_json::to_value(store.stats())?,
        Commands::Create {
            title,
            description,
            category,
            target_date,
            hours,
        } => {
            let new_goal = NewGoal {
                title,
                description,
                category: Some(category),
                target_date: Some(target_date),
                hours_per_week: Some(hours),
            };
            new_goal.validate_target_date(Local::now().date_naive())?;
            serde_json::to_value(store.create_goal(new_goal).await?)?
        }
        Commands::Update {
            goal_id,
            title,
            description,
            category,
            target_date,
            hours,
            progress,
            status,
            streak,
        } => {
            let changes = GoalUpdate {
                title,
                description,
                category,
                target_date,
                hours_per_week: hours,
                progress_percentage: progress,
                status,
                streak,
            };
            serde_json::to_value(store.update_goal(&goal_id, changes).await?)?
        }
        Commands::Progress { goal_id, step } => {
            let goal = match step {
                Some(step) => store.increment_progress(&goal_id, step).await?,
                None => store.log_progress(&goal_id).await?,
            };
            serde_json::to_value(goal)?
        }
        Commands::Pause { goal_id } => serde_json::to_value(store.pause_goal(&goal_id).await?)?,
        Commands::Resume { goal_id } => serde_json::to_value(store.resume_goal(&goal_id).await?)?,
        Commands::Complete { goal_id } => {
            serde_json::to_value(store.complete_goal(&goal_id).await?)?
        }
        Commands::Delete { goal_id } => {
            store.delete_goal(&goal_id).await?;
            json!({ "deleted": goal_id })
        }
    };
    Ok(output)
}
