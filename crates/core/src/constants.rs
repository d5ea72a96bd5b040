/// Progress added by a single "log progress" action.
pub const DEFAULT_PROGRESS_STEP: i32 = 10;

/// Progress value at which a goal counts as completed.
pub const MAX_PROGRESS: i32 = 100;

pub const MIN_HOURS_PER_WEEK: i32 = 1;
pub const MAX_HOURS_PER_WEEK: i32 = 40;
