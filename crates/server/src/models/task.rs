//! Tasks and per-user progress.

use chrono::{DateTime, Utc};
use serde::Serialize;

use aizome_core::{TaskAction, TaskId};

/// A task joined with the caller's progress.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TaskProgress {
    pub id: TaskId,
    pub title: String,
    pub description: String,
    pub action: TaskAction,
    pub target_count: i32,
    pub reward_coins: i64,
    pub progress: i32,
    pub completed_at: Option<DateTime<Utc>>,
    pub claimed_at: Option<DateTime<Utc>>,
}

impl TaskProgress {
    /// Completed and not yet claimed.
    #[must_use]
    pub const fn is_claimable(&self) -> bool {
        self.completed_at.is_some() && self.claimed_at.is_none()
    }
}
