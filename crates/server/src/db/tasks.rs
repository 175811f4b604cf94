//! Tasks, per-user progress and reward claims.

use sqlx::PgPool;

use aizome_core::{TaskAction, TaskId, TransactionKind, UserId};

use super::{RepositoryError, wallet};
use crate::models::TaskProgress;

/// Result of claiming a task reward.
#[derive(Debug, Clone, serde::Serialize)]
pub struct TaskReward {
    pub task_id: TaskId,
    pub reward: i64,
    pub coins: i64,
}

/// Repository for task database operations.
pub struct TaskRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> TaskRepository<'a> {
    /// Create a new task repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Active tasks with the user's progress (zero when not started).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(
        &self,
        user: UserId,
    ) -> Result<Vec<TaskProgress>, RepositoryError> {
        let tasks = sqlx::query_as::<_, TaskProgress>(
            r"
            SELECT t.id, t.title, t.description, t.action, t.target_count, t.reward_coins,
                   COALESCE(ut.progress, 0) AS progress, ut.completed_at, ut.claimed_at
            FROM tasks t
            LEFT JOIN user_tasks ut ON ut.task_id = t.id AND ut.user_id = $1
            WHERE t.active
            ORDER BY t.action, t.target_count, t.title
            ",
        )
        .bind(user)
        .fetch_all(self.pool)
        .await?;
        Ok(tasks)
    }

    /// Count one occurrence of `action` toward every active task with it.
    ///
    /// Progress stops at the task's target, and `completed_at` is stamped
    /// when the target is first reached.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the upsert fails.
    pub async fn record(&self, user: UserId, action: TaskAction) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            r"
            INSERT INTO user_tasks (user_id, task_id, progress, completed_at)
            SELECT $1, t.id, 1, CASE WHEN t.target_count <= 1 THEN now() END
            FROM tasks t
            WHERE t.active AND t.action = $2
            ON CONFLICT (user_id, task_id) DO UPDATE SET
                progress = LEAST(user_tasks.progress + 1,
                                 (SELECT target_count FROM tasks WHERE id = user_tasks.task_id)),
                completed_at = COALESCE(
                    user_tasks.completed_at,
                    CASE WHEN user_tasks.progress + 1
                              >= (SELECT target_count FROM tasks WHERE id = user_tasks.task_id)
                         THEN now() END)
            WHERE user_tasks.completed_at IS NULL
            ",
        )
        .bind(user)
        .bind(action)
        .execute(self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Claim the reward of a completed task.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the task does not exist and
    /// `RepositoryError::Conflict` if it is not completed or already claimed.
    pub async fn claim(&self, user: UserId, task: TaskId) -> Result<TaskReward, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let reward: Option<i64> = sqlx::query_scalar(
            r"
            UPDATE user_tasks ut SET claimed_at = now()
            FROM tasks t
            WHERE t.id = ut.task_id AND ut.user_id = $1 AND ut.task_id = $2
              AND ut.completed_at IS NOT NULL AND ut.claimed_at IS NULL
            RETURNING t.reward_coins
            ",
        )
        .bind(user)
        .bind(task)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(reward) = reward else {
            let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM tasks WHERE id = $1)")
                .bind(task)
                .fetch_one(&mut *tx)
                .await?;
            return Err(if exists {
                RepositoryError::Conflict("task is not ready to claim".to_owned())
            } else {
                RepositoryError::NotFound
            });
        };

        let coins = wallet::credit(&mut tx, user, reward).await?;
        wallet::record(
            &mut tx,
            user,
            TransactionKind::TaskReward,
            reward,
            Some(task.as_uuid()),
            "Task reward",
        )
        .await?;

        tx.commit().await?;
        tracing::info!(task_id = %task, reward, "Task reward claimed");

        Ok(TaskReward {
            task_id: task,
            reward,
            coins,
        })
    }
}
