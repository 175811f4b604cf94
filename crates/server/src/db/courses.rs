//! Courses, enrollments and comments. Only published courses are visible.

use sqlx::PgPool;

use aizome_core::{CommentId, CourseId, UserId};

use super::RepositoryError;
use crate::models::{Comment, Course, EnrolledCourse, Enrollment};

/// Repository for course database operations.
pub struct CourseRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CourseRepository<'a> {
    /// Create a new course repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// Published courses, optionally filtered by level and a title search.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_published(
        &self,
        level: Option<&str>,
        query: Option<&str>,
    ) -> Result<Vec<Course>, RepositoryError> {
        let pattern = query.map(|q| format!("%{}%", q.trim()));
        let courses = sqlx::query_as::<_, Course>(
            r"
            SELECT * FROM courses
            WHERE status = 'published'
              AND ($1::text IS NULL OR level = $1)
              AND ($2::text IS NULL OR title ILIKE $2 OR summary ILIKE $2)
            ORDER BY published_at DESC NULLS LAST, created_at DESC
            ",
        )
        .bind(level)
        .bind(pattern)
        .fetch_all(self.pool)
        .await?;
        Ok(courses)
    }

    /// A published course by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_published(&self, id: CourseId) -> Result<Option<Course>, RepositoryError> {
        let course = sqlx::query_as::<_, Course>(
            "SELECT * FROM courses WHERE id = $1 AND status = 'published'",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(course)
    }

    // =========================================================================
    // Enrollments
    // =========================================================================

    /// Enroll the user. Enrolling twice returns the existing enrollment.
    ///
    /// The flag is `true` when this call created the enrollment.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn enroll(
        &self,
        user: UserId,
        course: CourseId,
    ) -> Result<(Enrollment, bool), RepositoryError> {
        let inserted = sqlx::query_as::<_, Enrollment>(
            r"
            INSERT INTO course_enrollments (user_id, course_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, course_id) DO NOTHING
            RETURNING *
            ",
        )
        .bind(user)
        .bind(course)
        .fetch_optional(self.pool)
        .await?;

        if let Some(enrollment) = inserted {
            return Ok((enrollment, true));
        }

        let existing = self
            .enrollment(user, course)
            .await?
            .ok_or(RepositoryError::NotFound)?;
        Ok((existing, false))
    }

    /// The user's enrollment in a course.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn enrollment(
        &self,
        user: UserId,
        course: CourseId,
    ) -> Result<Option<Enrollment>, RepositoryError> {
        let enrollment = sqlx::query_as::<_, Enrollment>(
            "SELECT * FROM course_enrollments WHERE user_id = $1 AND course_id = $2",
        )
        .bind(user)
        .bind(course)
        .fetch_optional(self.pool)
        .await?;
        Ok(enrollment)
    }

    /// Courses the user is enrolled in, most recent first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn enrolled(&self, user: UserId) -> Result<Vec<EnrolledCourse>, RepositoryError> {
        let courses = sqlx::query_as::<_, EnrolledCourse>(
            r"
            SELECT c.*, e.progress, e.enrolled_at
            FROM course_enrollments e
            JOIN courses c ON c.id = e.course_id
            WHERE e.user_id = $1
            ORDER BY e.enrolled_at DESC
            ",
        )
        .bind(user)
        .fetch_all(self.pool)
        .await?;
        Ok(courses)
    }

    /// Set progress on an existing enrollment.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user is not enrolled.
    pub async fn set_progress(
        &self,
        user: UserId,
        course: CourseId,
        progress: i32,
    ) -> Result<Enrollment, RepositoryError> {
        sqlx::query_as::<_, Enrollment>(
            r"
            UPDATE course_enrollments SET progress = $3
            WHERE user_id = $1 AND course_id = $2
            RETURNING *
            ",
        )
        .bind(user)
        .bind(course)
        .bind(progress)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    // =========================================================================
    // Comments
    // =========================================================================

    /// Comments on a course, newest first, with author usernames.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn comments(&self, course: CourseId) -> Result<Vec<Comment>, RepositoryError> {
        let comments = sqlx::query_as::<_, Comment>(
            r"
            SELECT cc.id, cc.course_id, cc.user_id, cc.body,
                   pr.username AS author_name, cc.created_at
            FROM course_comments cc
            LEFT JOIN profiles pr ON pr.id = cc.user_id
            WHERE cc.course_id = $1
            ORDER BY cc.created_at DESC
            ",
        )
        .bind(course)
        .fetch_all(self.pool)
        .await?;
        Ok(comments)
    }

    /// Post a comment.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn add_comment(
        &self,
        course: CourseId,
        user: UserId,
        body: &str,
    ) -> Result<Comment, RepositoryError> {
        let comment = sqlx::query_as::<_, Comment>(
            r"
            WITH inserted AS (
                INSERT INTO course_comments (course_id, user_id, body)
                VALUES ($1, $2, $3)
                RETURNING *
            )
            SELECT i.id, i.course_id, i.user_id, i.body,
                   pr.username AS author_name, i.created_at
            FROM inserted i
            LEFT JOIN profiles pr ON pr.id = i.user_id
            ",
        )
        .bind(course)
        .bind(user)
        .bind(body)
        .fetch_one(self.pool)
        .await?;
        Ok(comment)
    }

    /// Author of a comment.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn comment_author(&self, id: CommentId) -> Result<Option<UserId>, RepositoryError> {
        let author = sqlx::query_scalar("SELECT user_id FROM course_comments WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(author)
    }

    /// Delete a comment.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if it is already gone.
    pub async fn delete_comment(&self, id: CommentId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM course_comments WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
