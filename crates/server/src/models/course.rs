//! Courses, enrollments and comments.

use chrono::{DateTime, Utc};
use serde::Serialize;

use aizome_core::{CommentId, CourseId, CourseStatus, Price, UserId};

/// A `courses` row.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Course {
    pub id: CourseId,
    pub title: String,
    pub summary: String,
    pub content: String,
    pub instructor: String,
    pub level: String,
    pub cover_url: Option<String>,
    pub price: Price,
    pub status: CourseStatus,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// A `course_enrollments` row.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Enrollment {
    pub user_id: UserId,
    pub course_id: CourseId,
    pub progress: i32,
    pub enrolled_at: DateTime<Utc>,
}

/// An enrollment joined with its course.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct EnrolledCourse {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub course: Course,
    pub progress: i32,
    pub enrolled_at: DateTime<Utc>,
}

/// A course comment with its author's public name.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Comment {
    pub id: CommentId,
    pub course_id: CourseId,
    pub user_id: UserId,
    pub body: String,
    pub author_name: Option<String>,
    pub created_at: DateTime<Utc>,
}
