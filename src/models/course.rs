use std::fmt;

use serde::Serialize;
use sqlx::{SqliteExecutor, SqlitePool};
use tracing::info;
use uuid::Uuid;

use crate::{AppError, forms::CourseForm};

const SHORT_DESCRIPTION_LENGTH: usize = 60;

/// A reusable course definition; offered through [`CourseInstance`](super::CourseInstance)s.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Course {
    pub id: Uuid,

    pub base_title: String,
    pub description: Option<String>,
    pub slug: String,
}

impl fmt::Display for Course {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} Course", self.base_title)
    }
}

/// Row of the staff course listing.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CourseSummary {
    pub id: Uuid,
    pub base_title: String,
    pub slug: String,
    #[sqlx(default)]
    pub short_description: String,
    #[serde(skip)]
    description: Option<String>,
    pub instances_count: i64,
}

#[must_use]
pub fn short_description(description: Option<&str>) -> String {
    description
        .unwrap_or_default()
        .chars()
        .take(SHORT_DESCRIPTION_LENGTH)
        .collect()
}

fn slug_conflict(err: sqlx::Error) -> AppError {
    match AppError::from(err) {
        AppError::Conflict(_) => AppError::conflict("a course with this title already exists"),
        other => other,
    }
}

impl Course {
    pub async fn all(db: &SqlitePool) -> sqlx::Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT id, base_title, description, slug FROM courses ORDER BY base_title",
        )
        .fetch_all(db)
        .await
    }

    pub async fn find(db: impl SqliteExecutor<'_>, id: Uuid) -> Result<Self, AppError> {
        sqlx::query_as::<_, Self>("SELECT id, base_title, description, slug FROM courses WHERE id = ?")
            .bind(id)
            .fetch_optional(db)
            .await?
            .ok_or(AppError::NotFound("course"))
    }

    pub async fn find_by_slug(db: &SqlitePool, slug: &str) -> Result<Self, AppError> {
        sqlx::query_as::<_, Self>(
            "SELECT id, base_title, description, slug FROM courses WHERE slug = ?",
        )
        .bind(slug)
        .fetch_optional(db)
        .await?
        .ok_or(AppError::NotFound("course"))
    }

    /// The slug is derived from the title. The form must already be validated.
    pub async fn create(db: &SqlitePool, form: &CourseForm) -> Result<Self, AppError> {
        let course = sqlx::query_as::<_, Self>(
            "INSERT INTO courses (id, base_title, description, slug) VALUES (?, ?, ?, ?)
            RETURNING id, base_title, description, slug",
        )
        .bind(Uuid::new_v4())
        .bind(form.base_title.trim())
        .bind(form.description())
        .bind(form.slug())
        .fetch_one(db)
        .await
        .map_err(slug_conflict)?;

        info!(course_id = %course.id, slug = %course.slug, "course created");

        Ok(course)
    }

    /// Re-derives the slug from the new title.
    pub async fn update(db: &SqlitePool, id: Uuid, form: &CourseForm) -> Result<Self, AppError> {
        sqlx::query_as::<_, Self>(
            "UPDATE courses SET base_title = ?, description = ?, slug = ? WHERE id = ?
            RETURNING id, base_title, description, slug",
        )
        .bind(form.base_title.trim())
        .bind(form.description())
        .bind(form.slug())
        .bind(id)
        .fetch_optional(db)
        .await
        .map_err(slug_conflict)?
        .ok_or(AppError::NotFound("course"))
    }

    /// Cascades to instances, enrolls and everything below them.
    pub async fn delete(db: &SqlitePool, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM courses WHERE id = ?")
            .bind(id)
            .execute(db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("course"));
        }

        info!(course_id = %id, "course deleted");

        Ok(())
    }

    /// Staff listing with instance counts; `search` matches the title.
    pub async fn summaries(db: &SqlitePool, search: Option<&str>) -> sqlx::Result<Vec<CourseSummary>> {
        let pattern = super::like_pattern(search);

        let mut rows = sqlx::query_as::<_, CourseSummary>(
            "SELECT c.id, c.base_title, c.slug, c.description,
                (SELECT COUNT(*) FROM course_instances ci WHERE ci.course_id = c.id) AS instances_count
            FROM courses c
            WHERE c.base_title LIKE ? ESCAPE '\\'
            ORDER BY c.base_title",
        )
        .bind(pattern)
        .fetch_all(db)
        .await?;

        for row in &mut rows {
            row.short_description = short_description(row.description.as_deref());
        }

        Ok(rows)
    }
}
