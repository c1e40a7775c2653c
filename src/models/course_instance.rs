use chrono::NaiveDate;
use serde::Serialize;
use sqlx::{SqliteExecutor, SqlitePool};
use tracing::info;
use uuid::Uuid;

use crate::{
    AppError,
    forms::CourseInstanceForm,
    models::Course,
    slug::slugify,
};

const INSTANCE_COLUMNS: &str = "id, course_id, slug, sub_title, min_mark, start_date, end_date";

const SUMMARY_SELECT: &str = "SELECT ci.id, ci.slug, ci.sub_title, c.id AS course_id,
    c.base_title AS course_title, c.slug AS course_slug, ci.min_mark, ci.start_date, ci.end_date,
    (SELECT COUNT(*) FROM course_assignments ca WHERE ca.course_instance_id = ci.id) AS assignments_count
    FROM course_instances ci
    JOIN courses c ON c.id = ci.course_id";

/// One offered run of a [`Course`], with its own schedule and passing mark.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CourseInstance {
    pub id: Uuid,
    pub course_id: Uuid,

    pub slug: String,
    pub sub_title: String,
    pub min_mark: i16,

    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CourseInstanceSummary {
    pub id: Uuid,
    pub slug: String,
    pub sub_title: String,
    pub course_id: Uuid,
    pub course_title: String,
    pub course_slug: String,
    pub min_mark: i16,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub assignments_count: i64,
}

fn slug_conflict(err: sqlx::Error) -> AppError {
    match AppError::from(err) {
        AppError::Conflict(_) => AppError::conflict(
            "a course instance with this sub-title already exists, choose a different sub-title",
        ),
        other => other,
    }
}

/// `<course> - <id>` when the instance carries the course's own title.
pub(crate) fn instance_title(id: Uuid, sub_title: &str, base_title: &str) -> String {
    if sub_title == base_title {
        format!("{base_title} Course - {id}")
    } else {
        sub_title.to_owned()
    }
}

impl CourseInstance {
    #[must_use]
    pub fn display(&self, course: &Course) -> String {
        instance_title(self.id, &self.sub_title, &course.base_title)
    }

    pub async fn find(db: impl SqliteExecutor<'_>, id: Uuid) -> Result<Self, AppError> {
        sqlx::query_as::<_, Self>(&format!(
            "SELECT {INSTANCE_COLUMNS} FROM course_instances WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or(AppError::NotFound("course instance"))
    }

    pub async fn find_by_slugs(
        db: &SqlitePool,
        course_slug: &str,
        instance_slug: &str,
    ) -> Result<(Course, Self), AppError> {
        let course = Course::find_by_slug(db, course_slug).await?;

        let instance = sqlx::query_as::<_, Self>(&format!(
            "SELECT {INSTANCE_COLUMNS} FROM course_instances WHERE course_id = ? AND slug = ?"
        ))
        .bind(course.id)
        .bind(instance_slug)
        .fetch_optional(db)
        .await?
        .ok_or(AppError::NotFound("course instance"))?;

        Ok((course, instance))
    }

    pub async fn for_course(db: &SqlitePool, course_id: Uuid) -> sqlx::Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(&format!(
            "SELECT {INSTANCE_COLUMNS} FROM course_instances WHERE course_id = ?
            ORDER BY start_date IS NULL, start_date, sub_title"
        ))
        .bind(course_id)
        .fetch_all(db)
        .await
    }

    pub async fn enrolled_for_student(
        db: &SqlitePool,
        student_id: Uuid,
    ) -> sqlx::Result<Vec<CourseInstanceSummary>> {
        sqlx::query_as::<_, CourseInstanceSummary>(&format!(
            "{SUMMARY_SELECT}
            JOIN enrolls e ON e.course_instance_id = ci.id
            WHERE e.student_id = ?
            ORDER BY e.enrolled_at DESC"
        ))
        .bind(student_id)
        .fetch_all(db)
        .await
    }

    /// Staff listing; `search` matches the sub-title or the course title.
    pub async fn summaries(
        db: &SqlitePool,
        search: Option<&str>,
    ) -> sqlx::Result<Vec<CourseInstanceSummary>> {
        let pattern = super::like_pattern(search);

        sqlx::query_as::<_, CourseInstanceSummary>(&format!(
            "{SUMMARY_SELECT}
            WHERE ci.sub_title LIKE ?1 ESCAPE '\\' OR c.base_title LIKE ?1 ESCAPE '\\'
            ORDER BY c.base_title, ci.sub_title"
        ))
        .bind(pattern)
        .fetch_all(db)
        .await
    }

    /// An empty sub-title falls back to the course title; the slug follows the sub-title.
    pub async fn create(
        db: &SqlitePool,
        course: &Course,
        form: &CourseInstanceForm,
    ) -> Result<Self, AppError> {
        let sub_title = form.sub_title_or(&course.base_title);

        let instance = sqlx::query_as::<_, Self>(&format!(
            "INSERT INTO course_instances (id, course_id, slug, sub_title, min_mark, start_date, end_date)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING {INSTANCE_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(course.id)
        .bind(slugify(&sub_title))
        .bind(&sub_title)
        .bind(form.min_mark)
        .bind(form.start_date)
        .bind(form.end_date)
        .fetch_one(db)
        .await
        .map_err(slug_conflict)?;

        info!(course_instance_id = %instance.id, slug = %instance.slug, "course instance created");

        Ok(instance)
    }

    pub async fn update(
        db: &SqlitePool,
        id: Uuid,
        form: &CourseInstanceForm,
    ) -> Result<Self, AppError> {
        let current = Self::find(db, id).await?;
        let course = Course::find(db, current.course_id).await?;
        let sub_title = form.sub_title_or(&course.base_title);

        sqlx::query_as::<_, Self>(&format!(
            "UPDATE course_instances
            SET slug = ?, sub_title = ?, min_mark = ?, start_date = ?, end_date = ?
            WHERE id = ?
            RETURNING {INSTANCE_COLUMNS}"
        ))
        .bind(slugify(&sub_title))
        .bind(&sub_title)
        .bind(form.min_mark)
        .bind(form.start_date)
        .bind(form.end_date)
        .bind(id)
        .fetch_one(db)
        .await
        .map_err(slug_conflict)
    }

    pub async fn delete(db: &SqlitePool, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM course_instances WHERE id = ?")
            .bind(id)
            .execute(db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("course instance"));
        }

        info!(course_instance_id = %id, "course instance deleted");

        Ok(())
    }
}
