use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    AppError,
    forms::{AssignmentForm, blank_to_none},
    models::{CourseInstance, PersonalAssignment},
};

const ASSIGNMENT_COLUMNS: &str =
    "id, course_instance_id, title, content, start_date, end_date, is_completed";

/// An assignment given to every student of a course instance.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CourseAssignment {
    pub id: Uuid,
    pub course_instance_id: Uuid,

    pub title: Option<String>,
    pub content: Option<String>,

    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,

    pub is_completed: bool,
}

impl fmt::Display for CourseAssignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.title {
            Some(title) => f.write_str(title),
            None => write!(f, "Assignment - {}", self.id),
        }
    }
}

impl CourseAssignment {
    pub async fn find(db: &SqlitePool, id: Uuid) -> Result<Self, AppError> {
        sqlx::query_as::<_, Self>(&format!(
            "SELECT {ASSIGNMENT_COLUMNS} FROM course_assignments WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or(AppError::NotFound("course assignment"))
    }

    /// Open assignments first. `search` matches the instance sub-title or the
    /// course title.
    pub async fn list(
        db: &SqlitePool,
        course_instance_id: Option<Uuid>,
        search: Option<&str>,
    ) -> sqlx::Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT ca.id, ca.course_instance_id, ca.title, ca.content, ca.start_date,
                ca.end_date, ca.is_completed
            FROM course_assignments ca
            JOIN course_instances ci ON ci.id = ca.course_instance_id
            JOIN courses c ON c.id = ci.course_id
            WHERE (?1 IS NULL OR ca.course_instance_id = ?1)
                AND (ci.sub_title LIKE ?2 ESCAPE '\\' OR c.base_title LIKE ?2 ESCAPE '\\')
            ORDER BY ca.is_completed, ca.end_date IS NULL, ca.end_date, ca.title",
        )
        .bind(course_instance_id)
        .bind(super::like_pattern(search))
        .fetch_all(db)
        .await
    }

    /// Creates the assignment and a personal copy for every student already
    /// enrolled, all in one transaction.
    #[instrument(skip(db, form))]
    pub async fn create(
        db: &SqlitePool,
        course_instance_id: Uuid,
        form: &AssignmentForm,
    ) -> Result<Self, AppError> {
        let mut tx = db.begin().await?;

        CourseInstance::find(&mut *tx, course_instance_id).await?;

        let assignment = sqlx::query_as::<_, Self>(&format!(
            "INSERT INTO course_assignments
                (id, course_instance_id, title, content, start_date, end_date, is_completed)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING {ASSIGNMENT_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(course_instance_id)
        .bind(blank_to_none(form.title.as_deref()))
        .bind(blank_to_none(form.content.as_deref()))
        .bind(form.start_date)
        .bind(form.end_date)
        .bind(form.is_completed)
        .fetch_one(&mut *tx)
        .await?;

        let enroll_ids =
            sqlx::query_scalar::<_, Uuid>("SELECT id FROM enrolls WHERE course_instance_id = ?")
                .bind(course_instance_id)
                .fetch_all(&mut *tx)
                .await?;

        let mut created = 0_usize;
        for enroll_id in enroll_ids {
            if PersonalAssignment::get_or_create(&mut *tx, assignment.id, enroll_id).await? {
                created += 1;
            }
        }

        tx.commit().await?;

        info!(
            course_assignment_id = %assignment.id,
            personal_assignments = created,
            "course assignment created"
        );

        Ok(assignment)
    }

    /// Edits are visible to every student through their personal assignments.
    pub async fn update(db: &SqlitePool, id: Uuid, form: &AssignmentForm) -> Result<Self, AppError> {
        sqlx::query_as::<_, Self>(&format!(
            "UPDATE course_assignments
            SET title = ?, content = ?, start_date = ?, end_date = ?, is_completed = ?
            WHERE id = ?
            RETURNING {ASSIGNMENT_COLUMNS}"
        ))
        .bind(blank_to_none(form.title.as_deref()))
        .bind(blank_to_none(form.content.as_deref()))
        .bind(form.start_date)
        .bind(form.end_date)
        .bind(form.is_completed)
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or(AppError::NotFound("course assignment"))
    }
}
