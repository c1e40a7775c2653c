use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{SqliteExecutor, SqlitePool};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{AppError, forms::AnswerForm};

/// A student's copy of a course assignment.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PersonalAssignment {
    pub id: Uuid,
    pub course_assignment_id: Uuid,
    pub enroll_id: Uuid,

    pub answer: Option<String>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub is_completed: bool,
}

/// A personal assignment as the student sees it: the shared task text comes
/// from the course assignment, the answer and the mark are the student's own.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PersonalAssignmentView {
    pub id: Uuid,
    pub course_assignment_id: Uuid,
    pub enroll_id: Uuid,
    pub course_instance_id: Uuid,
    pub student_id: Uuid,
    pub student_email: String,

    pub title: Option<String>,
    pub content: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub assignment_completed: bool,

    pub answer: Option<String>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub is_completed: bool,

    pub mark: Option<i16>,
    pub enroll_finished: bool,
}

const VIEW_SELECT: &str = "SELECT pa.id, pa.course_assignment_id, pa.enroll_id,
    e.course_instance_id, e.student_id, u.email AS student_email,
    ca.title, ca.content, ca.start_date, ca.end_date, ca.is_completed AS assignment_completed,
    pa.answer, pa.submitted_at, pa.is_completed,
    m.value AS mark, e.is_course_finished AS enroll_finished
    FROM personal_assignments pa
    JOIN course_assignments ca ON ca.id = pa.course_assignment_id
    JOIN enrolls e ON e.id = pa.enroll_id
    JOIN course_instances ci ON ci.id = e.course_instance_id
    JOIN users u ON u.id = e.student_id
    LEFT JOIN marks m ON m.personal_assignment_id = pa.id";

impl PersonalAssignmentView {
    /// Why an answer can no longer be submitted, if it can't.
    #[must_use]
    pub fn answer_closed(&self, now: DateTime<Utc>) -> Option<&'static str> {
        if self.enroll_finished {
            Some("the course is already finished")
        } else if self.is_completed || self.assignment_completed {
            Some("the assignment is completed")
        } else if self.end_date.is_some_and(|end| now > end) {
            Some("the assignment deadline has passed")
        } else {
            None
        }
    }
}

impl PersonalAssignment {
    /// Returns whether a row was inserted.
    pub async fn get_or_create(
        db: impl SqliteExecutor<'_>,
        course_assignment_id: Uuid,
        enroll_id: Uuid,
    ) -> sqlx::Result<bool> {
        let result = sqlx::query(
            "INSERT INTO personal_assignments (id, course_assignment_id, enroll_id)
            VALUES (?, ?, ?)
            ON CONFLICT (course_assignment_id, enroll_id) DO NOTHING",
        )
        .bind(Uuid::new_v4())
        .bind(course_assignment_id)
        .bind(enroll_id)
        .execute(db)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn find_view(
        db: impl SqliteExecutor<'_>,
        id: Uuid,
    ) -> Result<PersonalAssignmentView, AppError> {
        sqlx::query_as::<_, PersonalAssignmentView>(&format!("{VIEW_SELECT} WHERE pa.id = ?"))
            .bind(id)
            .fetch_optional(db)
            .await?
            .ok_or(AppError::NotFound("personal assignment"))
    }

    pub async fn for_enroll(
        db: &SqlitePool,
        enroll_id: Uuid,
    ) -> sqlx::Result<Vec<PersonalAssignmentView>> {
        sqlx::query_as::<_, PersonalAssignmentView>(&format!(
            "{VIEW_SELECT} WHERE pa.enroll_id = ?
            ORDER BY ca.is_completed, ca.end_date IS NULL, ca.end_date, ca.title"
        ))
        .bind(enroll_id)
        .fetch_all(db)
        .await
    }

    /// Staff listing; `search` matches the student's email or the instance sub-title.
    pub async fn list(
        db: &SqlitePool,
        search: Option<&str>,
    ) -> sqlx::Result<Vec<PersonalAssignmentView>> {
        let pattern = super::like_pattern(search);

        sqlx::query_as::<_, PersonalAssignmentView>(&format!(
            "{VIEW_SELECT}
            WHERE u.email LIKE ?1 ESCAPE '\\' OR ci.sub_title LIKE ?1 ESCAPE '\\'
            ORDER BY pa.is_completed, u.email, ca.title"
        ))
        .bind(pattern)
        .fetch_all(db)
        .await
    }

    /// Stores the student's answer. Someone else's assignment is reported as missing.
    #[instrument(skip(db, form))]
    pub async fn submit_answer(
        db: &SqlitePool,
        id: Uuid,
        student_id: Uuid,
        form: &AnswerForm,
        now: DateTime<Utc>,
    ) -> Result<PersonalAssignmentView, AppError> {
        let mut tx = db.begin().await?;

        let view = Self::find_view(&mut *tx, id).await?;
        if view.student_id != student_id {
            return Err(AppError::NotFound("personal assignment"));
        }
        if let Some(reason) = view.answer_closed(now) {
            return Err(AppError::conflict(reason));
        }

        sqlx::query("UPDATE personal_assignments SET answer = ?, submitted_at = ? WHERE id = ?")
            .bind(form.answer.trim())
            .bind(now)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let view = Self::find_view(&mut *tx, id).await?;

        tx.commit().await?;

        info!(personal_assignment_id = %id, "answer submitted");

        Ok(view)
    }
}
