use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{AppError, models::PersonalAssignment};

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Mark {
    pub id: Uuid,
    pub personal_assignment_id: Uuid,
    pub value: i16,
    pub graded_by: Option<Uuid>,
    pub graded_at: DateTime<Utc>,
}

impl Mark {
    /// Grades a personal assignment, replacing an earlier mark, and completes it.
    #[instrument(skip(db))]
    pub async fn record(
        db: &SqlitePool,
        personal_assignment_id: Uuid,
        value: i16,
        graded_by: Uuid,
    ) -> Result<Self, AppError> {
        let mut tx = db.begin().await?;

        let view = PersonalAssignment::find_view(&mut *tx, personal_assignment_id).await?;
        if view.enroll_finished {
            return Err(AppError::conflict("the course is already finished"));
        }

        let mark = sqlx::query_as::<_, Self>(
            "INSERT INTO marks (id, personal_assignment_id, value, graded_by, graded_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT (personal_assignment_id) DO UPDATE
            SET value = excluded.value, graded_by = excluded.graded_by, graded_at = excluded.graded_at
            RETURNING id, personal_assignment_id, value, graded_by, graded_at",
        )
        .bind(Uuid::new_v4())
        .bind(personal_assignment_id)
        .bind(value)
        .bind(graded_by)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE personal_assignments SET is_completed = 1 WHERE id = ?")
            .bind(personal_assignment_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(%personal_assignment_id, value, "mark recorded");

        Ok(mark)
    }
}
