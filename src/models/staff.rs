use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::{AppError, models::User, permissions::Role};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, strum::Display)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StaffKind {
    Teacher,
    Manager,
}

impl StaffKind {
    #[must_use]
    pub const fn role(self) -> Role {
        match self {
            Self::Teacher => Role::Teacher,
            Self::Manager => Role::Manager,
        }
    }

    const fn instances_table(self) -> &'static str {
        match self {
            Self::Teacher => "teacher_course_instances",
            Self::Manager => "manager_course_instances",
        }
    }
}

/// A teacher or manager record. Creating one turns the user into staff.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct StaffWorker {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: StaffKind,
    pub salary: Option<i64>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct StaffSummary {
    pub id: Uuid,
    pub kind: StaffKind,
    pub salary: Option<i64>,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl StaffWorker {
    pub async fn create(
        db: &SqlitePool,
        user_id: Uuid,
        kind: StaffKind,
        salary: Option<i64>,
    ) -> Result<Self, AppError> {
        let mut tx = db.begin().await?;

        if User::find(&mut *tx, user_id).await?.is_none() {
            return Err(AppError::NotFound("user"));
        }

        let staff = sqlx::query_as::<_, Self>(
            "INSERT INTO staff_workers (id, user_id, kind, salary) VALUES (?, ?, ?, ?)
            RETURNING id, user_id, kind, salary",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(kind)
        .bind(salary)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match AppError::from(e) {
            AppError::Conflict(_) => AppError::conflict(format!("user is already a {kind}")),
            other => other,
        })?;

        User::mark_staff(&mut tx, user_id).await?;
        kind.role().grant(&mut *tx, user_id).await?;

        tx.commit().await?;

        info!(staff_id = %staff.id, %user_id, %kind, "staff worker created");

        Ok(staff)
    }

    pub async fn find(db: &SqlitePool, id: Uuid, kind: StaffKind) -> Result<Self, AppError> {
        sqlx::query_as::<_, Self>(
            "SELECT id, user_id, kind, salary FROM staff_workers WHERE id = ? AND kind = ?",
        )
        .bind(id)
        .bind(kind)
        .fetch_optional(db)
        .await?
        .ok_or(AppError::NotFound("staff worker"))
    }

    pub async fn list(db: &SqlitePool, kind: StaffKind) -> sqlx::Result<Vec<StaffSummary>> {
        sqlx::query_as::<_, StaffSummary>(
            "SELECT s.id, s.kind, s.salary, u.email, p.first_name, p.last_name
            FROM staff_workers s
            JOIN users u ON u.id = s.user_id
            JOIN profiles p ON p.user_id = u.id
            WHERE s.kind = ?
            ORDER BY u.email",
        )
        .bind(kind)
        .fetch_all(db)
        .await
    }

    /// Idempotent.
    pub async fn supervise_instance(&self, db: &SqlitePool, course_instance_id: Uuid) -> sqlx::Result<()> {
        sqlx::query(&format!(
            "INSERT INTO {} (staff_id, course_instance_id) VALUES (?, ?) ON CONFLICT DO NOTHING",
            self.kind.instances_table()
        ))
        .bind(self.id)
        .bind(course_instance_id)
        .execute(db)
        .await?;

        Ok(())
    }

    /// Returns whether a link was removed.
    pub async fn release_instance(&self, db: &SqlitePool, course_instance_id: Uuid) -> sqlx::Result<bool> {
        let result = sqlx::query(&format!(
            "DELETE FROM {} WHERE staff_id = ? AND course_instance_id = ?",
            self.kind.instances_table()
        ))
        .bind(self.id)
        .bind(course_instance_id)
        .execute(db)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn supervise_course(&self, db: &SqlitePool, course_id: Uuid) -> Result<(), AppError> {
        if self.kind != StaffKind::Manager {
            return Err(AppError::conflict("only managers supervise whole courses"));
        }

        sqlx::query(
            "INSERT INTO manager_courses (staff_id, course_id) VALUES (?, ?) ON CONFLICT DO NOTHING",
        )
        .bind(self.id)
        .bind(course_id)
        .execute(db)
        .await?;

        Ok(())
    }

    pub async fn release_course(&self, db: &SqlitePool, course_id: Uuid) -> sqlx::Result<bool> {
        let result = sqlx::query("DELETE FROM manager_courses WHERE staff_id = ? AND course_id = ?")
            .bind(self.id)
            .bind(course_id)
            .execute(db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
