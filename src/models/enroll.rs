use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{SqliteExecutor, SqlitePool};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    AppError,
    grade::Grade,
    models::{
        Certificate, CourseInstance, PersonalAssignment, course_instance::instance_title,
    },
    permissions::Role,
};

const ENROLL_COLUMNS: &str = "id, course_instance_id, student_id, enrolled_at, is_course_finished";

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Enroll {
    pub id: Uuid,
    pub course_instance_id: Uuid,
    pub student_id: Uuid,

    pub enrolled_at: DateTime<Utc>,
    pub is_course_finished: bool,
}

/// Row of the staff enroll listing.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct EnrollSummary {
    pub id: Uuid,
    pub course_instance_id: Uuid,
    #[serde(skip)]
    sub_title: String,
    #[serde(skip)]
    course_title: String,
    #[sqlx(default)]
    pub instance_title: String,
    pub student_id: Uuid,
    pub student_email: String,
    pub enrolled_at: DateTime<Utc>,
    pub is_course_finished: bool,

    #[serde(skip)]
    #[sqlx(flatten)]
    grade: Grade,
    #[sqlx(default)]
    pub average_mark: f64,
}

impl fmt::Display for EnrollSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.instance_title, self.student_email)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FinishedEnroll {
    pub enroll: Enroll,
    pub average_mark: f64,
    pub certificate: Option<Certificate>,
}

impl Enroll {
    pub async fn find(db: impl SqliteExecutor<'_>, id: Uuid) -> Result<Self, AppError> {
        sqlx::query_as::<_, Self>(&format!("SELECT {ENROLL_COLUMNS} FROM enrolls WHERE id = ?"))
            .bind(id)
            .fetch_optional(db)
            .await?
            .ok_or(AppError::NotFound("enroll"))
    }

    pub async fn find_for(
        db: impl SqliteExecutor<'_>,
        course_instance_id: Uuid,
        student_id: Uuid,
    ) -> sqlx::Result<Option<Self>> {
        sqlx::query_as::<_, Self>(&format!(
            "SELECT {ENROLL_COLUMNS} FROM enrolls WHERE course_instance_id = ? AND student_id = ?"
        ))
        .bind(course_instance_id)
        .bind(student_id)
        .fetch_optional(db)
        .await
    }

    /// Enrolls the student and gives them a personal copy of every existing
    /// course assignment. An existing enroll is returned untouched.
    #[instrument(skip(db))]
    pub async fn get_or_create(
        db: &SqlitePool,
        course_instance_id: Uuid,
        student_id: Uuid,
    ) -> Result<(Self, bool), AppError> {
        let mut tx = db.begin().await?;

        let inserted = sqlx::query_as::<_, Self>(&format!(
            "INSERT INTO enrolls (id, course_instance_id, student_id, enrolled_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (course_instance_id, student_id) DO NOTHING
            RETURNING {ENROLL_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(course_instance_id)
        .bind(student_id)
        .bind(Utc::now())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(enroll) = inserted else {
            let existing = Self::find_for(&mut *tx, course_instance_id, student_id)
                .await?
                .ok_or(AppError::NotFound("enroll"))?;
            tx.commit().await?;
            return Ok((existing, false));
        };

        Role::Student.grant(&mut *tx, student_id).await?;

        let assignment_ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM course_assignments WHERE course_instance_id = ?",
        )
        .bind(course_instance_id)
        .fetch_all(&mut *tx)
        .await?;

        for assignment_id in &assignment_ids {
            PersonalAssignment::get_or_create(&mut *tx, *assignment_id, enroll.id).await?;
        }

        tx.commit().await?;

        info!(
            enroll_id = %enroll.id,
            personal_assignments = assignment_ids.len(),
            "student enrolled"
        );

        Ok((enroll, true))
    }

    /// Cascades to personal assignments, marks and the certificate.
    pub async fn delete_for(
        db: &SqlitePool,
        course_instance_id: Uuid,
        student_id: Uuid,
    ) -> Result<(), AppError> {
        let result =
            sqlx::query("DELETE FROM enrolls WHERE course_instance_id = ? AND student_id = ?")
                .bind(course_instance_id)
                .bind(student_id)
                .execute(db)
                .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("enroll"));
        }

        info!(%course_instance_id, %student_id, "student unenrolled");

        Ok(())
    }

    pub async fn grade(db: impl SqliteExecutor<'_>, id: Uuid) -> sqlx::Result<Grade> {
        sqlx::query_as::<_, Grade>(
            "SELECT COALESCE(SUM(m.value), 0) AS marks_total, COUNT(m.id) AS marks_count
            FROM personal_assignments pa
            JOIN marks m ON m.personal_assignment_id = pa.id
            WHERE pa.enroll_id = ?",
        )
        .bind(id)
        .fetch_one(db)
        .await
    }

    /// Staff listing with average marks; `search` matches the student's email.
    pub async fn summaries(db: &SqlitePool, search: Option<&str>) -> sqlx::Result<Vec<EnrollSummary>> {
        let pattern = super::like_pattern(search);

        let mut rows = sqlx::query_as::<_, EnrollSummary>(
            "SELECT e.id, e.course_instance_id, ci.sub_title, c.base_title AS course_title,
                e.student_id, u.email AS student_email, e.enrolled_at, e.is_course_finished,
                (SELECT COALESCE(SUM(m.value), 0) FROM personal_assignments pa
                    JOIN marks m ON m.personal_assignment_id = pa.id
                    WHERE pa.enroll_id = e.id) AS marks_total,
                (SELECT COUNT(m.id) FROM personal_assignments pa
                    JOIN marks m ON m.personal_assignment_id = pa.id
                    WHERE pa.enroll_id = e.id) AS marks_count
            FROM enrolls e
            JOIN course_instances ci ON ci.id = e.course_instance_id
            JOIN courses c ON c.id = ci.course_id
            JOIN users u ON u.id = e.student_id
            WHERE u.email LIKE ? ESCAPE '\\'
            ORDER BY e.enrolled_at DESC",
        )
        .bind(pattern)
        .fetch_all(db)
        .await?;

        for row in &mut rows {
            row.instance_title =
                instance_title(row.course_instance_id, &row.sub_title, &row.course_title);
            row.average_mark = row.grade.average();
        }

        Ok(rows)
    }

    /// Closes the course for the student. A certificate is issued when the
    /// average mark reaches the instance's minimum. Finishing twice is a no-op.
    #[instrument(skip(db))]
    pub async fn finish(db: &SqlitePool, id: Uuid) -> Result<FinishedEnroll, AppError> {
        let mut tx = db.begin().await?;

        let enroll = Self::find(&mut *tx, id).await?;
        let grade = Self::grade(&mut *tx, id).await?;

        if enroll.is_course_finished {
            let certificate = Certificate::for_enroll(&mut *tx, id).await?;
            tx.commit().await?;
            return Ok(FinishedEnroll {
                enroll,
                average_mark: grade.average(),
                certificate,
            });
        }

        let instance = CourseInstance::find(&mut *tx, enroll.course_instance_id).await?;

        let enroll = sqlx::query_as::<_, Self>(&format!(
            "UPDATE enrolls SET is_course_finished = 1 WHERE id = ? RETURNING {ENROLL_COLUMNS}"
        ))
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        let certificate = if grade.meets(instance.min_mark) {
            Some(Certificate::issue(&mut *tx, id, grade.average()).await?)
        } else {
            None
        };

        tx.commit().await?;

        info!(
            enroll_id = %id,
            average_mark = grade.average(),
            min_mark = instance.min_mark,
            certified = certificate.is_some(),
            "course finished"
        );

        Ok(FinishedEnroll {
            enroll,
            average_mark: grade.average(),
            certificate,
        })
    }
}
