use chrono::{DateTime, Utc};
use nanoid::nanoid;
use serde::Serialize;
use sqlx::{SqliteExecutor, SqlitePool};
use tracing::info;
use uuid::Uuid;

use crate::AppError;

pub const CODE_LENGTH: usize = 12;

// No visually ambiguous characters (I, O, l, 0, 1).
pub const CODE_ALPHABET: &[char; 55] = &[
    '2', '3', '4', '5', '6', '7', '8', '9', 'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'J', 'K', 'L',
    'M', 'N', 'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z', 'a', 'b', 'c', 'd', 'e', 'f',
    'g', 'h', 'j', 'k', 'm', 'n', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z',
];

const CERTIFICATE_COLUMNS: &str = "id, enroll_id, code, final_mark, issued_at";

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Certificate {
    pub id: Uuid,
    pub enroll_id: Uuid,
    pub code: String,
    pub final_mark: f64,
    pub issued_at: DateTime<Utc>,
}

/// Everything printed on a certificate.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CertificateDetails {
    pub code: String,
    pub final_mark: f64,
    pub issued_at: DateTime<Utc>,

    pub student_email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,

    pub course_title: String,
    pub course_description: Option<String>,
    pub instance_title: String,
}

impl CertificateDetails {
    #[must_use]
    pub fn student_name(&self) -> String {
        match (self.first_name.as_deref(), self.last_name.as_deref()) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            (Some(name), None) | (None, Some(name)) => name.to_owned(),
            (None, None) => self.student_email.clone(),
        }
    }
}

const DETAILS_SELECT: &str = "SELECT cert.code, cert.final_mark, cert.issued_at,
    u.email AS student_email, p.first_name, p.last_name,
    c.base_title AS course_title, c.description AS course_description,
    ci.sub_title AS instance_title
    FROM certificates cert
    JOIN enrolls e ON e.id = cert.enroll_id
    JOIN users u ON u.id = e.student_id
    JOIN profiles p ON p.user_id = u.id
    JOIN course_instances ci ON ci.id = e.course_instance_id
    JOIN courses c ON c.id = ci.course_id";

#[must_use]
pub fn generate_code() -> String {
    nanoid!(CODE_LENGTH, CODE_ALPHABET)
}

impl Certificate {
    pub async fn issue(
        db: impl SqliteExecutor<'_>,
        enroll_id: Uuid,
        final_mark: f64,
    ) -> sqlx::Result<Self> {
        let certificate = sqlx::query_as::<_, Self>(&format!(
            "INSERT INTO certificates (id, enroll_id, code, final_mark, issued_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING {CERTIFICATE_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(enroll_id)
        .bind(generate_code())
        .bind(final_mark)
        .bind(Utc::now())
        .fetch_one(db)
        .await?;

        info!(%enroll_id, code = %certificate.code, final_mark, "certificate issued");

        Ok(certificate)
    }

    pub async fn for_enroll(
        db: impl SqliteExecutor<'_>,
        enroll_id: Uuid,
    ) -> sqlx::Result<Option<Self>> {
        sqlx::query_as::<_, Self>(&format!(
            "SELECT {CERTIFICATE_COLUMNS} FROM certificates WHERE enroll_id = ?"
        ))
        .bind(enroll_id)
        .fetch_optional(db)
        .await
    }

    pub async fn find_by_code(db: &SqlitePool, code: &str) -> Result<CertificateDetails, AppError> {
        sqlx::query_as::<_, CertificateDetails>(&format!("{DETAILS_SELECT} WHERE cert.code = ?"))
            .bind(code)
            .fetch_optional(db)
            .await?
            .ok_or(AppError::NotFound("certificate"))
    }

    pub async fn for_student(
        db: &SqlitePool,
        student_id: Uuid,
    ) -> sqlx::Result<Vec<CertificateDetails>> {
        sqlx::query_as::<_, CertificateDetails>(&format!(
            "{DETAILS_SELECT} WHERE e.student_id = ? ORDER BY cert.issued_at DESC"
        ))
        .bind(student_id)
        .fetch_all(db)
        .await
    }
}
