use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{SqliteConnection, SqliteExecutor, SqlitePool};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    AppError, FieldErrors,
    forms::{check_email, check_username},
    models::{Address, Profile},
    password::{hash_password, verify_password},
};

const USER_COLUMNS: &str = "id, email, username, password_hash, date_joined, last_login, is_admin, is_active, is_staff, is_superuser";

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,

    pub email: String,
    pub username: String,
    #[serde(skip)]
    pub password_hash: String,

    pub date_joined: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,

    pub is_admin: bool,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.email)
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct Flags {
    is_admin: bool,
    is_staff: bool,
    is_superuser: bool,
}

/// Lowercases the domain part only; the local part is case sensitive.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    let email = email.trim();
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{local}@{}", domain.to_lowercase()),
        None => email.to_owned(),
    }
}

impl User {
    pub async fn find(db: impl SqliteExecutor<'_>, id: Uuid) -> sqlx::Result<Option<Self>> {
        sqlx::query_as::<_, Self>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
            .bind(id)
            .fetch_optional(db)
            .await
    }

    pub async fn find_by_email(db: &SqlitePool, email: &str) -> sqlx::Result<Option<Self>> {
        sqlx::query_as::<_, Self>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?"))
            .bind(normalize_email(email))
            .fetch_optional(db)
            .await
    }

    pub async fn create_user(
        db: &SqlitePool,
        email: &str,
        username: &str,
        password: &str,
    ) -> Result<Self, AppError> {
        Self::create_with(db, email, username, password, Flags::default()).await
    }

    pub async fn create_staffuser(
        db: &SqlitePool,
        email: &str,
        username: &str,
        password: &str,
    ) -> Result<Self, AppError> {
        let flags = Flags {
            is_staff: true,
            ..Flags::default()
        };
        Self::create_with(db, email, username, password, flags).await
    }

    pub async fn create_superuser(
        db: &SqlitePool,
        email: &str,
        username: &str,
        password: &str,
    ) -> Result<Self, AppError> {
        let flags = Flags {
            is_admin: true,
            is_staff: true,
            is_superuser: true,
        };
        Self::create_with(db, email, username, password, flags).await
    }

    /// Looks a user up by email and username; creates one when no such user exists.
    pub async fn get_or_create(
        db: &SqlitePool,
        email: &str,
        username: &str,
        password: &str,
    ) -> Result<(Self, bool), AppError> {
        let existing = sqlx::query_as::<_, Self>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = ? AND username = ?"
        ))
        .bind(normalize_email(email))
        .bind(username.trim())
        .fetch_optional(db)
        .await?;

        match existing {
            Some(user) => Ok((user, false)),
            None => Ok((Self::create_user(db, email, username, password).await?, true)),
        }
    }

    #[instrument(skip(db, password), fields(email = %email))]
    async fn create_with(
        db: &SqlitePool,
        email: &str,
        username: &str,
        password: &str,
        flags: Flags,
    ) -> Result<Self, AppError> {
        let mut errors = FieldErrors::new();
        check_email(&mut errors, "email", email);
        check_username(&mut errors, "username", username);
        errors.into_result()?;

        let password_hash = hash_password(password).await?;

        let mut tx = db.begin().await?;

        let user = sqlx::query_as::<_, Self>(&format!(
            "INSERT INTO users (id, email, username, password_hash, date_joined, is_admin, is_staff, is_superuser)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING {USER_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(normalize_email(email))
        .bind(username.trim())
        .bind(password_hash)
        .bind(Utc::now())
        .bind(flags.is_admin)
        .bind(flags.is_staff)
        .bind(flags.is_superuser)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match AppError::from(e) {
            AppError::Conflict(_) => {
                AppError::conflict("a user with this email or username already exists")
            }
            other => other,
        })?;

        let profile = Profile::create_for_user(&mut *tx, user.id).await?;
        Address::create_for_profile(&mut *tx, profile.id).await?;

        tx.commit().await?;

        info!(
            user_id = %user.id,
            is_staff = user.is_staff,
            is_superuser = user.is_superuser,
            "user created"
        );

        Ok(user)
    }

    /// Returns the active user matching the credentials and stamps `last_login`.
    pub async fn authenticate(
        db: &SqlitePool,
        email: &str,
        password: &str,
    ) -> Result<Option<Self>, AppError> {
        let Some(mut user) = Self::find_by_email(db, email).await? else {
            return Ok(None);
        };

        if !user.is_active || !verify_password(password, &user.password_hash).await? {
            return Ok(None);
        }

        let now = Utc::now();
        sqlx::query("UPDATE users SET last_login = ? WHERE id = ?")
            .bind(now)
            .bind(user.id)
            .execute(db)
            .await?;
        user.last_login = Some(now);

        Ok(Some(user))
    }

    pub async fn mark_staff(conn: &mut SqliteConnection, user_id: Uuid) -> sqlx::Result<()> {
        sqlx::query("UPDATE users SET is_staff = 1 WHERE id = ?")
            .bind(user_id)
            .execute(conn)
            .await?;

        Ok(())
    }
}
