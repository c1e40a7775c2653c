use std::ops::Deref;

use axum::{
    Json, Router,
    extract::{FromRequestParts, State},
    http::{StatusCode, request::Parts},
    routing::post,
};
use sqlx::SqlitePool;
use tower_sessions::Session;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    AppError,
    forms::{LoginForm, RegistrationForm},
    models::User,
    permissions::{Permission, Role, has_perm, within_scope},
    state::AppState,
};

const USER_ID_KEY: &str = "user_id";

/// The logged-in, active user together with their roles.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user: User,
    pub roles: Vec<Role>,
}

impl Deref for AuthUser {
    type Target = User;

    fn deref(&self) -> &Self::Target {
        &self.user
    }
}

impl AuthUser {
    #[must_use]
    pub fn has_perm(&self, permission: Permission) -> bool {
        has_perm(self.user.is_superuser, &self.roles, permission)
    }

    pub fn require(&self, permission: Permission) -> Result<(), AppError> {
        if self.has_perm(permission) {
            Ok(())
        } else {
            Err(AppError::forbidden(format!("missing permission: {permission}")))
        }
    }

    /// Like [`require`](Self::require), and the user must also supervise the
    /// course instance, directly or through its course.
    pub async fn require_on_instance(
        &self,
        db: &SqlitePool,
        permission: Permission,
        course_instance_id: Uuid,
    ) -> Result<(), AppError> {
        self.require(permission)?;

        if self.user.is_superuser
            || within_scope(db, self.user.id, &self.roles, permission, course_instance_id).await?
        {
            return Ok(());
        }

        Err(AppError::forbidden("you do not supervise this course instance"))
    }

    pub fn require_superuser(&self) -> Result<(), AppError> {
        if self.user.is_superuser {
            Ok(())
        } else {
            Err(AppError::forbidden("superuser access required"))
        }
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|(_, message)| AppError::Internal(message.into()))?;

        let user_id = session
            .get::<Uuid>(USER_ID_KEY)
            .await?
            .ok_or(AppError::Unauthorized)?;

        let Some(user) = User::find(&state.db_pool, user_id).await? else {
            session.flush().await?;
            return Err(AppError::Unauthorized);
        };

        if !user.is_active {
            return Err(AppError::forbidden("this account is inactive"));
        }

        let roles = Role::for_user(&state.db_pool, user.id).await?;

        Ok(Self { user, roles })
    }
}

/// An [`AuthUser`] flagged as staff.
#[derive(Debug, Clone)]
pub struct StaffUser(pub AuthUser);

impl Deref for StaffUser {
    type Target = AuthUser;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequestParts<AppState> for StaffUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth = AuthUser::from_request_parts(parts, state).await?;

        if auth.user.is_staff || auth.user.is_superuser {
            Ok(Self(auth))
        } else {
            Err(AppError::forbidden("staff access required"))
        }
    }
}

async fn register(
    State(state): State<AppState>,
    Json(form): Json<RegistrationForm>,
) -> Result<(StatusCode, Json<User>), AppError> {
    form.errors(state.config.password_min_length).into_result()?;

    let user = User::create_user(&state.db_pool, &form.email, &form.username, &form.password1).await?;

    Ok((StatusCode::CREATED, Json(user)))
}

async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<LoginForm>,
) -> Result<Json<User>, AppError> {
    let Some(user) = User::authenticate(&state.db_pool, &form.email, &form.password).await? else {
        warn!(email = %form.email, "failed login");
        return Err(AppError::InvalidCredentials);
    };

    session.cycle_id().await?;
    session.insert(USER_ID_KEY, user.id).await?;

    info!(user_id = %user.id, "logged in");

    Ok(Json(user))
}

async fn logout(session: Session) -> Result<StatusCode, AppError> {
    session.flush().await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn auth_router() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
}
