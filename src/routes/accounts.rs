use axum::{
    Json, Router,
    extract::State,
    routing::{get, put},
};
use serde::Serialize;

use crate::{
    AppError,
    auth::AuthUser,
    forms::{ProfileUpdateForm, Validate},
    models::{Address, Profile, User},
    permissions::Role,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/accounts/me", get(me))
        .route("/accounts/profile", put(update_profile))
}

#[derive(Serialize)]
struct Me {
    user: User,
    display_name: String,
    profile: Profile,
    address: Address,
    roles: Vec<Role>,
}

#[derive(Serialize)]
struct ProfileWithAddress {
    profile: Profile,
    address: Address,
}

async fn me(auth: AuthUser, State(state): State<AppState>) -> Result<Json<Me>, AppError> {
    let profile = Profile::for_user(&state.db_pool, auth.id).await?;
    let address = Address::for_profile(&state.db_pool, profile.id).await?;

    Ok(Json(Me {
        display_name: profile.to_string(),
        user: auth.user,
        profile,
        address,
        roles: auth.roles,
    }))
}

async fn update_profile(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(form): Json<ProfileUpdateForm>,
) -> Result<Json<ProfileWithAddress>, AppError> {
    form.validate()?;

    let (profile, address) = Profile::update_with_address(&state.db_pool, auth.id, &form).await?;

    Ok(Json(ProfileWithAddress { profile, address }))
}
