use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
};
use uuid::Uuid;

use crate::{
    AppError,
    auth::StaffUser,
    forms::{AssignmentForm, CourseInstanceForm, Validate},
    models::{CourseAssignment, CourseInstance, CourseInstanceSummary},
    permissions::Permission,
    routes::SearchQuery,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/manage/instances", get(list))
        .route("/manage/instances/{id}", put(update).delete(delete))
        .route("/manage/instances/{id}/assignments", post(create_assignment))
}

async fn list(
    _staff: StaffUser,
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<CourseInstanceSummary>>, AppError> {
    Ok(Json(
        CourseInstance::summaries(&state.db_pool, query.search.as_deref()).await?,
    ))
}

async fn update(
    staff: StaffUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(form): Json<CourseInstanceForm>,
) -> Result<Json<CourseInstance>, AppError> {
    staff.require(Permission::ManageCourses)?;
    form.validate()?;

    Ok(Json(CourseInstance::update(&state.db_pool, id, &form).await?))
}

async fn delete(
    staff: StaffUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    staff.require(Permission::ManageCourses)?;

    CourseInstance::delete(&state.db_pool, id).await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn create_assignment(
    staff: StaffUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(form): Json<AssignmentForm>,
) -> Result<(StatusCode, Json<CourseAssignment>), AppError> {
    form.validate()?;

    CourseInstance::find(&state.db_pool, id).await?;
    staff
        .require_on_instance(&state.db_pool, Permission::ManageAssignments, id)
        .await?;

    let assignment = CourseAssignment::create(&state.db_pool, id, &form).await?;

    Ok((StatusCode::CREATED, Json(assignment)))
}
