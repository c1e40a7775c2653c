use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, put},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    AppError,
    auth::StaffUser,
    forms::{AssignmentForm, Validate},
    models::CourseAssignment,
    permissions::Permission,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/manage/assignments", get(list))
        .route("/manage/assignments/{id}", put(update))
}

#[derive(Debug, Deserialize)]
struct AssignmentFilter {
    course_instance_id: Option<Uuid>,
    search: Option<String>,
}

async fn list(
    _staff: StaffUser,
    State(state): State<AppState>,
    Query(filter): Query<AssignmentFilter>,
) -> Result<Json<Vec<CourseAssignment>>, AppError> {
    Ok(Json(
        CourseAssignment::list(
            &state.db_pool,
            filter.course_instance_id,
            filter.search.as_deref(),
        )
        .await?,
    ))
}

/// Also closes an assignment when `is_completed` is set.
async fn update(
    staff: StaffUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(form): Json<AssignmentForm>,
) -> Result<Json<CourseAssignment>, AppError> {
    form.validate()?;

    let assignment = CourseAssignment::find(&state.db_pool, id).await?;
    staff
        .require_on_instance(
            &state.db_pool,
            Permission::ManageAssignments,
            assignment.course_instance_id,
        )
        .await?;

    Ok(Json(CourseAssignment::update(&state.db_pool, id, &form).await?))
}
