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
    forms::{CourseForm, CourseInstanceForm, Validate},
    models::{Course, CourseInstance, CourseSummary},
    permissions::Permission,
    routes::SearchQuery,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/manage/courses", get(list).post(create))
        .route("/manage/courses/{id}", put(update).delete(delete))
        .route("/manage/courses/{id}/instances", post(create_instance))
}

async fn list(
    _staff: StaffUser,
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<CourseSummary>>, AppError> {
    Ok(Json(
        Course::summaries(&state.db_pool, query.search.as_deref()).await?,
    ))
}

async fn create(
    staff: StaffUser,
    State(state): State<AppState>,
    Json(form): Json<CourseForm>,
) -> Result<(StatusCode, Json<Course>), AppError> {
    staff.require(Permission::ManageCourses)?;
    form.validate()?;

    let course = Course::create(&state.db_pool, &form).await?;

    Ok((StatusCode::CREATED, Json(course)))
}

async fn update(
    staff: StaffUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(form): Json<CourseForm>,
) -> Result<Json<Course>, AppError> {
    staff.require(Permission::ManageCourses)?;
    form.validate()?;

    Ok(Json(Course::update(&state.db_pool, id, &form).await?))
}

async fn delete(
    staff: StaffUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    staff.require(Permission::ManageCourses)?;

    Course::delete(&state.db_pool, id).await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn create_instance(
    staff: StaffUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(form): Json<CourseInstanceForm>,
) -> Result<(StatusCode, Json<CourseInstance>), AppError> {
    staff.require(Permission::ManageCourses)?;
    form.validate()?;

    let course = Course::find(&state.db_pool, id).await?;
    let instance = CourseInstance::create(&state.db_pool, &course, &form).await?;

    Ok((StatusCode::CREATED, Json(instance)))
}
