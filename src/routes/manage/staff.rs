use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    AppError,
    auth::StaffUser,
    forms::{StaffForm, Validate},
    models::{Course, CourseInstance, StaffKind, StaffSummary, StaffWorker},
    permissions::Permission,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/manage/teachers", get(list_teachers).post(create_teacher))
        .route("/manage/managers", get(list_managers).post(create_manager))
        .route(
            "/manage/teachers/{id}/instances/{instance_id}",
            post(supervise_teacher_instance).delete(release_teacher_instance),
        )
        .route(
            "/manage/managers/{id}/courses/{course_id}",
            post(supervise_manager_course).delete(release_manager_course),
        )
        .route(
            "/manage/managers/{id}/instances/{instance_id}",
            post(supervise_manager_instance).delete(release_manager_instance),
        )
}

async fn list_teachers(
    staff: StaffUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<StaffSummary>>, AppError> {
    staff.require(Permission::ManageTeachers)?;

    Ok(Json(StaffWorker::list(&state.db_pool, StaffKind::Teacher).await?))
}

async fn list_managers(
    staff: StaffUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<StaffSummary>>, AppError> {
    staff.require_superuser()?;

    Ok(Json(StaffWorker::list(&state.db_pool, StaffKind::Manager).await?))
}

async fn create_teacher(
    staff: StaffUser,
    State(state): State<AppState>,
    Json(form): Json<StaffForm>,
) -> Result<(StatusCode, Json<StaffWorker>), AppError> {
    staff.require(Permission::ManageTeachers)?;
    form.validate()?;

    let teacher =
        StaffWorker::create(&state.db_pool, form.user_id, StaffKind::Teacher, form.salary).await?;

    Ok((StatusCode::CREATED, Json(teacher)))
}

async fn create_manager(
    staff: StaffUser,
    State(state): State<AppState>,
    Json(form): Json<StaffForm>,
) -> Result<(StatusCode, Json<StaffWorker>), AppError> {
    staff.require_superuser()?;
    form.validate()?;

    let manager =
        StaffWorker::create(&state.db_pool, form.user_id, StaffKind::Manager, form.salary).await?;

    Ok((StatusCode::CREATED, Json(manager)))
}

fn released(removed: bool) -> Result<StatusCode, AppError> {
    if removed {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound("supervision"))
    }
}

async fn supervise_teacher_instance(
    staff: StaffUser,
    State(state): State<AppState>,
    Path((id, instance_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, AppError> {
    staff.require(Permission::ManageTeachers)?;

    let teacher = StaffWorker::find(&state.db_pool, id, StaffKind::Teacher).await?;
    CourseInstance::find(&state.db_pool, instance_id).await?;
    teacher.supervise_instance(&state.db_pool, instance_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn release_teacher_instance(
    staff: StaffUser,
    State(state): State<AppState>,
    Path((id, instance_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, AppError> {
    staff.require(Permission::ManageTeachers)?;

    let teacher = StaffWorker::find(&state.db_pool, id, StaffKind::Teacher).await?;
    released(teacher.release_instance(&state.db_pool, instance_id).await?)
}

async fn supervise_manager_course(
    staff: StaffUser,
    State(state): State<AppState>,
    Path((id, course_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, AppError> {
    staff.require_superuser()?;

    let manager = StaffWorker::find(&state.db_pool, id, StaffKind::Manager).await?;
    Course::find(&state.db_pool, course_id).await?;
    manager.supervise_course(&state.db_pool, course_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn release_manager_course(
    staff: StaffUser,
    State(state): State<AppState>,
    Path((id, course_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, AppError> {
    staff.require_superuser()?;

    let manager = StaffWorker::find(&state.db_pool, id, StaffKind::Manager).await?;
    released(manager.release_course(&state.db_pool, course_id).await?)
}

async fn supervise_manager_instance(
    staff: StaffUser,
    State(state): State<AppState>,
    Path((id, instance_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, AppError> {
    staff.require_superuser()?;

    let manager = StaffWorker::find(&state.db_pool, id, StaffKind::Manager).await?;
    CourseInstance::find(&state.db_pool, instance_id).await?;
    manager.supervise_instance(&state.db_pool, instance_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn release_manager_instance(
    staff: StaffUser,
    State(state): State<AppState>,
    Path((id, instance_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, AppError> {
    staff.require_superuser()?;

    let manager = StaffWorker::find(&state.db_pool, id, StaffKind::Manager).await?;
    released(manager.release_instance(&state.db_pool, instance_id).await?)
}
