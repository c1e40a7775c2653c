use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::{
    AppError,
    auth::AuthUser,
    forms::{AnswerForm, Validate},
    models::{
        Course, CourseInstance, CourseInstanceSummary, Enroll, PersonalAssignment,
        PersonalAssignmentView,
    },
    permissions::Permission,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/courses", get(list_courses))
        .route("/courses/my-courses", get(my_courses))
        .route("/courses/{course_slug}", get(course_detail))
        .route("/courses/{course_slug}/{instance_slug}", get(instance_detail))
        .route("/courses/{course_slug}/{instance_slug}/enroll", post(enroll))
        .route("/courses/{course_slug}/{instance_slug}/unenroll", post(unenroll))
        .route(
            "/courses/{course_slug}/{instance_slug}/assignments",
            get(my_assignments),
        )
        .route(
            "/courses/{course_slug}/{instance_slug}/{id}",
            get(personal_assignment).post(submit_answer),
        )
}

#[derive(Serialize)]
struct CourseDetail {
    course: Course,
    instances: Vec<CourseInstance>,
}

#[derive(Serialize)]
struct InstanceDetail {
    course: Course,
    instance: CourseInstance,
    title: String,
    is_enrolled: bool,
    enroll: Option<Enroll>,
}

async fn list_courses(State(state): State<AppState>) -> Result<Json<Vec<Course>>, AppError> {
    Ok(Json(Course::all(&state.db_pool).await?))
}

async fn my_courses(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<CourseInstanceSummary>>, AppError> {
    Ok(Json(
        CourseInstance::enrolled_for_student(&state.db_pool, auth.id).await?,
    ))
}

async fn course_detail(
    State(state): State<AppState>,
    Path(course_slug): Path<String>,
) -> Result<Json<CourseDetail>, AppError> {
    let course = Course::find_by_slug(&state.db_pool, &course_slug).await?;
    let instances = CourseInstance::for_course(&state.db_pool, course.id).await?;

    Ok(Json(CourseDetail { course, instances }))
}

async fn instance_detail(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((course_slug, instance_slug)): Path<(String, String)>,
) -> Result<Json<InstanceDetail>, AppError> {
    let (course, instance) =
        CourseInstance::find_by_slugs(&state.db_pool, &course_slug, &instance_slug).await?;
    let enroll = Enroll::find_for(&state.db_pool, instance.id, auth.id).await?;

    Ok(Json(InstanceDetail {
        title: instance.display(&course),
        is_enrolled: enroll.is_some(),
        course,
        instance,
        enroll,
    }))
}

async fn enroll(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((course_slug, instance_slug)): Path<(String, String)>,
) -> Result<(StatusCode, Json<Enroll>), AppError> {
    let (_, instance) =
        CourseInstance::find_by_slugs(&state.db_pool, &course_slug, &instance_slug).await?;

    let (enroll, created) = Enroll::get_or_create(&state.db_pool, instance.id, auth.id).await?;

    let status = if created { StatusCode::CREATED } else { StatusCode::OK };

    Ok((status, Json(enroll)))
}

async fn unenroll(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((course_slug, instance_slug)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    let (_, instance) =
        CourseInstance::find_by_slugs(&state.db_pool, &course_slug, &instance_slug).await?;

    Enroll::delete_for(&state.db_pool, instance.id, auth.id).await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn my_assignments(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((course_slug, instance_slug)): Path<(String, String)>,
) -> Result<Json<Vec<PersonalAssignmentView>>, AppError> {
    let (_, instance) =
        CourseInstance::find_by_slugs(&state.db_pool, &course_slug, &instance_slug).await?;

    let enroll = Enroll::find_for(&state.db_pool, instance.id, auth.id)
        .await?
        .ok_or(AppError::NotFound("enroll"))?;

    Ok(Json(
        PersonalAssignment::for_enroll(&state.db_pool, enroll.id).await?,
    ))
}

/// Loads the personal assignment if it belongs to the user and the instance.
async fn owned_assignment(
    state: &AppState,
    user_id: Uuid,
    course_slug: &str,
    instance_slug: &str,
    id: Uuid,
) -> Result<PersonalAssignmentView, AppError> {
    let (_, instance) =
        CourseInstance::find_by_slugs(&state.db_pool, course_slug, instance_slug).await?;
    let view = PersonalAssignment::find_view(&state.db_pool, id).await?;

    if view.student_id != user_id || view.course_instance_id != instance.id {
        return Err(AppError::NotFound("personal assignment"));
    }

    Ok(view)
}

async fn personal_assignment(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((course_slug, instance_slug, id)): Path<(String, String, Uuid)>,
) -> Result<Json<PersonalAssignmentView>, AppError> {
    let view = owned_assignment(&state, auth.id, &course_slug, &instance_slug, id).await?;

    Ok(Json(view))
}

async fn submit_answer(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((course_slug, instance_slug, id)): Path<(String, String, Uuid)>,
    Json(form): Json<AnswerForm>,
) -> Result<Json<PersonalAssignmentView>, AppError> {
    auth.require(Permission::SubmitAnswer)?;
    owned_assignment(&state, auth.id, &course_slug, &instance_slug, id).await?;
    form.validate()?;

    let view =
        PersonalAssignment::submit_answer(&state.db_pool, id, auth.id, &form, Utc::now()).await?;

    Ok(Json(view))
}
