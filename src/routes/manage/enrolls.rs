use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    AppError,
    auth::StaffUser,
    forms::{MarkForm, Validate},
    models::{Enroll, EnrollSummary, FinishedEnroll, Mark, PersonalAssignment, PersonalAssignmentView},
    permissions::Permission,
    routes::SearchQuery,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/manage/enrolls", get(list_enrolls))
        .route("/manage/enrolls/{id}/finish", post(finish))
        .route("/manage/personal-assignments", get(list_personal_assignments))
        .route("/manage/personal-assignments/{id}/mark", post(grade))
}

async fn list_enrolls(
    staff: StaffUser,
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<EnrollSummary>>, AppError> {
    staff.require(Permission::ViewEnrolls)?;

    Ok(Json(
        Enroll::summaries(&state.db_pool, query.search.as_deref()).await?,
    ))
}

async fn finish(
    staff: StaffUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<FinishedEnroll>, AppError> {
    let enroll = Enroll::find(&state.db_pool, id).await?;
    staff
        .require_on_instance(
            &state.db_pool,
            Permission::FinishCourses,
            enroll.course_instance_id,
        )
        .await?;

    Ok(Json(Enroll::finish(&state.db_pool, id).await?))
}

async fn list_personal_assignments(
    staff: StaffUser,
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<PersonalAssignmentView>>, AppError> {
    staff.require(Permission::ViewEnrolls)?;

    Ok(Json(
        PersonalAssignment::list(&state.db_pool, query.search.as_deref()).await?,
    ))
}

async fn grade(
    staff: StaffUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(form): Json<MarkForm>,
) -> Result<Json<Mark>, AppError> {
    form.validate()?;

    let view = PersonalAssignment::find_view(&state.db_pool, id).await?;
    staff
        .require_on_instance(
            &state.db_pool,
            Permission::GradeAssignments,
            view.course_instance_id,
        )
        .await?;

    Ok(Json(Mark::record(&state.db_pool, id, form.value, staff.id).await?))
}
