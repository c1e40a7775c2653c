use askama::Template;
use axum::{
    Json, Router,
    extract::{Path, State},
    response::Html,
    routing::get,
};

use crate::{
    AppError,
    auth::AuthUser,
    models::{Certificate, CertificateDetails},
    state::AppState,
    templates::CertificatePage,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/certificates", get(my_certificates))
        .route("/certificates/{code}", get(certificate))
}

async fn my_certificates(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<CertificateDetails>>, AppError> {
    Ok(Json(Certificate::for_student(&state.db_pool, auth.id).await?))
}

/// Public; the code is the capability.
async fn certificate(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Html<String>, AppError> {
    let details = Certificate::find_by_code(&state.db_pool, &code).await?;

    Ok(Html(CertificatePage::from(details).render()?))
}
