//! Staff endpoints. Each handler checks its own permission; instance-bound
//! actions also check that the caller supervises the instance.

use axum::Router;

use crate::state::AppState;

mod assignments;
mod courses;
mod enrolls;
mod instances;
mod staff;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(courses::router())
        .merge(instances::router())
        .merge(assignments::router())
        .merge(enrolls::router())
        .merge(staff::router())
}
