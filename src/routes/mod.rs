use serde::Deserialize;

pub mod accounts;
pub mod certificates;
pub mod courses;
pub mod health;
pub mod manage;

/// `?search=` on the listing endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub search: Option<String>,
}
