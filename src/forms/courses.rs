use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

use super::{Validate, blank_to_none, check_max_chars, check_range, check_required};
use crate::{FieldErrors, slug::slugify};

pub const TITLE_MAX_LENGTH: usize = 100;
pub const MARK_MIN: i64 = 0;
pub const MARK_MAX: i64 = 100;

#[derive(Debug, Clone, Deserialize)]
pub struct CourseForm {
    pub base_title: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl CourseForm {
    #[must_use]
    pub fn slug(&self) -> String {
        slugify(&self.base_title)
    }

    #[must_use]
    pub fn description(&self) -> Option<String> {
        blank_to_none(self.description.as_deref())
    }
}

impl Validate for CourseForm {
    fn errors(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();

        check_required(&mut errors, "base_title", &self.base_title);
        check_max_chars(&mut errors, "base_title", Some(self.base_title.trim()), TITLE_MAX_LENGTH);

        if !errors.contains("base_title") && self.slug().is_empty() {
            errors.add("base_title", "title must contain at least one latin letter or digit");
        }

        errors
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CourseInstanceForm {
    #[serde(default)]
    pub sub_title: Option<String>,
    pub min_mark: i16,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

impl CourseInstanceForm {
    /// Falls back to the course title when no sub-title is given.
    #[must_use]
    pub fn sub_title_or(&self, base_title: &str) -> String {
        blank_to_none(self.sub_title.as_deref()).unwrap_or_else(|| base_title.trim().to_owned())
    }
}

impl Validate for CourseInstanceForm {
    fn errors(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();

        check_max_chars(
            &mut errors,
            "sub_title",
            self.sub_title.as_deref().map(str::trim),
            TITLE_MAX_LENGTH,
        );
        if let Some(sub_title) = blank_to_none(self.sub_title.as_deref())
            && slugify(&sub_title).is_empty()
        {
            errors.add("sub_title", "sub-title must contain at least one latin letter or digit");
        }

        check_range(&mut errors, "min_mark", i64::from(self.min_mark), MARK_MIN, MARK_MAX);

        if let (Some(start), Some(end)) = (self.start_date, self.end_date)
            && end < start
        {
            errors.add("end_date", "end date must not be before start date");
        }

        errors
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AssignmentForm {
    pub title: Option<String>,
    pub content: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub is_completed: bool,
}

impl Validate for AssignmentForm {
    fn errors(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();

        check_max_chars(&mut errors, "title", self.title.as_deref().map(str::trim), TITLE_MAX_LENGTH);

        if let (Some(start), Some(end)) = (self.start_date, self.end_date)
            && end < start
        {
            errors.add("end_date", "end date must not be before start date");
        }

        errors
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MarkForm {
    pub value: i16,
}

impl Validate for MarkForm {
    fn errors(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        check_range(&mut errors, "value", i64::from(self.value), MARK_MIN, MARK_MAX);
        errors
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnswerForm {
    pub answer: String,
}

impl Validate for AnswerForm {
    fn errors(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        check_required(&mut errors, "answer", &self.answer);
        errors
    }
}
