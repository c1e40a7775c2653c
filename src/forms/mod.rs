//! Request bodies and their validation rules.
//!
//! Every form implements [`Validate`], which collects all field errors at
//! once instead of stopping at the first one.

mod accounts;
mod courses;

pub use accounts::{
    AddressForm, LoginForm, ProfileForm, ProfileUpdateForm, RegistrationForm, StaffForm,
};
pub(crate) use accounts::{check_email, check_username};
pub use courses::{AnswerForm, AssignmentForm, CourseForm, CourseInstanceForm, MarkForm};

use crate::{AppError, FieldErrors};

pub trait Validate {
    fn errors(&self) -> FieldErrors;

    fn validate(&self) -> Result<(), AppError> {
        self.errors().into_result()
    }
}

/// Trims and maps blank input to `None`.
#[must_use]
pub fn blank_to_none(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToOwned::to_owned)
}

pub(crate) fn check_max_chars(errors: &mut FieldErrors, field: &str, value: Option<&str>, max: usize) {
    if let Some(value) = value
        && value.chars().count() > max
    {
        errors.add(field, format!("ensure this value has at most {max} characters"));
    }
}

pub(crate) fn check_required(errors: &mut FieldErrors, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.add(field, "this field is required");
    }
}

pub(crate) fn check_range(errors: &mut FieldErrors, field: &str, value: i64, min: i64, max: i64) {
    if value < min {
        errors.add(field, format!("ensure this value is greater than or equal to {min}"));
    } else if value > max {
        errors.add(field, format!("ensure this value is less than or equal to {max}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_values() {
        assert_eq!(blank_to_none(None), None);
        assert_eq!(blank_to_none(Some("   ")), None);
        assert_eq!(blank_to_none(Some(" Kyiv ")), Some("Kyiv".to_owned()));
    }

    #[test]
    fn max_chars_counts_characters_not_bytes() {
        let mut errors = FieldErrors::new();
        check_max_chars(&mut errors, "city", Some("ÄÖÜ"), 3);
        assert!(errors.is_empty());

        check_max_chars(&mut errors, "city", Some("ÄÖÜß"), 3);
        assert!(errors.contains("city"));
    }

    #[test]
    fn range_bounds_are_inclusive() {
        let mut errors = FieldErrors::new();
        check_range(&mut errors, "value", 0, 0, 100);
        check_range(&mut errors, "value", 100, 0, 100);
        assert!(errors.is_empty());

        check_range(&mut errors, "value", 101, 0, 100);
        assert!(errors.contains("value"));
    }
}
