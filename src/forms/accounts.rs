use std::sync::LazyLock;

use chrono::{NaiveDate, Utc};
use regex::Regex;
use serde::Deserialize;
use uuid::Uuid;

use super::{Validate, check_max_chars, check_range};
use crate::FieldErrors;

pub const EMAIL_MAX_LENGTH: usize = 60;
pub const USERNAME_MAX_LENGTH: usize = 30;
pub const NAME_MAX_LENGTH: usize = 40;
pub const PHONE_MAX_LENGTH: usize = 20;
pub const ADDRESS_LINE_MAX_LENGTH: usize = 100;
pub const ZIP_CODE_MAX_LENGTH: usize = 20;
pub const SALARY_MAX: i64 = 1_000_000;

#[expect(clippy::unwrap_used)]
static EMAIL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());

#[expect(clippy::unwrap_used)]
static USERNAME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[\w.@+-]+$").unwrap());

#[expect(clippy::unwrap_used)]
static PHONE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\+?[0-9][0-9 -]{4,}$").unwrap());

pub(crate) fn check_email(errors: &mut FieldErrors, field: &str, email: &str) {
    let email = email.trim();
    if email.is_empty() {
        errors.add(field, "users must have an email address");
    } else if !EMAIL.is_match(email) {
        errors.add(field, "enter a valid email address");
    } else {
        check_max_chars(errors, field, Some(email), EMAIL_MAX_LENGTH);
    }
}

pub(crate) fn check_username(errors: &mut FieldErrors, field: &str, username: &str) {
    let username = username.trim();
    if username.is_empty() {
        errors.add(field, "users must have a username");
    } else if !USERNAME.is_match(username) {
        errors.add(
            field,
            "enter a valid username: letters, numbers and @/./+/-/_ only",
        );
    } else {
        check_max_chars(errors, field, Some(username), USERNAME_MAX_LENGTH);
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegistrationForm {
    pub username: String,
    pub email: String,
    pub password1: String,
    pub password2: String,
}

impl RegistrationForm {
    /// Registration rules depend on the configured minimum password length,
    /// so this form does not implement [`Validate`].
    #[must_use]
    pub fn errors(&self, password_min_length: usize) -> FieldErrors {
        let mut errors = FieldErrors::new();

        check_username(&mut errors, "username", &self.username);
        check_email(&mut errors, "email", &self.email);

        if self.password1.chars().count() < password_min_length {
            errors.add(
                "password1",
                format!("this password is too short, it must contain at least {password_min_length} characters"),
            );
        }

        if self.password1 != self.password2 {
            errors.add("password2", "the two password fields didn't match");
        }

        errors
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProfileForm {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub bio: Option<String>,
}

impl ProfileForm {
    fn errors_on(&self, today: NaiveDate) -> FieldErrors {
        let mut errors = FieldErrors::new();

        check_max_chars(&mut errors, "first_name", self.first_name.as_deref(), NAME_MAX_LENGTH);
        check_max_chars(&mut errors, "last_name", self.last_name.as_deref(), NAME_MAX_LENGTH);

        if let Some(phone) = self.phone.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
            if PHONE.is_match(phone) {
                check_max_chars(&mut errors, "phone", Some(phone), PHONE_MAX_LENGTH);
            } else {
                errors.add("phone", "enter a valid phone number");
            }
        }

        if self.date_of_birth.is_some_and(|born| born > today) {
            errors.add("date_of_birth", "invalid date - date of birth in the future");
        }

        errors
    }
}

impl Validate for ProfileForm {
    fn errors(&self) -> FieldErrors {
        self.errors_on(Utc::now().date_naive())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AddressForm {
    pub country: Option<String>,
    pub city: Option<String>,
    pub street: Option<String>,
    pub zip_code: Option<String>,
}

impl Validate for AddressForm {
    fn errors(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();

        check_max_chars(&mut errors, "country", self.country.as_deref(), ADDRESS_LINE_MAX_LENGTH);
        check_max_chars(&mut errors, "city", self.city.as_deref(), ADDRESS_LINE_MAX_LENGTH);
        check_max_chars(&mut errors, "street", self.street.as_deref(), ADDRESS_LINE_MAX_LENGTH);
        check_max_chars(&mut errors, "zip_code", self.zip_code.as_deref(), ZIP_CODE_MAX_LENGTH);

        errors
    }
}

/// Profile and address are edited together and saved only if both are valid.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProfileUpdateForm {
    pub profile: ProfileForm,
    pub address: AddressForm,
}

impl Validate for ProfileUpdateForm {
    fn errors(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        errors.nest("profile", self.profile.errors());
        errors.nest("address", self.address.errors());
        errors
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StaffForm {
    pub user_id: Uuid,
    #[serde(default)]
    pub salary: Option<i64>,
}

impl Validate for StaffForm {
    fn errors(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        if let Some(salary) = self.salary {
            check_range(&mut errors, "salary", salary, 0, SALARY_MAX);
        }
        errors
    }
}
