use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;
use sqlx::{SqliteExecutor, SqlitePool};
use uuid::Uuid;

use crate::{
    AppError,
    forms::{AddressForm, ProfileForm, ProfileUpdateForm, blank_to_none},
};

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Profile {
    pub id: Uuid,
    pub user_id: Uuid,

    pub first_name: Option<String>,
    pub last_name: Option<String>,

    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,

    pub bio: Option<String>,
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.first_name.as_deref(), self.last_name.as_deref()) {
            (Some(first), Some(last)) => write!(f, "{first} {last}"),
            (Some(name), None) | (None, Some(name)) => f.write_str(name),
            (None, None) => write!(f, "Student - {}", self.id),
        }
    }
}

impl Profile {
    pub async fn create_for_user(db: impl SqliteExecutor<'_>, user_id: Uuid) -> sqlx::Result<Self> {
        sqlx::query_as::<_, Self>(
            "INSERT INTO profiles (id, user_id) VALUES (?, ?)
            RETURNING id, user_id, first_name, last_name, phone, date_of_birth, bio",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .fetch_one(db)
        .await
    }

    pub async fn for_user(db: impl SqliteExecutor<'_>, user_id: Uuid) -> sqlx::Result<Self> {
        sqlx::query_as::<_, Self>(
            "SELECT id, user_id, first_name, last_name, phone, date_of_birth, bio
            FROM profiles WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_one(db)
        .await
    }

    async fn update(self, db: impl SqliteExecutor<'_>, form: &ProfileForm) -> sqlx::Result<Self> {
        sqlx::query_as::<_, Self>(
            "UPDATE profiles SET first_name = ?, last_name = ?, phone = ?, date_of_birth = ?, bio = ?
            WHERE id = ?
            RETURNING id, user_id, first_name, last_name, phone, date_of_birth, bio",
        )
        .bind(blank_to_none(form.first_name.as_deref()))
        .bind(blank_to_none(form.last_name.as_deref()))
        .bind(blank_to_none(form.phone.as_deref()))
        .bind(form.date_of_birth)
        .bind(blank_to_none(form.bio.as_deref()))
        .bind(self.id)
        .fetch_one(db)
        .await
    }

    /// Writes profile and address in one transaction. The form must already be validated.
    pub async fn update_with_address(
        db: &SqlitePool,
        user_id: Uuid,
        form: &ProfileUpdateForm,
    ) -> Result<(Self, Address), AppError> {
        let mut tx = db.begin().await?;

        let profile = Self::for_user(&mut *tx, user_id).await?;
        let address = Address::for_profile(&mut *tx, profile.id).await?;

        let profile = profile.update(&mut *tx, &form.profile).await?;
        let address = address.update(&mut *tx, &form.address).await?;

        tx.commit().await?;

        Ok((profile, address))
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Address {
    pub id: Uuid,
    pub profile_id: Uuid,

    pub country: Option<String>,
    pub city: Option<String>,
    pub street: Option<String>,
    pub zip_code: Option<String>,
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let part = |value: &Option<String>| value.clone().unwrap_or_default();
        write!(
            f,
            "{}, {}, {} | {}",
            part(&self.country),
            part(&self.city),
            part(&self.street),
            part(&self.zip_code)
        )
    }
}

impl Address {
    pub async fn create_for_profile(
        db: impl SqliteExecutor<'_>,
        profile_id: Uuid,
    ) -> sqlx::Result<Self> {
        sqlx::query_as::<_, Self>(
            "INSERT INTO addresses (id, profile_id) VALUES (?, ?)
            RETURNING id, profile_id, country, city, street, zip_code",
        )
        .bind(Uuid::new_v4())
        .bind(profile_id)
        .fetch_one(db)
        .await
    }

    pub async fn for_profile(db: impl SqliteExecutor<'_>, profile_id: Uuid) -> sqlx::Result<Self> {
        sqlx::query_as::<_, Self>(
            "SELECT id, profile_id, country, city, street, zip_code
            FROM addresses WHERE profile_id = ?",
        )
        .bind(profile_id)
        .fetch_one(db)
        .await
    }

    async fn update(self, db: impl SqliteExecutor<'_>, form: &AddressForm) -> sqlx::Result<Self> {
        sqlx::query_as::<_, Self>(
            "UPDATE addresses SET country = ?, city = ?, street = ?, zip_code = ?
            WHERE id = ?
            RETURNING id, profile_id, country, city, street, zip_code",
        )
        .bind(blank_to_none(form.country.as_deref()))
        .bind(blank_to_none(form.city.as_deref()))
        .bind(blank_to_none(form.street.as_deref()))
        .bind(blank_to_none(form.zip_code.as_deref()))
        .bind(self.id)
        .fetch_one(db)
        .await
    }
}
