use std::collections::BTreeMap;

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::{any::AnyRow, FromRow, Row};
use time::OffsetDateTime;
use tracing::error;

use crate::{
    auth::{hash_password, verify_password},
    db::{decode_timestamp, encode_timestamp, Database, Model},
};

/// Field name → message, collected across all fields.
pub type ValidationErrors = BTreeMap<&'static str, &'static str>;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex =
            Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// A JSON `null` reads as an empty string, same as a missing field.
pub(crate) fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// User row. The password column only ever holds an Argon2 hash.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Create/register payload, password in plaintext.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UserParams {
    #[serde(deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub email: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub password: String,
}

/// Update payload. Missing or empty fields leave the stored value as is.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UserPatch {
    #[serde(deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub email: String,
}

impl User {
    /// Unsaved record; id and timestamps are assigned by the database adapter.
    pub fn new(name: String, email: String, password_hash: String) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            id: 0,
            name,
            email,
            password_hash,
            created_at: now,
            updated_at: now,
        }
    }

    /// Consumes validated params, hashing the plaintext password.
    pub fn from_params(params: UserParams) -> anyhow::Result<Self> {
        let hash = hash_password(&params.password)?;
        Ok(Self::new(params.name, params.email, hash))
    }

    pub fn check_password(&self, plain: &str) -> bool {
        match verify_password(plain, &self.password_hash) {
            Ok(ok) => ok,
            Err(e) => {
                error!(error = %e, user_id = self.id, "stored password hash is unreadable");
                false
            }
        }
    }
}

impl UserParams {
    pub fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();

        let name_len = self.name.chars().count();
        if self.name.is_empty() {
            errors.insert("name", "Name is required");
        } else if name_len < 2 {
            errors.insert("name", "Name must be at least 2 characters long");
        } else if name_len > 50 {
            errors.insert("name", "Name must be less than 50 characters");
        }

        if self.email.is_empty() {
            errors.insert("email", "Email is required");
        } else if !is_valid_email(&self.email) {
            errors.insert("email", "Invalid email format");
        }

        if self.password.is_empty() {
            errors.insert("password", "Password is required");
        } else if self.password.chars().count() < 6 {
            errors.insert("password", "Password must be at least 6 characters long");
        }

        errors
    }
}

impl UserPatch {
    pub fn apply(self, user: &mut User) {
        if !self.name.is_empty() {
            user.name = self.name;
        }
        if !self.email.is_empty() {
            user.email = self.email;
        }
    }
}

impl<'r> FromRow<'r, AnyRow> for User {
    fn from_row(row: &'r AnyRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password")?,
            created_at: decode_timestamp(row, "created_at")?,
            updated_at: decode_timestamp(row, "updated_at")?,
        })
    }
}

#[async_trait]
impl Model for User {
    const TABLE: &'static str = "users";
    const COLUMNS: &'static str = "id, name, email, password, created_at, updated_at";
    const LOOKUP_COLUMNS: &'static [&'static str] = &["name", "email"];

    fn id(&self) -> i64 {
        self.id
    }

    async fn insert(&self, db: &Database) -> sqlx::Result<i64> {
        let now = encode_timestamp(OffsetDateTime::now_utc())?;
        let sql = db.insert_sql(
            Self::TABLE,
            &["name", "email", "password", "created_at", "updated_at"],
        );
        let query = sqlx::query(&sql)
            .bind(self.name.clone())
            .bind(self.email.clone())
            .bind(self.password_hash.clone())
            .bind(now.clone())
            .bind(now);
        db.execute_insert(query).await
    }

    async fn update(&self, db: &Database) -> sqlx::Result<()> {
        let now = encode_timestamp(OffsetDateTime::now_utc())?;
        let sql = db.update_sql(Self::TABLE, &["name", "email", "password", "updated_at"]);
        let done = sqlx::query(&sql)
            .bind(self.name.clone())
            .bind(self.email.clone())
            .bind(self.password_hash.clone())
            .bind(now)
            .bind(self.id)
            .execute(db.pool())
            .await?;
        if done.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }
        Ok(())
    }
}
