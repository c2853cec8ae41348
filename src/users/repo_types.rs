use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Unit systems understood by the weather upstream: metric, scientific, imperial.
pub const UNIT_SYSTEMS: [&str; 3] = ["M", "S", "I"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    #[serde(default = "default_unit")]
    pub unit_preference: String,
    #[serde(default = "default_language")]
    pub language_preference: String,
}

fn default_unit() -> String {
    "M".into()
}

fn default_language() -> String {
    "en".into()
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            unit_preference: default_unit(),
            language_preference: default_language(),
        }
    }
}

/// User record as returned to its owner.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // Argon2 PHC string, not exposed in JSON
    pub preferences: Preferences,
    pub saved_locations: Vec<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Flat row in the `users` table.
#[derive(Debug, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub unit_preference: String,
    pub language_preference: String,
    pub saved_locations: Vec<String>,
    pub created_at: OffsetDateTime,
}

impl From<UserRow> for User {
    fn from(r: UserRow) -> Self {
        Self {
            id: r.id,
            email: r.email,
            password_hash: r.password_hash,
            preferences: Preferences {
                unit_preference: r.unit_preference,
                language_preference: r.language_preference,
            },
            saved_locations: r.saved_locations,
            created_at: r.created_at,
        }
    }
}
