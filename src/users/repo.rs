use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{Preferences, User, UserRow};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("email already registered")]
    DuplicateEmail,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Credential store. Update methods return `false` when nothing changed
/// (unknown id, location already present / absent).
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    async fn insert(&self, email: &str, password_hash: &str) -> Result<User, StoreError>;
    async fn set_preferences(&self, id: Uuid, prefs: &Preferences) -> Result<bool, StoreError>;
    async fn add_location(&self, id: Uuid, location: &str) -> Result<bool, StoreError>;
    async fn remove_location(&self, id: Uuid, location: &str) -> Result<bool, StoreError>;
}

const USER_COLUMNS: &str = "id, email, password_hash, unit_preference, language_preference, \
                            saved_locations, created_at";

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations").run(&self.db).await?;
        Ok(())
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(User::from))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(User::from))
    }

    async fn insert(&self, email: &str, password_hash: &str) -> Result<User, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "INSERT INTO users (email, password_hash) VALUES ($1, $2) RETURNING {USER_COLUMNS}"
        ))
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.db)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => StoreError::DuplicateEmail,
            other => StoreError::Database(other),
        })?;
        Ok(row.into())
    }

    async fn set_preferences(&self, id: Uuid, prefs: &Preferences) -> Result<bool, StoreError> {
        let res = sqlx::query(
            r#"
            UPDATE users
               SET unit_preference = $2, language_preference = $3
             WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&prefs.unit_preference)
        .bind(&prefs.language_preference)
        .execute(&self.db)
        .await?;
        Ok(res.rows_affected() == 1)
    }

    async fn add_location(&self, id: Uuid, location: &str) -> Result<bool, StoreError> {
        // Membership check and append happen in one statement.
        let res = sqlx::query(
            r#"
            UPDATE users
               SET saved_locations = array_append(saved_locations, $2::text)
             WHERE id = $1 AND NOT ($2::text = ANY(saved_locations))
            "#,
        )
        .bind(id)
        .bind(location)
        .execute(&self.db)
        .await?;
        Ok(res.rows_affected() == 1)
    }

    async fn remove_location(&self, id: Uuid, location: &str) -> Result<bool, StoreError> {
        let res = sqlx::query(
            r#"
            UPDATE users
               SET saved_locations = array_remove(saved_locations, $2::text)
             WHERE id = $1 AND $2::text = ANY(saved_locations)
            "#,
        )
        .bind(id)
        .bind(location)
        .execute(&self.db)
        .await?;
        Ok(res.rows_affected() == 1)
    }
}
