use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::repo_types::{NewUser, User};

/// Persistence for user accounts, keyed by (normalized) email.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>>;

    /// Atomically creates the user unless the email is already taken.
    /// Returns `None` when another account owns the email.
    async fn insert_if_absent(&self, new: NewUser<'_>) -> anyhow::Result<Option<User>>;

    /// Returns `None` when no user with `id` exists.
    async fn set_profile_pic(&self, id: Uuid, url: &str) -> anyhow::Result<Option<User>>;
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, full_name, email, password_hash, profile_pic_url, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .context("find user by email")?;
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, full_name, email, password_hash, profile_pic_url, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find user by id")?;
        Ok(user)
    }

    async fn insert_if_absent(&self, new: NewUser<'_>) -> anyhow::Result<Option<User>> {
        // users_email_key makes the conflict check and the insert one statement.
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (full_name, email, password_hash)
            VALUES ($1, $2, $3)
            ON CONFLICT (email) DO NOTHING
            RETURNING id, full_name, email, password_hash, profile_pic_url, created_at, updated_at
            "#,
        )
        .bind(new.full_name)
        .bind(new.email)
        .bind(new.password_hash)
        .fetch_optional(&self.db)
        .await
        .context("insert user")?;
        Ok(user)
    }

    async fn set_profile_pic(&self, id: Uuid, url: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
               SET profile_pic_url = $2, updated_at = now()
             WHERE id = $1
            RETURNING id, full_name, email, password_hash, profile_pic_url, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(url)
        .fetch_optional(&self.db)
        .await
        .context("update profile picture")?;
        Ok(user)
    }
}

#[cfg(test)]
pub use memory::MemoryUserStore;
