use std::sync::Arc;

use anyhow::Context;
use tracing::warn;

use crate::auth::jwt::SessionKeys;
use crate::auth::repo::{PgUserStore, UserStore};
use crate::config::AppConfig;
use crate::storage::{Storage, StorageClient};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserStore>,
    pub storage: Arc<dyn StorageClient>,
    pub sessions: SessionKeys,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let db = sqlx::postgres::PgPoolOptions::new()
            .max_connections(10)
            .connect(&config.database_url)
            .await
            .context("connect to database")?;

        if let Err(e) = sqlx::migrate!("./migrations").run(&db).await {
            warn!(error = %e, "migration failed; continuing");
        }

        let storage = Arc::new(Storage::new(&config.storage).await?) as Arc<dyn StorageClient>;
        let users = Arc::new(PgUserStore::new(db)) as Arc<dyn UserStore>;

        Ok(Self::from_parts(config, users, storage))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        users: Arc<dyn UserStore>,
        storage: Arc<dyn StorageClient>,
    ) -> Self {
        let sessions = SessionKeys::new(&config.session);
        Self {
            config,
            users,
            storage,
            sessions,
        }
    }
}

#[cfg(test)]
pub use fake::FakeStorage;
