use std::sync::Arc;

use chrono::Duration;
use tracing::info;

use crate::auth::SessionKeys;
use crate::config::{Config, StorageKind};
use crate::error::StoreError;
use crate::store::{MemoryStore, MongoStore, Store};

/// Everything the handlers share. Built once at startup and handed to actix
/// as `web::Data`.
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub sessions: SessionKeys,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, sessions: SessionKeys) -> Self {
        AppState { store, sessions }
    }

    pub async fn from_config(config: &Config) -> Result<Self, StoreError> {
        let store: Arc<dyn Store> = match (config.storage, &config.mongodb_uri) {
            (StorageKind::Mongo, Some(uri)) => {
                Arc::new(MongoStore::connect(uri, &config.database).await?)
            }
            _ => {
                info!("Using in-memory storage, nothing will be persisted");
                Arc::new(MemoryStore::new())
            }
        };
        let sessions = SessionKeys::new(
            &config.session_secret,
            Duration::hours(config.session_ttl_hours),
        );
        Ok(AppState::new(store, sessions))
    }
}
