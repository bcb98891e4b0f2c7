// src/services/session_service.rs
use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    errors::TaxiError as AppError,
    models::session::Session,
    services::storage_service::{StorageService, StoreKeys},
};

#[async_trait]
pub trait SessionOperations: Send + Sync {
    /// Starts a session for the driver. The store-wide visit counter is bumped
    /// exactly once here and its new value recorded on the session.
    async fn begin(&self, driver_id: u64) -> Result<Session, AppError>;
    async fn get_session(&self, session_id: &Uuid) -> Result<Option<Session>, AppError>;
    async fn end(&self, session_id: &Uuid) -> Result<bool, AppError>;
}

pub struct SessionService {
    storage: Arc<StorageService>,
    ttl: Duration,
}

impl SessionService {
    pub fn new(storage: Arc<StorageService>, ttl: Duration) -> Self {
        Self { storage, ttl }
    }
}

#[async_trait]
impl SessionOperations for SessionService {
    async fn begin(&self, driver_id: u64) -> Result<Session, AppError> {
        let num_visits = self.storage.incr(&StoreKeys::visit_counter()).await?;
        let now = Utc::now();
        let session = Session {
            id: Uuid::new_v4(),
            driver_id,
            num_visits,
            created_at: now,
            expires_at: now + self.ttl,
        };
        // The stored session expires with the session itself.
        self.storage
            .put_json_expiring(&StoreKeys::session(&session.id), &session, self.ttl)
            .await?;

        tracing::debug!("Session started for driver {} (visit {})", driver_id, num_visits);
        Ok(session)
    }

    async fn get_session(&self, session_id: &Uuid) -> Result<Option<Session>, AppError> {
        let key = StoreKeys::session(session_id);
        let Some(session) = self.storage.get_json::<Session>(&key).await? else {
            return Ok(None);
        };

        if session.is_expired(Utc::now()) {
            tracing::debug!("Session expired: {}", session_id);
            self.storage.remove(&key).await?;
            return Ok(None);
        }
        Ok(Some(session))
    }

    async fn end(&self, session_id: &Uuid) -> Result<bool, AppError> {
        self.storage.remove(&StoreKeys::session(session_id)).await
    }
}
