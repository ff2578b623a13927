use std::sync::Arc;

use jobly_auth::{Argon2Hasher, CredentialHasher, Guard, Hs256TokenService, TokenService};
use jobly_infra::{Datastore, InMemoryStore, PostgresStore, StoreError};

use crate::app::errors::ApiError;
use crate::config::ApiConfig;

/// Everything a handler needs, acquired once at startup.
#[derive(Clone)]
pub struct AppServices {
    pub store: Arc<dyn Datastore>,
    pub hasher: Arc<dyn CredentialHasher>,
    pub tokens: Arc<dyn TokenService>,
    pub guard: Guard,
}

impl AppServices {
    pub fn new(
        store: Arc<dyn Datastore>,
        hasher: Arc<dyn CredentialHasher>,
        tokens: Arc<dyn TokenService>,
    ) -> Self {
        let guard = Guard::new(Arc::clone(&tokens));
        Self {
            store,
            hasher,
            tokens,
            guard,
        }
    }

    /// Hashing runs on the blocking pool.
    pub async fn hash_password(&self, plaintext: String) -> Result<String, ApiError> {
        let hasher = Arc::clone(&self.hasher);
        let hashed = tokio::task::spawn_blocking(move || hasher.hash(&plaintext))
            .await
            .map_err(|e| ApiError::internal(format!("hashing task failed: {e}")))??;
        Ok(hashed)
    }

    pub async fn verify_password(&self, plaintext: String, hash: String) -> Result<bool, ApiError> {
        let hasher = Arc::clone(&self.hasher);
        let ok = tokio::task::spawn_blocking(move || hasher.verify(&plaintext, &hash))
            .await
            .map_err(|e| ApiError::internal(format!("verification task failed: {e}")))??;
        Ok(ok)
    }
}

impl core::fmt::Debug for AppServices {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AppServices")
            .field("backend", &self.store.backend())
            .finish_non_exhaustive()
    }
}

/// Wire services from configuration: Postgres when `DATABASE_URL` is set,
/// otherwise the in-memory store.
pub async fn build_services(config: &ApiConfig) -> Result<AppServices, StoreError> {
    let store: Arc<dyn Datastore> = match &config.database_url {
        Some(url) => {
            let store = PostgresStore::connect(url, config.database_max_connections).await?;
            store.migrate().await?;
            Arc::new(store)
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using in-memory store (data is lost on exit)");
            Arc::new(InMemoryStore::new())
        }
    };

    let tokens = Arc::new(Hs256TokenService::new(
        config.jwt_secret.as_bytes(),
        config.token_ttl,
    ));

    tracing::info!(backend = store.backend(), "services ready");
    Ok(AppServices::new(store, Arc::new(Argon2Hasher::new()), tokens))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn defaults_to_in_memory_backend() {
        let services = build_services(&ApiConfig::default()).await.unwrap();
        assert_eq!(services.store.backend(), "in-memory");
    }

    #[tokio::test]
    async fn password_round_trip_through_blocking_pool() {
        let services = build_services(&ApiConfig::default()).await.unwrap();
        let hash = services.hash_password("hunter2".into()).await.unwrap();
        assert!(services.verify_password("hunter2".into(), hash.clone()).await.unwrap());
        assert!(!services.verify_password("wrong".into(), hash).await.unwrap());
    }
}
