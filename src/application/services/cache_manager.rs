use crate::application::ports::{HttpFetcher, ResponseCache};
use crate::domain::entities::{CachedResponse, OutgoingRequest};
use crate::shared::config::CacheConfig;
use crate::shared::error::AppError;
use reqwest::Url;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheLifecycle {
    Uninitialized,
    Installing,
    Installed,
    Active,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePartition {
    /// Application shell and same-origin static assets.
    Static,
    /// Last-known-good API responses.
    Api,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivationReport {
    pub deleted: Vec<String>,
    pub clients_claimed: bool,
}

/// Owns the two versioned partitions of the current deployment.
pub struct CacheManager {
    cache: Arc<dyn ResponseCache>,
    origin: Url,
    static_name: String,
    api_name: String,
    manifest: Vec<String>,
    state: RwLock<CacheLifecycle>,
}

impl CacheManager {
    pub fn new(cache: Arc<dyn ResponseCache>, config: &CacheConfig, origin: Url) -> Self {
        Self {
            cache,
            origin,
            static_name: config.static_cache_name(),
            api_name: config.api_cache_name(),
            manifest: config.manifest.clone(),
            state: RwLock::new(CacheLifecycle::Uninitialized),
        }
    }

    pub async fn state(&self) -> CacheLifecycle {
        *self.state.read().await
    }

    pub fn partition_name(&self, partition: CachePartition) -> &str {
        match partition {
            CachePartition::Static => &self.static_name,
            CachePartition::Api => &self.api_name,
        }
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    /// Pre-caches every manifest asset. Either all of them land in the static
    /// partition or none do; a failed install leaves the previous contents
    /// and lifecycle state untouched.
    pub async fn install(&self, fetcher: &dyn HttpFetcher) -> Result<usize, AppError> {
        let previous = {
            let mut state = self.state.write().await;
            if *state == CacheLifecycle::Installing {
                return Err(AppError::InvalidState(
                    "cache install already in progress".to_string(),
                ));
            }
            std::mem::replace(&mut *state, CacheLifecycle::Installing)
        };

        tracing::info!(
            target: "offline::cache",
            partition = %self.static_name,
            assets = self.manifest.len(),
            "installing shell assets"
        );

        let result = match self.fetch_manifest(fetcher).await {
            Ok(entries) => {
                let count = entries.len();
                self.cache
                    .put_all(&self.static_name, entries)
                    .await
                    .map(|()| count)
                    .map_err(|err| AppError::CacheInstall(err.to_string()))
            }
            Err(err) => Err(err),
        };

        match result {
            Ok(count) => {
                *self.state.write().await = CacheLifecycle::Installed;
                tracing::info!(target: "offline::cache", assets = count, "install complete");
                Ok(count)
            }
            Err(err) => {
                *self.state.write().await = previous;
                tracing::warn!(
                    target: "offline::cache",
                    error = %err,
                    state = ?previous,
                    "install failed; keeping previous cache"
                );
                Err(err)
            }
        }
    }

    async fn fetch_manifest(
        &self,
        fetcher: &dyn HttpFetcher,
    ) -> Result<Vec<(String, CachedResponse)>, AppError> {
        let mut entries = Vec::with_capacity(self.manifest.len());
        for path in &self.manifest {
            let url = self
                .origin
                .join(path)
                .map_err(|e| AppError::CacheInstall(format!("{path}: {e}")))?;
            let request = OutgoingRequest::get(url);
            let response = fetcher
                .fetch(&request)
                .await
                .map_err(|e| AppError::CacheInstall(format!("{path}: {e}")))?;
            if !response.is_success() {
                return Err(AppError::CacheInstall(format!(
                    "{path}: HTTP {}",
                    response.status
                )));
            }
            entries.push((request.cache_key(), CachedResponse::from_response(&response)));
        }
        Ok(entries)
    }

    /// Evicts stale partitions and takes control. Re-activating is harmless.
    pub async fn activate(&self) -> Result<ActivationReport, AppError> {
        let current = self.state().await;
        if !matches!(current, CacheLifecycle::Installed | CacheLifecycle::Active) {
            return Err(AppError::InvalidState(format!(
                "cannot activate from {current:?}"
            )));
        }

        let deleted = self.evict_all_except_current_version().await?;
        *self.state.write().await = CacheLifecycle::Active;
        tracing::info!(
            target: "offline::cache",
            deleted = deleted.len(),
            "cache activated"
        );

        Ok(ActivationReport {
            deleted,
            clients_claimed: true,
        })
    }

    /// Deletes every partition other than the two current-version ones.
    pub async fn evict_all_except_current_version(&self) -> Result<Vec<String>, AppError> {
        let mut deleted = Vec::new();
        for name in self.cache.partitions().await? {
            if name == self.static_name || name == self.api_name {
                continue;
            }
            if self.cache.delete_partition(&name).await? {
                tracing::info!(target: "offline::cache", partition = %name, "evicted stale partition");
                deleted.push(name);
            }
        }
        Ok(deleted)
    }

    pub async fn get(
        &self,
        partition: CachePartition,
        key: &str,
    ) -> Result<Option<CachedResponse>, AppError> {
        self.cache.get(self.partition_name(partition), key).await
    }

    pub async fn put(
        &self,
        partition: CachePartition,
        key: &str,
        response: CachedResponse,
    ) -> Result<(), AppError> {
        self.cache
            .put(self.partition_name(partition), key, response)
            .await
    }

    /// Static partition first, then API.
    pub async fn match_any(&self, key: &str) -> Result<Option<CachedResponse>, AppError> {
        if let Some(hit) = self.get(CachePartition::Static, key).await? {
            return Ok(Some(hit));
        }
        self.get(CachePartition::Api, key).await
    }

    pub async fn partitions(&self) -> Result<Vec<String>, AppError> {
        self.cache.partitions().await
    }
}
