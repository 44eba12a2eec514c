use super::cache_manager::{CacheManager, CachePartition};
use super::fallback::OfflineFallback;
use crate::application::ports::{HttpFetcher, PendingWriteStore};
use crate::domain::entities::{CachedResponse, FetchedResponse, OutgoingRequest};
use crate::domain::value_objects::WritePayload;
use crate::shared::config::ApiConfig;
use crate::shared::error::AppError;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutingPolicy {
    NetworkFirst,
    CacheFirst,
}

/// Routes every outgoing request through the cache and network, and never
/// fails: when both are unavailable a synthesized response is returned.
pub struct RequestInterceptor {
    cache: Arc<CacheManager>,
    fetcher: Arc<dyn HttpFetcher>,
    store: Arc<dyn PendingWriteStore>,
    api: ApiConfig,
    shell_document: String,
}

impl RequestInterceptor {
    pub fn new(
        cache: Arc<CacheManager>,
        fetcher: Arc<dyn HttpFetcher>,
        store: Arc<dyn PendingWriteStore>,
        api: ApiConfig,
        shell_document: String,
    ) -> Self {
        Self {
            cache,
            fetcher,
            store,
            api,
            shell_document,
        }
    }

    pub fn policy_for(&self, request: &OutgoingRequest) -> RoutingPolicy {
        let same_origin = request.url.origin() == self.cache.origin().origin();
        if same_origin && self.api.is_api_path(request.path()) {
            RoutingPolicy::NetworkFirst
        } else {
            RoutingPolicy::CacheFirst
        }
    }

    pub async fn handle(&self, request: &OutgoingRequest) -> FetchedResponse {
        match self.policy_for(request) {
            RoutingPolicy::NetworkFirst => self.network_first(request).await,
            RoutingPolicy::CacheFirst => self.cache_first(request).await,
        }
    }

    async fn network_first(&self, request: &OutgoingRequest) -> FetchedResponse {
        let key = request.cache_key();
        let error = match self.fetcher.fetch(request).await {
            Ok(response) => {
                if request.is_get() && response.is_success() {
                    let entry = CachedResponse::from_response(&response);
                    if let Err(err) = self.cache.put(CachePartition::Api, &key, entry).await {
                        tracing::warn!(
                            target: "offline::interceptor",
                            key = %key,
                            error = %err,
                            "failed to refresh API cache"
                        );
                    }
                }
                return response;
            }
            Err(err) => err,
        };

        tracing::debug!(
            target: "offline::interceptor",
            key = %key,
            error = %error,
            "API request failed; falling back"
        );

        if request.is_get() {
            match self.cache.get(CachePartition::Api, &key).await {
                Ok(Some(hit)) => return hit.into_response(),
                Ok(None) => {}
                Err(err) => tracing::warn!(
                    target: "offline::interceptor",
                    key = %key,
                    error = %err,
                    "API cache lookup failed"
                ),
            }
            return OfflineFallback::unavailable(request.url.clone(), None);
        }

        if self.api.is_deferrable(request.path()) {
            return self.defer_write(request).await;
        }
        OfflineFallback::unavailable(request.url.clone(), None)
    }

    async fn defer_write(&self, request: &OutgoingRequest) -> FetchedResponse {
        let payload = match Self::payload_of(request) {
            Ok(payload) => payload,
            Err(err) => {
                tracing::warn!(
                    target: "offline::interceptor",
                    path = request.path(),
                    error = %err,
                    "deferrable write has no usable body"
                );
                let message = err.to_string();
                return OfflineFallback::unavailable(request.url.clone(), Some(&message));
            }
        };

        match self.store.enqueue(payload).await {
            Ok(id) => {
                tracing::info!(
                    target: "offline::interceptor",
                    id = %id,
                    path = request.path(),
                    "write deferred until reconnect"
                );
                OfflineFallback::deferred(request.url.clone(), &id)
            }
            Err(err) => {
                tracing::warn!(
                    target: "offline::interceptor",
                    path = request.path(),
                    error = %err,
                    "failed to persist deferred write"
                );
                let message = err.to_string();
                OfflineFallback::unavailable(request.url.clone(), Some(&message))
            }
        }
    }

    fn payload_of(request: &OutgoingRequest) -> Result<WritePayload, AppError> {
        let body = request
            .body
            .as_ref()
            .ok_or_else(|| AppError::Validation("request body is empty".to_string()))?;
        let value: serde_json::Value = serde_json::from_slice(body)?;
        WritePayload::new(value).map_err(AppError::Validation)
    }

    async fn cache_first(&self, request: &OutgoingRequest) -> FetchedResponse {
        if !request.is_get() {
            return match self.fetcher.fetch(request).await {
                Ok(response) => response,
                Err(_) => OfflineFallback::resource_unavailable(request.url.clone()),
            };
        }

        let key = request.cache_key();
        match self.cache.match_any(&key).await {
            Ok(Some(hit)) => return hit.into_response(),
            Ok(None) => {}
            Err(err) => tracing::warn!(
                target: "offline::interceptor",
                key = %key,
                error = %err,
                "cache lookup failed"
            ),
        }

        match self.fetcher.fetch(request).await {
            Ok(response) => {
                if response.is_cacheable_asset(self.cache.origin()) {
                    let entry = CachedResponse::from_response(&response);
                    if let Err(err) = self.cache.put(CachePartition::Static, &key, entry).await {
                        tracing::warn!(
                            target: "offline::interceptor",
                            key = %key,
                            error = %err,
                            "failed to cache static asset"
                        );
                    }
                }
                response
            }
            Err(err) => {
                tracing::debug!(
                    target: "offline::interceptor",
                    key = %key,
                    error = %err,
                    "static request failed"
                );
                if request.expects_html() {
                    if let Some(shell) = self.shell().await {
                        return shell;
                    }
                }
                OfflineFallback::resource_unavailable(request.url.clone())
            }
        }
    }

    async fn shell(&self) -> Option<FetchedResponse> {
        let url = self.cache.origin().join(&self.shell_document).ok()?;
        let key = OutgoingRequest::get(url).cache_key();
        match self.cache.match_any(&key).await {
            Ok(hit) => hit.map(CachedResponse::into_response),
            Err(err) => {
                tracing::warn!(
                    target: "offline::interceptor",
                    error = %err,
                    "shell document lookup failed"
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::ResponseSource;
    use crate::infrastructure::cache::MemoryResponseCache;
    use crate::infrastructure::database::Database;
    use crate::infrastructure::offline::SqlitePendingWriteStore;
    use crate::shared::config::{AppConfig, CacheConfig};
    use async_trait::async_trait;
    use bytes::Bytes;
    use reqwest::Url;

    struct Unreachable;

    #[async_trait]
    impl HttpFetcher for Unreachable {
        async fn fetch(&self, _request: &OutgoingRequest) -> Result<FetchedResponse, AppError> {
            Err(AppError::Network("connection refused".into()))
        }
    }

    struct Echo;

    #[async_trait]
    impl HttpFetcher for Echo {
        async fn fetch(&self, request: &OutgoingRequest) -> Result<FetchedResponse, AppError> {
            Ok(FetchedResponse::network(
                request.url.clone(),
                200,
                Vec::new(),
                Bytes::from(request.path().to_string()),
            ))
        }
    }

    async fn interceptor(
        fetcher: Arc<dyn HttpFetcher>,
    ) -> (RequestInterceptor, Arc<SqlitePendingWriteStore>) {
        let config = AppConfig::default();
        let origin = Url::parse("https://app.example.com").unwrap();
        let cache_config = CacheConfig {
            manifest: vec!["/".into()],
            ..config.cache.clone()
        };
        let cache = Arc::new(CacheManager::new(
            Arc::new(MemoryResponseCache::new()),
            &cache_config,
            origin.clone(),
        ));
        let store = Arc::new(SqlitePendingWriteStore::new(
            Database::connect_in_memory().await.unwrap(),
        ));
        let api = ApiConfig {
            origin: origin.to_string(),
            ..config.api
        };
        let interceptor = RequestInterceptor::new(
            cache,
            fetcher,
            store.clone(),
            api,
            cache_config.shell_document,
        );
        (interceptor, store)
    }

    fn url(path: &str) -> Url {
        Url::parse("https://app.example.com").unwrap().join(path).unwrap()
    }

    #[tokio::test]
    async fn test_policy_by_path_and_origin() {
        let (interceptor, _) = interceptor(Arc::new(Echo)).await;
        assert_eq!(
            interceptor.policy_for(&OutgoingRequest::get(url("/api/products"))),
            RoutingPolicy::NetworkFirst
        );
        assert_eq!(
            interceptor.policy_for(&OutgoingRequest::get(url("/app.js"))),
            RoutingPolicy::CacheFirst
        );
        let foreign = Url::parse("https://cdn.example.net/api/x").unwrap();
        assert_eq!(
            interceptor.policy_for(&OutgoingRequest::get(foreign)),
            RoutingPolicy::CacheFirst
        );
    }

    #[tokio::test]
    async fn test_deferrable_write_is_enqueued_when_offline() {
        let (interceptor, store) = interceptor(Arc::new(Unreachable)).await;
        let request =
            OutgoingRequest::post_json(url("/api/verify"), &serde_json::json!({"code": "X1"}))
                .unwrap();

        let response = interceptor.handle(&request).await;

        assert_eq!(response.status, 202);
        let body: serde_json::Value = response.json().unwrap();
        let pending = store.list_pending().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(body["pendingId"], pending[0].id.as_str());
        assert_eq!(pending[0].payload.as_json()["code"], "X1");
    }

    #[tokio::test]
    async fn test_non_deferrable_write_gets_offline_error() {
        let (interceptor, store) = interceptor(Arc::new(Unreachable)).await;
        let request =
            OutgoingRequest::post_json(url("/api/products"), &serde_json::json!({"a": 1})).unwrap();

        let response = interceptor.handle(&request).await;

        assert_eq!(response.status, 503);
        assert_eq!(response.source, ResponseSource::Fallback);
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_static_miss_offline_is_408() {
        let (interceptor, _) = interceptor(Arc::new(Unreachable)).await;
        let response = interceptor.handle(&OutgoingRequest::get(url("/app.js"))).await;
        assert_eq!(response.status, 408);
    }

    #[tokio::test]
    async fn test_static_asset_cached_after_first_fetch() {
        let (online, _) = interceptor(Arc::new(Echo)).await;
        let first = online.handle(&OutgoingRequest::get(url("/app.js"))).await;
        assert_eq!(first.source, ResponseSource::Network);

        let second = online.handle(&OutgoingRequest::get(url("/app.js"))).await;
        assert_eq!(second.source, ResponseSource::Cache);
        assert_eq!(&second.body[..], b"/app.js");
    }
}
