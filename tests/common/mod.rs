#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use offline_sync::application::ports::{HttpFetcher, PendingWriteStore};
use offline_sync::application::services::{CacheManager, RequestInterceptor, SyncCoordinator};
use offline_sync::domain::entities::{FetchedResponse, OutgoingRequest};
use offline_sync::domain::value_objects::WritePayload;
use offline_sync::infrastructure::cache::MemoryResponseCache;
use offline_sync::infrastructure::database::Database;
use offline_sync::infrastructure::offline::SqlitePendingWriteStore;
use offline_sync::{AppConfig, AppError};
use reqwest::{Method, Url};
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const ORIGIN: &str = "http://localhost:3000";

pub fn url(path: &str) -> Url {
    Url::parse(ORIGIN).unwrap().join(path).unwrap()
}

pub fn write(id: &str) -> WritePayload {
    WritePayload::new(json!({ "id": id, "productId": "prod-1", "result": "authentic" })).unwrap()
}

/// Scripted server. GET routes answer from a table (404 otherwise); writes
/// answer 201 unless their `id` field is on the reject list (500).
pub struct MockFetcher {
    online: AtomicBool,
    routes: Mutex<HashMap<String, (u16, &'static str, Bytes)>>,
    rejected: Mutex<HashSet<String>>,
    delay: Mutex<Duration>,
    log: Mutex<Vec<OutgoingRequest>>,
}

impl MockFetcher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            online: AtomicBool::new(true),
            routes: Mutex::new(HashMap::new()),
            rejected: Mutex::new(HashSet::new()),
            delay: Mutex::new(Duration::ZERO),
            log: Mutex::new(Vec::new()),
        })
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    pub fn route(&self, path: &str, content_type: &'static str, body: &str) {
        self.routes.lock().unwrap().insert(
            path.to_string(),
            (200, content_type, Bytes::from(body.to_string())),
        );
    }

    pub fn route_status(&self, path: &str, status: u16) {
        self.routes
            .lock()
            .unwrap()
            .insert(path.to_string(), (status, "text/plain", Bytes::new()));
    }

    pub fn reject(&self, id: &str) {
        self.rejected.lock().unwrap().insert(id.to_string());
    }

    pub fn accept_all(&self) {
        self.rejected.lock().unwrap().clear();
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    pub fn requests(&self) -> Vec<OutgoingRequest> {
        self.log.lock().unwrap().clone()
    }

    pub fn requests_to(&self, path: &str) -> usize {
        self.requests()
            .iter()
            .filter(|request| request.path() == path)
            .count()
    }

    /// `id` fields of every write POSTed so far, in order.
    pub fn posted_ids(&self) -> Vec<String> {
        self.requests()
            .iter()
            .filter(|request| request.method == Method::POST)
            .filter_map(|request| {
                let body: serde_json::Value =
                    serde_json::from_slice(request.body.as_deref()?).ok()?;
                body["id"].as_str().map(str::to_string)
            })
            .collect()
    }

    pub fn clear_log(&self) {
        self.log.lock().unwrap().clear();
    }
}

#[async_trait]
impl HttpFetcher for MockFetcher {
    async fn fetch(&self, request: &OutgoingRequest) -> Result<FetchedResponse, AppError> {
        self.log.lock().unwrap().push(request.clone());

        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if !self.online.load(Ordering::SeqCst) {
            return Err(AppError::Network("connection refused".into()));
        }

        if request.method != Method::GET {
            let body: serde_json::Value = request
                .body
                .as_deref()
                .and_then(|bytes| serde_json::from_slice(bytes).ok())
                .unwrap_or_default();
            let rejected = body["id"]
                .as_str()
                .is_some_and(|id| self.rejected.lock().unwrap().contains(id));
            let status = if rejected { 500 } else { 201 };
            return Ok(FetchedResponse::network(
                request.url.clone(),
                status,
                vec![("content-type".into(), "application/json".into())],
                Bytes::from_static(b"{}"),
            ));
        }

        let route = self.routes.lock().unwrap().get(request.path()).cloned();
        Ok(match route {
            Some((status, content_type, body)) => FetchedResponse::network(
                request.url.clone(),
                status,
                vec![("content-type".into(), content_type.into())],
                body,
            ),
            None => FetchedResponse::network(request.url.clone(), 404, Vec::new(), Bytes::new()),
        })
    }
}

pub struct Harness {
    pub config: AppConfig,
    pub fetcher: Arc<MockFetcher>,
    pub store: Arc<SqlitePendingWriteStore>,
    pub cache_backend: Arc<MemoryResponseCache>,
    pub cache: Arc<CacheManager>,
    pub interceptor: RequestInterceptor,
    pub coordinator: Arc<SyncCoordinator>,
}

pub async fn harness() -> Harness {
    harness_with("v1", Arc::new(MemoryResponseCache::new())).await
}

/// Services over an in-memory queue and the given cache back end, with a
/// site serving every manifest asset.
pub async fn harness_with(version: &str, cache_backend: Arc<MemoryResponseCache>) -> Harness {
    let mut config = AppConfig::default();
    config.api.origin = ORIGIN.to_string();
    config.cache.version = version.to_string();

    let fetcher = MockFetcher::new();
    fetcher.route("/", "text/html", "<html>shell</html>");
    fetcher.route("/index.html", "text/html", "<html>shell</html>");
    fetcher.route("/manifest.json", "application/json", r#"{"name":"app"}"#);
    fetcher.route("/icons/icon-192x192.png", "image/png", "png192");
    fetcher.route("/icons/icon-512x512.png", "image/png", "png512");

    let store = Arc::new(SqlitePendingWriteStore::new(
        Database::connect_in_memory().await.unwrap(),
    ));
    let cache = Arc::new(CacheManager::new(
        cache_backend.clone(),
        &config.cache,
        Url::parse(ORIGIN).unwrap(),
    ));
    let interceptor = RequestInterceptor::new(
        cache.clone(),
        fetcher.clone(),
        store.clone(),
        config.api.clone(),
        config.cache.shell_document.clone(),
    );
    let coordinator = Arc::new(
        SyncCoordinator::new(store.clone(), fetcher.clone(), &config.api, &config.sync).unwrap(),
    );

    Harness {
        config,
        fetcher,
        store,
        cache_backend,
        cache,
        interceptor,
        coordinator,
    }
}

impl Harness {
    pub async fn pending_ids(&self) -> Vec<String> {
        self.store
            .list_pending()
            .await
            .unwrap()
            .into_iter()
            .map(|write| write.payload.as_json()["id"].as_str().unwrap().to_string())
            .collect()
    }
}
