use crate::application::ports::{HttpFetcher, NotificationPresenter, PendingWriteStore};
use crate::application::services::{
    CacheManager, ConnectivitySignal, NetworkMonitor, OfflineClient, OfflineWorker,
    RequestInterceptor, SyncCoordinator,
};
use crate::infrastructure::cache::SqliteResponseCache;
use crate::infrastructure::connectivity::HttpConnectivityProbe;
use crate::infrastructure::database::{Database, DbPool};
use crate::infrastructure::http::ReqwestFetcher;
use crate::infrastructure::notification::TracingNotificationPresenter;
use crate::infrastructure::offline::SqlitePendingWriteStore;
use crate::shared::config::AppConfig;
use crate::shared::error::AppError;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Fully wired offline subsystem.
pub struct AppState {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub signal: ConnectivitySignal,
    pub monitor: Arc<NetworkMonitor>,
    pub cache: Arc<CacheManager>,
    pub coordinator: Arc<SyncCoordinator>,
    pub interceptor: Arc<RequestInterceptor>,
    pub client: Arc<OfflineClient>,
    pub worker: Arc<OfflineWorker>,
    background: Vec<JoinHandle<()>>,
}

impl AppState {
    pub async fn initialize(config: AppConfig) -> Result<Self, AppError> {
        config.validate().map_err(AppError::Configuration)?;
        let origin = config.api.origin_url().map_err(AppError::Configuration)?;

        let probe = match &config.network.probe_url {
            Some(url) => Some(HttpConnectivityProbe::new(
                url,
                Duration::from_secs(config.network.probe_interval_secs),
            )?),
            None => None,
        };
        let initially_online = match &probe {
            Some(probe) => probe.probe_once().await,
            None => true,
        };

        // the cache shares the queue's database, so it is opened eagerly here
        let db_pool = Database::connect(&config.database).await?;
        let store: Arc<dyn PendingWriteStore> =
            Arc::new(SqlitePendingWriteStore::new(db_pool.clone()));
        let fetcher: Arc<dyn HttpFetcher> = Arc::new(ReqwestFetcher::new(&config.api)?);
        let presenter: Arc<dyn NotificationPresenter> = Arc::new(TracingNotificationPresenter);

        let signal = ConnectivitySignal::new(initially_online);
        let monitor = Arc::new(NetworkMonitor::start(
            signal.subscribe(),
            Duration::from_millis(config.network.debounce_ms),
        ));

        let cache = Arc::new(CacheManager::new(
            Arc::new(SqliteResponseCache::new(db_pool.clone())),
            &config.cache,
            origin,
        ));
        let coordinator = Arc::new(SyncCoordinator::new(
            Arc::clone(&store),
            Arc::clone(&fetcher),
            &config.api,
            &config.sync,
        )?);
        let interceptor = Arc::new(RequestInterceptor::new(
            Arc::clone(&cache),
            Arc::clone(&fetcher),
            Arc::clone(&store),
            config.api.clone(),
            config.cache.shell_document.clone(),
        ));
        let client = Arc::new(OfflineClient::new(
            Arc::clone(&store),
            Arc::clone(&fetcher),
            Arc::clone(&monitor),
            Arc::clone(&coordinator),
        ));
        let worker = Arc::new(OfflineWorker::new(
            Arc::clone(&cache),
            Arc::clone(&interceptor),
            Arc::clone(&coordinator),
            fetcher,
            presenter,
        ));

        let mut background = Vec::new();
        if config.sync.auto_sync_on_reconnect {
            background.push(coordinator.spawn_auto_sync(monitor.subscribe()));
        }
        if let Some(probe) = probe {
            background.push(probe.spawn(signal.clone()));
        }

        tracing::info!(
            target: "offline::worker",
            online = initially_online,
            static_cache = %config.cache.static_cache_name(),
            api_cache = %config.cache.api_cache_name(),
            "offline subsystem initialized"
        );

        Ok(Self {
            config,
            db_pool,
            signal,
            monitor,
            cache,
            coordinator,
            interceptor,
            client,
            worker,
            background,
        })
    }

    pub async fn shutdown(self) {
        for handle in &self.background {
            handle.abort();
        }
        self.db_pool.close().await;
        tracing::debug!(target: "offline::worker", "offline subsystem shut down");
    }
}
