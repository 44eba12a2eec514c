pub mod cache_manager;
pub mod fallback;
pub mod network_monitor;
pub mod offline_client;
pub mod request_interceptor;
pub mod sync_coordinator;
pub mod sync_metrics;
pub mod worker;

pub use cache_manager::{ActivationReport, CacheLifecycle, CacheManager, CachePartition};
pub use fallback::OfflineFallback;
pub use network_monitor::{ConnectivitySignal, NetworkMonitor};
pub use offline_client::{ClientStatus, OfflineClient, SubmitOutcome};
pub use request_interceptor::{RequestInterceptor, RoutingPolicy};
pub use sync_coordinator::SyncCoordinator;
pub use sync_metrics::{SyncMetrics, SyncMetricsSnapshot};
pub use worker::{OfflineWorker, WorkerEvent, WorkerReply};
