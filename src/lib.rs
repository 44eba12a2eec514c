pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod shared;
pub mod state;

pub use application::services::{
    CacheManager, ClientStatus, ConnectivitySignal, NetworkMonitor, OfflineClient, OfflineWorker,
    RequestInterceptor, SubmitOutcome, SyncCoordinator, WorkerEvent, WorkerReply,
};
pub use shared::{AppConfig, AppError, Result};
pub use state::AppState;
