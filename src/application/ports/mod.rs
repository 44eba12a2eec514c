pub mod http_fetcher;
pub mod notification_presenter;
pub mod offline_store;
pub mod response_cache;

pub use http_fetcher::HttpFetcher;
pub use notification_presenter::NotificationPresenter;
pub use offline_store::PendingWriteStore;
pub use response_cache::ResponseCache;
