pub mod connectivity;
pub mod http;
pub mod notification;
pub mod pending_write;
pub mod sync_report;

pub use connectivity::ConnectivityEvent;
pub use http::{
    CachedResponse, FetchedResponse, OutgoingRequest, RequestDestination, ResponseKind,
    ResponseSource,
};
pub use notification::{Notification, PushMessage};
pub use pending_write::PendingWrite;
pub use sync_report::{SyncOutcome, SyncReport, SyncState, SyncTrigger};
