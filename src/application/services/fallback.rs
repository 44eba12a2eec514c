use crate::domain::entities::FetchedResponse;
use crate::domain::value_objects::PendingWriteId;
use reqwest::Url;
use serde_json::json;

pub const DEFERRED_MESSAGE: &str = "Saved offline; will sync when connection is restored";
pub const OFFLINE_MESSAGE: &str = "You appear to be offline; try again once the connection is back";
pub const RESOURCE_UNAVAILABLE_TEXT: &str = "Offline - resource unavailable";

/// Synthesized responses for requests that neither the network nor the
/// cache could satisfy.
pub struct OfflineFallback;

impl OfflineFallback {
    /// HTTP 202: the write was captured and will be replayed later.
    pub fn deferred(url: Url, pending_id: &PendingWriteId) -> FetchedResponse {
        FetchedResponse::synthesized_json(
            url,
            202,
            &json!({
                "success": true,
                "offline": true,
                "deferred": true,
                "message": DEFERRED_MESSAGE,
                "pendingId": pending_id.as_str(),
            }),
        )
    }

    /// HTTP 503 for API requests with nothing cached.
    pub fn unavailable(url: Url, message: Option<&str>) -> FetchedResponse {
        FetchedResponse::synthesized_json(
            url,
            503,
            &json!({
                "error": "Network unavailable",
                "offline": true,
                "message": message.unwrap_or(OFFLINE_MESSAGE),
            }),
        )
    }

    /// HTTP 408 for static resources.
    pub fn resource_unavailable(url: Url) -> FetchedResponse {
        FetchedResponse::synthesized_text(url, 408, RESOURCE_UNAVAILABLE_TEXT)
    }
}
