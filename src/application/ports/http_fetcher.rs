use crate::domain::entities::{FetchedResponse, OutgoingRequest};
use crate::shared::error::AppError;
use async_trait::async_trait;

/// Network transport. Any HTTP status is a successful fetch; only transport
/// failures surface as [`AppError::Network`].
#[async_trait]
pub trait HttpFetcher: Send + Sync {
    async fn fetch(&self, request: &OutgoingRequest) -> Result<FetchedResponse, AppError>;
}
