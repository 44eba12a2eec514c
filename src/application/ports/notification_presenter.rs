use crate::domain::entities::Notification;
use crate::shared::error::AppError;
use async_trait::async_trait;
use reqwest::Url;

#[async_trait]
pub trait NotificationPresenter: Send + Sync {
    async fn show(&self, notification: &Notification) -> Result<(), AppError>;

    /// Handles a click and returns the page navigated to. Only targets on
    /// `origin` are followed.
    async fn click(&self, notification: &Notification, origin: &Url) -> Result<Url, AppError> {
        notification.resolve_target(origin)
    }
}
