use crate::application::ports::notification_presenter::NotificationPresenter;
use crate::domain::entities::Notification;
use crate::shared::error::AppError;
use async_trait::async_trait;
use reqwest::Url;

/// Headless presenter: notifications go to the log.
#[derive(Debug, Default, Clone)]
pub struct TracingNotificationPresenter;

#[async_trait]
impl NotificationPresenter for TracingNotificationPresenter {
    async fn show(&self, notification: &Notification) -> Result<(), AppError> {
        tracing::info!(
            target: "offline::worker",
            title = %notification.title,
            body = %notification.body,
            url = %notification.url,
            "notification"
        );
        Ok(())
    }

    async fn click(&self, notification: &Notification, origin: &Url) -> Result<Url, AppError> {
        match notification.resolve_target(origin) {
            Ok(target) => {
                tracing::info!(target: "offline::worker", url = %target, "notification clicked");
                Ok(target)
            }
            Err(err) => {
                tracing::warn!(
                    target: "offline::worker",
                    url = %notification.url,
                    error = %err,
                    "notification click ignored"
                );
                Err(err)
            }
        }
    }
}
