use crate::shared::error::AppError;
use reqwest::Url;
use serde::{Deserialize, Serialize};

pub const DEFAULT_NOTIFICATION_TITLE: &str = "Notification";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub body: String,
    /// Origin-relative or absolute target opened on click.
    pub url: String,
}

impl Notification {
    /// Click target resolved against `origin`. Targets on another origin are
    /// refused.
    pub fn resolve_target(&self, origin: &Url) -> Result<Url, AppError> {
        let target = origin.join(&self.url).map_err(|e| {
            AppError::Validation(format!("Invalid notification url {}: {e}", self.url))
        })?;
        if target.origin() != origin.origin() {
            return Err(AppError::Validation(format!(
                "Notification url {} is outside {}",
                self.url,
                origin.origin().ascii_serialization()
            )));
        }
        Ok(target)
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawPushPayload {
    title: Option<String>,
    body: Option<String>,
    url: Option<String>,
}

/// Push message as delivered by the platform.
pub struct PushMessage;

impl PushMessage {
    /// JSON `{title?, body?, url?}`; anything else is treated as body text.
    pub fn parse(data: &[u8]) -> Notification {
        let raw = match serde_json::from_slice::<RawPushPayload>(data) {
            Ok(raw) => raw,
            Err(_) => RawPushPayload {
                body: Some(String::from_utf8_lossy(data).trim().to_string()),
                ..RawPushPayload::default()
            },
        };

        Notification {
            title: raw
                .title
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_NOTIFICATION_TITLE.to_string()),
            body: raw.body.unwrap_or_default(),
            url: raw
                .url
                .filter(|u| !u.trim().is_empty())
                .unwrap_or_else(|| "/".to_string()),
        }
    }
}
