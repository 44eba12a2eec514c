use crate::application::services::network_monitor::ConnectivitySignal;
use crate::shared::error::AppError;
use reqwest::Url;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Feeds the platform connectivity signal by polling a reachability URL.
/// Any HTTP answer counts as online; transport failures count as offline.
pub struct HttpConnectivityProbe {
    client: reqwest::Client,
    url: Url,
    interval: Duration,
}

impl HttpConnectivityProbe {
    pub fn new(url: &str, interval: Duration) -> Result<Self, AppError> {
        let url = Url::parse(url)
            .map_err(|e| AppError::Configuration(format!("Invalid probe URL {url}: {e}")))?;
        let timeout = interval.min(Duration::from_secs(10)).max(Duration::from_millis(100));
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Configuration(e.to_string()))?;
        Ok(Self {
            client,
            url,
            interval,
        })
    }

    pub async fn probe_once(&self) -> bool {
        match self.client.head(self.url.clone()).send().await {
            Ok(_) => true,
            Err(err) => {
                tracing::debug!(target: "offline::network", error = %err, "connectivity probe failed");
                false
            }
        }
    }

    pub fn spawn(self, signal: ConnectivitySignal) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            loop {
                ticker.tick().await;
                let online = self.probe_once().await;
                signal.set(online);
            }
        })
    }
}
