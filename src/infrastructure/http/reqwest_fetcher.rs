use crate::application::ports::http_fetcher::HttpFetcher;
use crate::domain::entities::{FetchedResponse, OutgoingRequest, ResponseKind, ResponseSource};
use crate::shared::config::ApiConfig;
use crate::shared::error::AppError;
use async_trait::async_trait;
use reqwest::Url;
use std::time::Duration;

pub struct ReqwestFetcher {
    client: reqwest::Client,
    origin: Url,
}

impl ReqwestFetcher {
    pub fn new(api: &ApiConfig) -> Result<Self, AppError> {
        let origin = api.origin_url().map_err(AppError::Configuration)?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(api.request_timeout_secs))
            .build()
            .map_err(|e| AppError::Configuration(e.to_string()))?;
        Ok(Self { client, origin })
    }

    pub fn with_client(client: reqwest::Client, origin: Url) -> Self {
        Self { client, origin }
    }
}

#[async_trait]
impl HttpFetcher for ReqwestFetcher {
    async fn fetch(&self, request: &OutgoingRequest) -> Result<FetchedResponse, AppError> {
        let mut builder = self
            .client
            .request(request.method.clone(), request.url.clone());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await.map_err(|err| {
            tracing::debug!(
                target: "offline::interceptor",
                url = %request.url,
                error = %err,
                "network request failed"
            );
            AppError::Network(err.to_string())
        })?;

        let final_url = response.url().clone();
        let redirected = final_url != request.url;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(|err| AppError::Network(err.to_string()))?;

        let kind = if final_url.origin() == self.origin.origin() {
            ResponseKind::Basic
        } else {
            ResponseKind::Cors
        };

        Ok(FetchedResponse {
            url: final_url,
            status,
            headers,
            body,
            kind,
            redirected,
            source: ResponseSource::Network,
        })
    }
}
