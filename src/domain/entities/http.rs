use crate::shared::error::AppError;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use reqwest::{Method, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// What the request is for, mirroring the platform's request destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestDestination {
    Document,
    Script,
    Style,
    Image,
    Font,
    Manifest,
    Other,
}

#[derive(Debug, Clone)]
pub struct OutgoingRequest {
    pub method: Method,
    pub url: Url,
    pub destination: RequestDestination,
    pub headers: Vec<(String, String)>,
    pub body: Option<Bytes>,
}

impl OutgoingRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            destination: RequestDestination::Other,
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    /// A top-level navigation (HTML document) request.
    pub fn navigate(url: Url) -> Self {
        Self::get(url)
            .with_destination(RequestDestination::Document)
            .with_header("accept", "text/html")
    }

    pub fn post_json<T: Serialize>(url: Url, body: &T) -> Result<Self, AppError> {
        let encoded = serde_json::to_vec(body)?;
        Ok(Self::new(Method::POST, url)
            .with_header("content-type", "application/json")
            .with_body(Bytes::from(encoded)))
    }

    pub fn with_destination(mut self, destination: RequestDestination) -> Self {
        self.destination = destination;
        self
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_ascii_lowercase(), value.to_string()));
        self
    }

    pub fn with_body(mut self, body: Bytes) -> Self {
        self.body = Some(body);
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        header_value(&self.headers, name)
    }

    pub fn path(&self) -> &str {
        self.url.path()
    }

    pub fn is_get(&self) -> bool {
        self.method == Method::GET
    }

    pub fn expects_html(&self) -> bool {
        self.destination == RequestDestination::Document
            || self
                .header("accept")
                .is_some_and(|accept| accept.contains("text/html"))
    }

    /// Cache identity: method plus the absolute URL without its fragment.
    pub fn cache_key(&self) -> String {
        let mut url = self.url.clone();
        url.set_fragment(None);
        format!("{} {}", self.method.as_str(), url)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseKind {
    /// Same-origin, readable.
    Basic,
    /// Cross-origin, readable.
    Cors,
    /// Cross-origin, unreadable.
    Opaque,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseSource {
    Network,
    Cache,
    Fallback,
}

#[derive(Debug, Clone)]
pub struct FetchedResponse {
    pub url: Url,
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
    pub kind: ResponseKind,
    pub redirected: bool,
    pub source: ResponseSource,
}

impl FetchedResponse {
    pub fn network(url: Url, status: u16, headers: Vec<(String, String)>, body: Bytes) -> Self {
        Self {
            url,
            status,
            headers,
            body,
            kind: ResponseKind::Basic,
            redirected: false,
            source: ResponseSource::Network,
        }
    }

    pub fn synthesized_text(url: Url, status: u16, text: &str) -> Self {
        Self {
            url,
            status,
            headers: vec![(
                "content-type".to_string(),
                "text/plain; charset=utf-8".to_string(),
            )],
            body: Bytes::from(text.to_string()),
            kind: ResponseKind::Basic,
            redirected: false,
            source: ResponseSource::Fallback,
        }
    }

    pub fn synthesized_json(url: Url, status: u16, body: &serde_json::Value) -> Self {
        Self {
            url,
            status,
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: Bytes::from(body.to_string()),
            kind: ResponseKind::Basic,
            redirected: false,
            source: ResponseSource::Fallback,
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        header_value(&self.headers, name)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, AppError> {
        serde_json::from_slice(&self.body).map_err(AppError::from)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Same-origin, exactly 200, basic and not redirected.
    pub fn is_cacheable_asset(&self, origin: &Url) -> bool {
        self.status == 200
            && self.kind == ResponseKind::Basic
            && !self.redirected
            && self.url.origin() == origin.origin()
    }
}

/// Last-known-good response stored in a cache partition.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedResponse {
    pub url: Url,
    pub status: u16,
    pub content_type: Option<String>,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
    pub cached_at: DateTime<Utc>,
}

impl CachedResponse {
    pub fn from_response(response: &FetchedResponse) -> Self {
        Self {
            url: response.url.clone(),
            status: response.status,
            content_type: response.content_type().map(str::to_string),
            headers: response.headers.clone(),
            body: response.body.clone(),
            cached_at: Utc::now(),
        }
    }

    pub fn into_response(self) -> FetchedResponse {
        FetchedResponse {
            url: self.url,
            status: self.status,
            headers: self.headers,
            body: self.body,
            kind: ResponseKind::Basic,
            redirected: false,
            source: ResponseSource::Cache,
        }
    }
}

fn header_value<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(path: &str) -> Url {
        Url::parse("https://app.example.com")
            .unwrap()
            .join(path)
            .unwrap()
    }

    #[test]
    fn cache_key_includes_method_and_query() {
        let request = OutgoingRequest::get(url("/api/products?page=2"));
        assert_eq!(
            request.cache_key(),
            "GET https://app.example.com/api/products?page=2"
        );

        let request = OutgoingRequest::get(url("/index.html#top"));
        assert_eq!(request.cache_key(), "GET https://app.example.com/index.html");
    }

    #[test]
    fn cache_key_distinguishes_origins() {
        let local = OutgoingRequest::get(url("/index.html"));
        let foreign =
            OutgoingRequest::get(Url::parse("https://cdn.example.net/index.html").unwrap());
        assert_ne!(local.cache_key(), foreign.cache_key());

        let post = OutgoingRequest::new(Method::POST, url("/index.html"));
        assert_ne!(local.cache_key(), post.cache_key());
    }

    #[test]
    fn navigation_expects_html() {
        assert!(OutgoingRequest::navigate(url("/dashboard")).expects_html());
        assert!(!OutgoingRequest::get(url("/app.js")).expects_html());
    }

    #[test]
    fn cacheable_asset_rules() {
        let origin = Url::parse("https://app.example.com").unwrap();
        let ok = FetchedResponse::network(url("/app.js"), 200, Vec::new(), Bytes::from("x"));
        assert!(ok.is_cacheable_asset(&origin));

        let mut partial = ok.clone();
        partial.status = 206;
        assert!(!partial.is_cacheable_asset(&origin));

        let mut redirected = ok.clone();
        redirected.redirected = true;
        assert!(!redirected.is_cacheable_asset(&origin));

        let mut opaque = ok.clone();
        opaque.kind = ResponseKind::Opaque;
        assert!(!opaque.is_cacheable_asset(&origin));

        let mut foreign = ok;
        foreign.url = Url::parse("https://cdn.example.net/app.js").unwrap();
        assert!(!foreign.is_cacheable_asset(&origin));
    }

    #[test]
    fn cached_response_round_trips_body_and_type() {
        let response = FetchedResponse::network(
            url("/style.css"),
            200,
            vec![("Content-Type".into(), "text/css".into())],
            Bytes::from_static(b"body{}"),
        );
        let cached = CachedResponse::from_response(&response);
        assert_eq!(cached.content_type.as_deref(), Some("text/css"));

        let served = cached.into_response();
        assert_eq!(served.source, ResponseSource::Cache);
        assert_eq!(&served.body[..], b"body{}");
    }
}
