use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub cache: CacheConfig,
    pub api: ApiConfig,
    pub sync: SyncConfig,
    pub network: NetworkConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Deployment version tag shared by both partitions.
    pub version: String,
    pub static_prefix: String,
    pub api_prefix_name: String,
    /// Shell assets pre-cached on install.
    pub manifest: Vec<String>,
    /// Document served for navigations that miss both cache and network.
    pub shell_document: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub origin: String,
    pub path_prefix: String,
    pub sync_endpoint: String,
    /// Write endpoints that answer "accepted but deferred" when offline.
    pub deferrable_endpoints: Vec<String>,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    pub tag: String,
    pub auto_sync_on_reconnect: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub debounce_ms: u64,
    #[serde(default)]
    pub probe_url: Option<String>,
    pub probe_interval_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: default_database_url(),
                max_connections: 1,
            },
            cache: CacheConfig {
                version: "v1".to_string(),
                static_prefix: "static".to_string(),
                api_prefix_name: "api".to_string(),
                manifest: vec![
                    "/".to_string(),
                    "/index.html".to_string(),
                    "/manifest.json".to_string(),
                    "/icons/icon-192x192.png".to_string(),
                    "/icons/icon-512x512.png".to_string(),
                ],
                shell_document: "/".to_string(),
            },
            api: ApiConfig {
                origin: "http://localhost:3000".to_string(),
                path_prefix: "/api/".to_string(),
                sync_endpoint: "/api/verifications/sync".to_string(),
                deferrable_endpoints: vec![
                    "/api/verify".to_string(),
                    "/api/verifications".to_string(),
                ],
                request_timeout_secs: 30,
            },
            sync: SyncConfig {
                tag: "sync-verifications".to_string(),
                auto_sync_on_reconnect: true,
            },
            network: NetworkConfig {
                debounce_ms: 1_000,
                probe_url: None,
                probe_interval_secs: 15,
            },
        }
    }
}

fn default_database_url() -> String {
    let data_dir = dirs::data_local_dir()
        .map(|dir| dir.join("offline-sync"))
        .unwrap_or_else(|| PathBuf::from("./data"));
    format!(
        "sqlite://{}?mode=rwc",
        data_dir.join("offline-sync.db").display()
    )
}

impl CacheConfig {
    pub fn static_cache_name(&self) -> String {
        format!("{}-{}", self.static_prefix, self.version)
    }

    pub fn api_cache_name(&self) -> String {
        format!("{}-{}", self.api_prefix_name, self.version)
    }
}

impl ApiConfig {
    pub fn origin_url(&self) -> Result<Url, String> {
        Url::parse(&self.origin).map_err(|e| format!("Invalid API origin {}: {e}", self.origin))
    }

    pub fn is_api_path(&self, path: &str) -> bool {
        path.starts_with(&self.path_prefix)
    }

    pub fn is_deferrable(&self, path: &str) -> bool {
        self.deferrable_endpoints
            .iter()
            .any(|endpoint| path == endpoint || path.starts_with(&format!("{endpoint}/")))
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var("OFFLINE_SYNC_DATABASE_URL") {
            if !v.trim().is_empty() {
                cfg.database.url = v.trim().to_string();
            }
        }
        if let Some(value) = env_u64("OFFLINE_SYNC_DATABASE_MAX_CONNECTIONS") {
            cfg.database.max_connections = value.min(u64::from(u32::MAX)) as u32;
        }

        if let Ok(v) = std::env::var("OFFLINE_SYNC_CACHE_VERSION") {
            if !v.trim().is_empty() {
                cfg.cache.version = v.trim().to_string();
            }
        }
        if let Some(paths) = env_list("OFFLINE_SYNC_CACHE_MANIFEST") {
            cfg.cache.manifest = paths;
        }
        if let Ok(v) = std::env::var("OFFLINE_SYNC_SHELL_DOCUMENT") {
            if !v.trim().is_empty() {
                cfg.cache.shell_document = v.trim().to_string();
            }
        }

        if let Ok(v) = std::env::var("OFFLINE_SYNC_API_ORIGIN") {
            if !v.trim().is_empty() {
                cfg.api.origin = v.trim().trim_end_matches('/').to_string();
            }
        }
        if let Ok(v) = std::env::var("OFFLINE_SYNC_API_PREFIX") {
            if !v.trim().is_empty() {
                cfg.api.path_prefix = v.trim().to_string();
            }
        }
        if let Ok(v) = std::env::var("OFFLINE_SYNC_SYNC_ENDPOINT") {
            if !v.trim().is_empty() {
                cfg.api.sync_endpoint = v.trim().to_string();
            }
        }
        if let Some(endpoints) = env_list("OFFLINE_SYNC_DEFERRABLE_ENDPOINTS") {
            cfg.api.deferrable_endpoints = endpoints;
        }
        if let Some(value) = env_u64("OFFLINE_SYNC_REQUEST_TIMEOUT_SECS") {
            cfg.api.request_timeout_secs = value.max(1);
        }

        if let Ok(v) = std::env::var("OFFLINE_SYNC_TAG") {
            if !v.trim().is_empty() {
                cfg.sync.tag = v.trim().to_string();
            }
        }
        if let Ok(v) = std::env::var("OFFLINE_SYNC_AUTO_SYNC") {
            cfg.sync.auto_sync_on_reconnect = parse_bool(&v, cfg.sync.auto_sync_on_reconnect);
        }

        if let Some(value) = env_u64("OFFLINE_SYNC_DEBOUNCE_MS") {
            cfg.network.debounce_ms = value;
        }
        if let Ok(v) = std::env::var("OFFLINE_SYNC_PROBE_URL") {
            let v = v.trim();
            cfg.network.probe_url = if v.is_empty() {
                None
            } else {
                Some(v.to_string())
            };
        }
        if let Some(value) = env_u64("OFFLINE_SYNC_PROBE_INTERVAL_SECS") {
            cfg.network.probe_interval_secs = value.max(1);
        }

        cfg
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.database.max_connections == 0 {
            return Err("Database max_connections must be greater than 0".to_string());
        }
        if self.cache.version.trim().is_empty() {
            return Err("Cache version tag cannot be empty".to_string());
        }
        if self.cache.static_cache_name() == self.cache.api_cache_name() {
            return Err("Static and API cache partitions must have distinct names".to_string());
        }
        if !self
            .cache
            .manifest
            .iter()
            .any(|path| path == &self.cache.shell_document)
        {
            return Err(format!(
                "Cache manifest must include the shell document {}",
                self.cache.shell_document
            ));
        }
        if !self.api.is_api_path(&self.api.sync_endpoint) {
            return Err(format!(
                "Sync endpoint {} must live under the API prefix {}",
                self.api.sync_endpoint, self.api.path_prefix
            ));
        }
        self.api.origin_url()?;
        if let Some(probe) = &self.network.probe_url {
            Url::parse(probe).map_err(|e| format!("Invalid probe URL {probe}: {e}"))?;
        }
        Ok(())
    }
}

fn parse_bool(s: &str, default: bool) -> bool {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

fn parse_u64(value: &str) -> Option<u64> {
    value.trim().parse::<u64>().ok()
}

fn env_u64(name: &str) -> Option<u64> {
    std::env::var(name).ok().and_then(|v| parse_u64(&v))
}

fn env_list(name: &str) -> Option<Vec<String>> {
    let raw = std::env::var(name).ok()?;
    let items: Vec<String> = raw
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if items.is_empty() { None } else { Some(items) }
}
