//! Configuration management for Label Lens Server

use std::env;
use std::time::Duration;

/// Origins allowed to call the API when `ALLOWED_ORIGINS` is unset
pub const DEFAULT_ALLOWED_ORIGINS: &[&str] = &[
    "http://localhost:5173",
    "http://127.0.0.1:8000",
    "https://ingredienthealthcheck.netlify.app",
    "https://healthcheck-backend-g2hd.onrender.com",
];

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub vision: VisionConfig,
    pub completion: CompletionConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Upper bound on a multipart request body
    pub max_upload_bytes: usize,
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct VisionConfig {
    /// Base64-encoded service-account JSON, preferred when present
    pub credentials_json: Option<String>,
    /// Path to a service-account key file
    pub credentials_path: Option<String>,
    /// Plain API key, used only when no service account resolves
    pub api_key: Option<String>,
    pub endpoint: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct CompletionConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8000,
                max_upload_bytes: 20 * 1024 * 1024,
                allowed_origins: DEFAULT_ALLOWED_ORIGINS
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            },
            vision: VisionConfig {
                credentials_json: None,
                credentials_path: None,
                api_key: None,
                endpoint: "https://vision.googleapis.com".to_string(),
                timeout: Duration::from_secs(30),
            },
            completion: CompletionConfig {
                api_key: None,
                base_url: "https://api.openai.com/v1".to_string(),
                model: "gpt-4o".to_string(),
                timeout: Duration::from_secs(60),
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary variable source.
    ///
    /// Blank values count as unset and unparsable numbers fall back to the
    /// defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Config::default();

        let port = var("SERVER_PORT")
            .or_else(|| var("PORT"))
            .and_then(|p| p.parse().ok())
            .unwrap_or(defaults.server.port);

        let allowed_origins = var("ALLOWED_ORIGINS")
            .map(|raw| parse_origins(&raw))
            .filter(|origins| !origins.is_empty())
            .unwrap_or(defaults.server.allowed_origins);

        Config {
            server: ServerConfig {
                host: var("SERVER_HOST").unwrap_or(defaults.server.host),
                port,
                max_upload_bytes: var("MAX_UPLOAD_BYTES")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.server.max_upload_bytes),
                allowed_origins,
            },
            vision: VisionConfig {
                credentials_json: var("GOOGLE_APPLICATION_CREDENTIALS_JSON"),
                credentials_path: var("GOOGLE_APPLICATION_CREDENTIALS"),
                api_key: var("GOOGLE_VISION_API_KEY"),
                endpoint: var("VISION_API_ENDPOINT").unwrap_or(defaults.vision.endpoint),
                timeout: var("VISION_TIMEOUT_SECONDS")
                    .and_then(|v| v.parse().ok())
                    .map(Duration::from_secs)
                    .unwrap_or(defaults.vision.timeout),
            },
            completion: CompletionConfig {
                api_key: var("OPENAI_API_KEY"),
                base_url: var("OPENAI_BASE_URL").unwrap_or(defaults.completion.base_url),
                model: var("OPENAI_MODEL").unwrap_or(defaults.completion.model),
                timeout: var("OPENAI_TIMEOUT_SECONDS")
                    .and_then(|v| v.parse().ok())
                    .map(Duration::from_secs)
                    .unwrap_or(defaults.completion.timeout),
            },
        }
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|origin| origin.trim().trim_end_matches('/'))
        .filter(|origin| !origin.is_empty())
        .map(String::from)
        .collect()
}
