use std::env;
use std::time::Duration;

const DEFAULT_POLL_INTERVAL_MS: u64 = 100;
const DEFAULT_POLL_ATTEMPTS: u32 = 600;

/// Runtime settings. Absent values are kept as `None` and reported as
/// configuration errors by the component that needs them.
#[derive(Clone, Debug)]
pub struct Config {
    pub kakao_js_key: Option<String>,
    pub backend_url: Option<String>,
    pub poll_interval: Duration,
    pub poll_attempts: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            kakao_js_key: None,
            backend_url: None,
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            poll_attempts: DEFAULT_POLL_ATTEMPTS,
        }
    }
}

impl Config {
    #[tracing::instrument(name = "Config::from_env")]
    pub fn from_env() -> Self {
        if let Err(err) = dotenv::dotenv() {
            tracing::debug!("no .env file loaded: {}", err);
        }

        let poll_interval = env::var("MAP_POLL_INTERVAL_MS")
            .ok()
            .and_then(|v| v.trim().parse().ok())
            .map(Duration::from_millis)
            .unwrap_or_else(|| Duration::from_millis(DEFAULT_POLL_INTERVAL_MS));

        let poll_attempts = env::var("MAP_POLL_ATTEMPTS")
            .ok()
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(DEFAULT_POLL_ATTEMPTS);

        let config = Self {
            kakao_js_key: non_blank(env::var("KAKAO_JS_KEY").ok()),
            backend_url: non_blank(env::var("BACKEND_URL").ok()),
            poll_interval,
            poll_attempts,
        }
        .normalized();

        tracing::info!(
            has_kakao_js_key = config.kakao_js_key.is_some(),
            backend_url = ?config.backend_url,
            "loaded configuration"
        );

        config
    }

    pub fn with_kakao_js_key(mut self, key: impl Into<String>) -> Self {
        self.kakao_js_key = non_blank(Some(key.into()));
        self
    }

    pub fn with_backend_url(mut self, url: impl Into<String>) -> Self {
        self.backend_url = non_blank(Some(url.into()));
        self.normalized()
    }

    fn normalized(mut self) -> Self {
        self.backend_url = self
            .backend_url
            .map(|url| url.trim_end_matches('/').to_string());
        self
    }
}

/// Reads a boolean switch such as `RUN_ONE_WAY`. Only `1`, `true`, `yes` and
/// `on` (any case) turn it on; anything else, including `0` and `false`, is off.
pub fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
