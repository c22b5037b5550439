use std::collections::HashMap;
use std::{net::SocketAddr, time::Duration};

use anyhow::Context;

use coinpulse_core::constants::{
    DEFAULT_LISTING_LIMIT, PROVIDER_COINGECKO, PROVIDER_COINMARKETCAP, PROVIDER_CRYPTOCOMPARE,
    PROVIDER_LLM,
};

/// Providers whose daily limit can be set with `CP_LIMIT_<PROVIDER>`.
pub const LIMITED_PROVIDERS: [&str; 4] = [
    PROVIDER_COINGECKO,
    PROVIDER_COINMARKETCAP,
    PROVIDER_CRYPTOCOMPARE,
    PROVIDER_LLM,
];

#[derive(Clone, Debug, Default)]
pub struct LlmConfig {
    /// `openai`, `anthropic`, `groq`, `gemini` or `ollama`. Unset disables generation.
    pub provider: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub db_path: String,
    pub cors_allow: Vec<String>,
    pub request_timeout: Duration,
    /// Bearer secret for the cron routes. Unset rejects every cron call.
    pub cron_secret: Option<String>,
    pub scheduler_enabled: bool,
    pub scheduler_interval: Duration,
    pub listing_limit: usize,
    pub coingecko_api_key: Option<String>,
    pub coinmarketcap_api_key: Option<String>,
    pub cryptocompare_api_key: Option<String>,
    pub llm: LlmConfig,
    /// Daily request limits keyed by provider id.
    pub daily_limits: HashMap<String, i32>,
}

impl Config {
    /// Read configuration from the process environment, loading `.env` first.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let listen_addr: SocketAddr = var("CP_LISTEN_ADDR")
            .unwrap_or_else(|| "0.0.0.0:8080".to_string())
            .parse()
            .context("Invalid CP_LISTEN_ADDR")?;
        let db_path = var("CP_DB_PATH").unwrap_or_else(|| "./db/app.db".into());
        let cors_allow = var("CP_CORS_ALLOW_ORIGINS")
            .unwrap_or_else(|| "*".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        let timeout_ms: u64 = var("CP_REQUEST_TIMEOUT_MS")
            .and_then(|v| v.parse().ok())
            .unwrap_or(30000);
        let scheduler_enabled = var("CP_SCHEDULER_ENABLED")
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
            .unwrap_or(false);
        let scheduler_secs: u64 = var("CP_SCHEDULER_INTERVAL_SECS")
            .and_then(|v| v.parse().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(300);
        let listing_limit: usize = match var("CP_LISTING_LIMIT") {
            Some(v) => v.parse().context("Invalid CP_LISTING_LIMIT")?,
            None => DEFAULT_LISTING_LIMIT,
        };

        let mut daily_limits = HashMap::new();
        for provider in LIMITED_PROVIDERS {
            let key = format!("CP_LIMIT_{}", provider.to_ascii_uppercase());
            if let Some(v) = var(key.as_str()) {
                let limit: i32 = v.parse().with_context(|| format!("Invalid {}", key))?;
                daily_limits.insert(provider.to_string(), limit);
            }
        }

        Ok(Self {
            listen_addr,
            db_path,
            cors_allow,
            request_timeout: Duration::from_millis(timeout_ms),
            cron_secret: var("CP_CRON_SECRET"),
            scheduler_enabled,
            scheduler_interval: Duration::from_secs(scheduler_secs),
            listing_limit,
            coingecko_api_key: var("COINGECKO_API_KEY"),
            coinmarketcap_api_key: var("COINMARKETCAP_API_KEY"),
            cryptocompare_api_key: var("CRYPTOCOMPARE_API_KEY"),
            llm: LlmConfig {
                provider: var("CP_LLM_PROVIDER"),
                model: var("CP_LLM_MODEL"),
                api_key: var("CP_LLM_API_KEY"),
                base_url: var("CP_LLM_BASE_URL"),
            },
            daily_limits,
        })
    }
}
