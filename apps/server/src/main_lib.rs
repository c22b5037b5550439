use std::sync::Arc;

use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use coinpulse_ai::{ArticleWriterConfig, LlmArticleWriter, LlmProvider, UnconfiguredArticleGenerator};
use coinpulse_core::{
    articles::ArticleGenerator,
    dashboard::DashboardService,
    events::InvalidationSink,
    limits::RateLimitTracker,
    market::HistoryService,
    refresh::{RefreshCoordinator, RefreshProviders, RefreshSettings, RefreshStores},
};
use coinpulse_market_data::{CoinGeckoProvider, CoinMarketCapProvider, CryptoCompareProvider};
use coinpulse_storage_sqlite::{
    db, ApiLimitRepository, ArticleRepository, MetadataRepository, SnapshotRepository,
};

use crate::config::{Config, LlmConfig};
use crate::events::EventBus;

pub struct AppState {
    pub coordinator: Arc<RefreshCoordinator>,
    pub dashboard: Arc<DashboardService>,
    pub rate_limiter: Arc<RateLimitTracker>,
    pub event_bus: EventBus,
    pub cron_secret: Option<String>,
}

pub fn init_tracing() {
    let log_format = std::env::var("CP_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init();
    }
}

/// Article generator for the configured LLM, or one that always reports
/// "not configured" when no provider is set.
fn build_generator(llm: &LlmConfig) -> anyhow::Result<Arc<dyn ArticleGenerator>> {
    let Some(provider) = llm.provider.as_deref() else {
        tracing::warn!("CP_LLM_PROVIDER is not set; article generation is disabled");
        return Ok(Arc::new(UnconfiguredArticleGenerator::new(
            "CP_LLM_PROVIDER is not set",
        )));
    };

    let provider: LlmProvider = provider.parse()?;
    let mut writer_config = ArticleWriterConfig::new(provider);
    if let Some(model) = &llm.model {
        writer_config = writer_config.with_model(model.clone());
    }
    if let Some(key) = &llm.api_key {
        writer_config = writer_config.with_api_key(key.clone());
    }
    if let Some(url) = &llm.base_url {
        writer_config = writer_config.with_base_url(url.clone());
    }

    let writer = LlmArticleWriter::new(writer_config)?;
    tracing::info!(
        "Article generation uses {} model {}",
        provider,
        writer.config().model
    );
    Ok(Arc::new(writer))
}

/// Live HTTP providers built from the configured keys.
pub fn build_providers(config: &Config) -> anyhow::Result<RefreshProviders> {
    if config.coinmarketcap_api_key.is_none() {
        tracing::warn!("COINMARKETCAP_API_KEY is not set; metadata refreshes will fail");
    }
    Ok(RefreshProviders {
        market: Arc::new(CoinGeckoProvider::new(config.coingecko_api_key.clone())),
        metadata: Arc::new(CoinMarketCapProvider::new(
            config.coinmarketcap_api_key.clone().unwrap_or_default(),
        )),
        news: Arc::new(CryptoCompareProvider::new(
            config.cryptocompare_api_key.clone(),
        )),
        generator: build_generator(&config.llm)?,
    })
}

pub async fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let providers = build_providers(config)?;
    build_state_with(config, providers).await
}

/// Wire storage, services and the given providers into the shared state.
pub async fn build_state_with(
    config: &Config,
    providers: RefreshProviders,
) -> anyhow::Result<Arc<AppState>> {
    let (pool, writer) = db::open(&config.db_path)?;
    tracing::info!("Database path in use: {}", config.db_path);

    let snapshot_repo = Arc::new(SnapshotRepository::new(pool.clone(), writer.clone()));
    let metadata_repo = Arc::new(MetadataRepository::new(pool.clone(), writer.clone()));
    let article_repo = Arc::new(ArticleRepository::new(pool.clone(), writer.clone()));
    let limit_repo = Arc::new(ApiLimitRepository::new(pool.clone(), writer.clone()));

    let rate_limiter = Arc::new(RateLimitTracker::new(limit_repo));
    for (provider, limit) in &config.daily_limits {
        rate_limiter.configure_limit(provider, *limit).await?;
        tracing::info!("Daily limit for {} set to {}", provider, limit);
    }

    let event_bus = EventBus::new(256);
    let sink: Arc<dyn InvalidationSink> = Arc::new(event_bus.clone());

    let settings = RefreshSettings {
        listing_limit: config.listing_limit,
        ..RefreshSettings::default()
    };

    let history = Arc::new(
        HistoryService::new(providers.market.clone()).with_rate_limiter(rate_limiter.clone()),
    );

    let coordinator = Arc::new(
        RefreshCoordinator::new(
            RefreshStores {
                snapshots: snapshot_repo.clone(),
                metadata: metadata_repo.clone(),
                articles: article_repo.clone(),
            },
            providers,
            rate_limiter.clone(),
            sink,
        )
        .with_settings(settings),
    );

    let dashboard = Arc::new(
        DashboardService::new(snapshot_repo, metadata_repo, article_repo)
            .with_history_service(history),
    );

    if config.cron_secret.is_none() {
        tracing::warn!("CP_CRON_SECRET is not set; cron routes will reject every request");
    }

    Ok(Arc::new(AppState {
        coordinator,
        dashboard,
        rate_limiter,
        event_bus,
        cron_secret: config.cron_secret.clone(),
    }))
}
