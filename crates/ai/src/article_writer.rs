//! LLM-backed article generator.
//!
//! Builds a rig-core agent for the configured provider, renders the market
//! context through the prompt template, and cleans the reply into an HTML
//! fragment.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info};
use reqwest::Client as HttpClient;
use rig::{
    client::{CompletionClient, Nothing},
    completion::Prompt,
    providers::{anthropic, gemini, groq, ollama, openai},
};
use serde::{Deserialize, Serialize};

use coinpulse_core::articles::{ArticleContext, ArticleGenerator, GenerationError};
use coinpulse_core::constants::PROVIDER_LLM;

use crate::error::AiError;
use crate::prompt_template::PromptTemplate;

/// Deadline for one completion call.
pub const DEFAULT_LLM_TIMEOUT_SECS: u64 = 60;

/// Supported completion providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    OpenAi,
    Anthropic,
    Groq,
    Gemini,
    Ollama,
}

impl LlmProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            LlmProvider::OpenAi => "openai",
            LlmProvider::Anthropic => "anthropic",
            LlmProvider::Groq => "groq",
            LlmProvider::Gemini => "gemini",
            LlmProvider::Ollama => "ollama",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            LlmProvider::OpenAi => "gpt-4o-mini",
            LlmProvider::Anthropic => "claude-3-5-haiku-latest",
            LlmProvider::Groq => "llama-3.3-70b-versatile",
            LlmProvider::Gemini => "gemini-2.0-flash",
            LlmProvider::Ollama => "llama3.2",
        }
    }

    pub fn requires_api_key(&self) -> bool {
        !matches!(self, LlmProvider::Ollama)
    }
}

impl fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LlmProvider {
    type Err = AiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(LlmProvider::OpenAi),
            "anthropic" => Ok(LlmProvider::Anthropic),
            "groq" => Ok(LlmProvider::Groq),
            "gemini" | "google" => Ok(LlmProvider::Gemini),
            "ollama" => Ok(LlmProvider::Ollama),
            other => Err(AiError::UnsupportedProvider(other.to_string())),
        }
    }
}

/// Configuration for [`LlmArticleWriter`].
#[derive(Debug, Clone)]
pub struct ArticleWriterConfig {
    pub provider: LlmProvider,
    pub model: String,
    pub api_key: Option<String>,
    /// Overrides the provider endpoint (OpenAI-compatible gateways, remote Ollama).
    pub base_url: Option<String>,
    pub timeout_secs: u64,
    pub temperature: f64,
    pub max_tokens: u64,
}

impl ArticleWriterConfig {
    pub fn new(provider: LlmProvider) -> Self {
        Self {
            provider,
            model: provider.default_model().to_string(),
            api_key: None,
            base_url: None,
            timeout_secs: DEFAULT_LLM_TIMEOUT_SECS,
            temperature: 0.4,
            max_tokens: 1200,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// Article generator backed by a hosted or local LLM.
pub struct LlmArticleWriter {
    config: ArticleWriterConfig,
    template: PromptTemplate,
}

impl LlmArticleWriter {
    pub fn new(config: ArticleWriterConfig) -> Result<Self, AiError> {
        if config.model.trim().is_empty() {
            return Err(AiError::InvalidInput("LLM model must not be empty".into()));
        }
        let has_key = config
            .api_key
            .as_deref()
            .is_some_and(|k| !k.trim().is_empty());
        if config.provider.requires_api_key() && !has_key {
            return Err(AiError::MissingApiKey(config.provider.to_string()));
        }
        if config.timeout_secs == 0 {
            return Err(AiError::InvalidInput("LLM timeout must be positive".into()));
        }
        Ok(Self {
            config,
            template: PromptTemplate::market_summary(),
        })
    }

    pub fn with_template(mut self, template: PromptTemplate) -> Self {
        self.template = template;
        self
    }

    pub fn config(&self) -> &ArticleWriterConfig {
        &self.config
    }

    fn api_key(&self) -> Result<String, AiError> {
        self.config
            .api_key
            .clone()
            .ok_or_else(|| AiError::MissingApiKey(self.config.provider.to_string()))
    }

    async fn complete(&self, prompt: &str) -> Result<String, AiError> {
        let model_id = self.config.model.as_str();
        let preamble = self.template.system.as_str();
        let temperature = self.config.temperature;
        let max_tokens = self.config.max_tokens;

        macro_rules! prompt_agent {
            ($client:expr) => {{
                $client
                    .agent(model_id)
                    .preamble(preamble)
                    .temperature(temperature)
                    .max_tokens(max_tokens)
                    .build()
                    .prompt(prompt)
                    .await
                    .map_err(|e| AiError::Provider(e.to_string()))
            }};
        }

        match self.config.provider {
            LlmProvider::Anthropic => {
                let client: anthropic::Client<HttpClient> =
                    anthropic::Client::new(&self.api_key()?).map_err(AiError::provider_err)?;
                prompt_agent!(client)
            }
            LlmProvider::Gemini => {
                let client: gemini::Client<HttpClient> =
                    gemini::Client::new(&self.api_key()?).map_err(AiError::provider_err)?;
                prompt_agent!(client)
            }
            LlmProvider::Groq => {
                let client: groq::Client<HttpClient> =
                    groq::Client::new(&self.api_key()?).map_err(AiError::provider_err)?;
                prompt_agent!(client)
            }
            LlmProvider::Ollama => {
                let mut builder = ollama::Client::<HttpClient>::builder().api_key(Nothing);
                if let Some(url) = &self.config.base_url {
                    builder = builder.base_url(url);
                }
                let client = builder.build().map_err(AiError::provider_err)?;
                prompt_agent!(client)
            }
            LlmProvider::OpenAi => {
                // Completions API, so OpenAI-compatible gateways work too
                let key = self.api_key()?;
                let mut builder = openai::CompletionsClient::<HttpClient>::builder().api_key(&key);
                if let Some(url) = &self.config.base_url {
                    builder = builder.base_url(url);
                }
                let client = builder.build().map_err(AiError::provider_err)?;
                prompt_agent!(client)
            }
        }
    }

    /// Render, call the model within the deadline, and clean the reply.
    pub async fn write(&self, context: &ArticleContext) -> Result<String, AiError> {
        let prompt = self.template.render(context);
        debug!(
            "Writing article with {} model {} ({} prompt chars)",
            self.config.provider,
            self.config.model,
            prompt.len()
        );

        let secs = self.config.timeout_secs;
        let raw = tokio::time::timeout(Duration::from_secs(secs), self.complete(&prompt))
            .await
            .map_err(|_| AiError::Timeout(secs))??;

        let html = clean_article_html(&raw).ok_or(AiError::EmptyResponse)?;
        info!(
            "{} wrote a {} char article",
            self.config.provider,
            html.len()
        );
        Ok(html)
    }
}

#[async_trait]
impl ArticleGenerator for LlmArticleWriter {
    fn id(&self) -> &'static str {
        PROVIDER_LLM
    }

    async fn generate(&self, context: &ArticleContext) -> Result<String, GenerationError> {
        self.write(context).await.map_err(GenerationError::from)
    }
}

/// Generator used when no LLM is configured. Every call fails as
/// not configured, so the article dataset reports a provider error.
pub struct UnconfiguredArticleGenerator {
    reason: String,
}

impl UnconfiguredArticleGenerator {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl ArticleGenerator for UnconfiguredArticleGenerator {
    fn id(&self) -> &'static str {
        PROVIDER_LLM
    }

    async fn generate(&self, _context: &ArticleContext) -> Result<String, GenerationError> {
        Err(GenerationError::NotConfigured(self.reason.clone()))
    }
}

// ============================================================================
// Output Cleanup
// ============================================================================

/// Turn a model reply into an HTML fragment.
///
/// Drops `<think>` blocks and code fences, unwraps a full document down to
/// its body, and wraps plain-text paragraphs in `<p>`. Returns `None` when
/// nothing is left.
pub fn clean_article_html(raw: &str) -> Option<String> {
    let mut text = strip_think_blocks(raw);
    text = strip_code_fence(text.trim()).to_string();

    if let Some(body) = extract_between(&text, "<body", "</body>") {
        text = body;
    }

    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if text.contains('<') && text.contains('>') {
        return Some(text.to_string());
    }

    let paragraphs: Vec<String> = text
        .split("\n\n")
        .map(|p| p.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|p| !p.is_empty())
        .map(|p| format!("<p>{}</p>", escape_html(&p)))
        .collect();
    if paragraphs.is_empty() {
        None
    } else {
        Some(paragraphs.join("\n"))
    }
}

fn strip_think_blocks(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(start) = rest.find("<think>") {
        out.push_str(&rest[..start]);
        match rest[start..].find("</think>") {
            Some(end) => rest = &rest[start + end + "</think>".len()..],
            None => {
                rest = "";
                break;
            }
        }
    }
    out.push_str(rest);
    out
}

fn strip_code_fence(text: &str) -> &str {
    let Some(inner) = text.strip_prefix("```") else {
        return text;
    };
    // Skip the language tag line
    let inner = match inner.find('\n') {
        Some(pos) => &inner[pos + 1..],
        None => inner,
    };
    inner.trim_end().strip_suffix("```").unwrap_or(inner)
}

/// Content between the end of the `open` tag and `close`.
fn extract_between(text: &str, open: &str, close: &str) -> Option<String> {
    let lower = text.to_ascii_lowercase();
    let start = lower.find(open)?;
    let content_start = start + lower[start..].find('>')? + 1;
    let end = lower[content_start..].find(close)? + content_start;
    Some(text[content_start..end].to_string())
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

// ============================================================================
// Fake Generator for Testing
// ============================================================================

/// A deterministic generator for tests and local runs without an LLM.
pub struct FakeArticleGenerator {
    /// Fixed content to return, or `None` to summarize the context.
    pub fixed_content: Option<String>,
    calls: AtomicUsize,
}

impl FakeArticleGenerator {
    pub fn with_content(content: &str) -> Self {
        Self {
            fixed_content: Some(content.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn summarizing() -> Self {
        Self {
            fixed_content: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ArticleGenerator for FakeArticleGenerator {
    fn id(&self) -> &'static str {
        PROVIDER_LLM
    }

    async fn generate(&self, context: &ArticleContext) -> Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(content) = &self.fixed_content {
            return Ok(content.clone());
        }

        let mut html = format!(
            "<h2>Crypto market at {} UTC</h2>",
            context.generated_at.format("%H:%M")
        );
        for coin in context.top_movers(3) {
            html.push_str(&format!(
                "<p><strong>{}</strong> moved {:+.2}% to ${}.</p>",
                escape_html(&coin.name),
                coin.change_percent_24h,
                coin.price.round_dp(2)
            ));
        }
        if let Some(item) = context.headlines.first() {
            html.push_str(&format!("<p>In the news: {}</p>", escape_html(&item.title)));
        }
        Ok(html)
    }
}
