//! Coinpulse AI - market article generation using rig-core.
//!
//! - `article_writer`: rig-core agent per provider, deadline, and HTML cleanup
//! - `prompt_template`: versioned prompt rendering the market context
//! - `error`: writer errors and their mapping onto core generation errors

pub mod article_writer;
pub mod error;
pub mod prompt_template;

pub use article_writer::{
    clean_article_html, ArticleWriterConfig, FakeArticleGenerator, LlmArticleWriter, LlmProvider,
    UnconfiguredArticleGenerator, DEFAULT_LLM_TIMEOUT_SECS,
};
pub use error::AiError;
pub use prompt_template::PromptTemplate;
