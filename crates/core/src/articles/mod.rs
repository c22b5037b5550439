//! Generated market articles - model, store trait, and the generator contract.

mod articles_model;
mod articles_traits;

pub use articles_model::{ArticleContext, GeneratedArticle};
pub use articles_traits::{ArticleGenerator, ArticleRepositoryTrait, GenerationError};
