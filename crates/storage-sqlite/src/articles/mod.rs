//! SQLite storage for generated articles.

mod model;
mod repository;

pub use model::GeneratedArticleDB;
pub use repository::ArticleRepository;
