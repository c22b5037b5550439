//! SQLite storage for provider request counters.

mod model;
mod repository;

pub use model::ApiLimitDB;
pub use repository::ApiLimitRepository;
