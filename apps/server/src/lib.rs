pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod events;
pub mod scheduler;
mod main_lib;

pub use main_lib::{build_providers, build_state, build_state_with, init_tracing, AppState};
