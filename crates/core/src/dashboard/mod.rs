//! Dashboard module - read-side queries for the presentation layer.

mod dashboard_service;

pub use dashboard_service::DashboardService;
