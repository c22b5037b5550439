//! Refresh module - the staleness-gated coordinator and its result types.

mod refresh_model;
mod refresh_service;

#[cfg(test)]
mod refresh_service_tests;

pub use refresh_model::{
    DatasetKind, RefreshErrorKind, RefreshResult, RefreshSettings, RefreshSummary,
};
pub use refresh_service::{RefreshCoordinator, RefreshProviders, RefreshStores};
