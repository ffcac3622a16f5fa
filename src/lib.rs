//! Tareas UI
//!
//! Browser client for the Tareas and Academy REST backends, built around a
//! keyed query cache with optimistic mutations.

pub mod api;
pub mod app;
pub mod cache;
pub mod components;
pub mod config;
pub mod context;
pub mod error;
pub mod hooks;
pub mod models;
pub mod mutation;
pub mod resource;
pub mod services;
pub mod store;
pub mod telemetry;
pub mod view_state;

#[cfg(test)]
pub(crate) mod testing;

pub use app::App;
pub use cache::{QueryClient, QueryKey, QueryOptions, QueryState};
pub use error::{ApiError, ApiResult, ErrorKind};
