//! Remote Data Access
//!
//! Async wrappers over the REST backend, organized by domain.

mod academy;
mod auth;
mod bug_hunt;
mod client;
mod player;
mod resource;
mod tareas;


// Re-export all public items
pub use academy::*;
pub use auth::*;
pub use bug_hunt::*;
pub use client::*;
pub use player::*;
pub use resource::*;
pub use tareas::*;
