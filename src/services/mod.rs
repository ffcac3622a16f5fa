//! Domain Services
//!
//! Each service owns the cache keys of one backend area, registers their
//! fetchers and exposes reads and optimistic mutations.

mod academy;
mod bug_hunt;
mod player;
mod tareas;

pub use academy::*;
pub use bug_hunt::*;
pub use player::*;
pub use tareas::*;
