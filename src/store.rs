//! UI State Store
//!
//! Client-only state that never reaches the backend. Server data lives in
//! the query cache.

use leptos::prelude::*;
use reactive_stores::Store;

use crate::models::Tarea;
use crate::resource::Record;

#[derive(Clone, Debug, Default, Store)]
pub struct UiState {
    /// Task open in the edit modal
    pub editing: Option<Record<Tarea>>,
    /// Message of the last failed mutation
    pub mutation_error: Option<String>,
}

pub type UiStore = Store<UiState>;

pub fn use_ui_store() -> UiStore {
    expect_context::<UiStore>()
}

// ========================
// Store Helper Functions
// ========================

pub fn store_start_editing(store: &UiStore, tarea: Record<Tarea>) {
    store.editing().set(Some(tarea));
}

pub fn store_stop_editing(store: &UiStore) {
    store.editing().set(None);
}

pub fn store_set_error(store: &UiStore, message: Option<String>) {
    store.mutation_error().set(message);
}
