//! Tareas Frontend App
//!
//! Builds the cache, HTTP client and services once and provides them to
//! every component.

use std::rc::Rc;

use leptos::prelude::*;
use reactive_stores::Store;
use tracing::{info, warn};

use crate::api::{HttpTareas, RestClient};
use crate::cache::QueryClient;
use crate::components::{BugHuntPanel, ProgressList, TareasLista};
use crate::config::ClientConfig;
use crate::context::AppContext;
use crate::services::TareasService;
use crate::store::UiState;

/// Academy progress and the mini-game shown next to the task list
const PLAYER_ID: i64 = 1;
const MODULE_NUMBER: u32 = 1;

fn load_config() -> ClientConfig {
    ClientConfig::from_env().unwrap_or_else(|e| {
        warn!("{}, using defaults", e);
        ClientConfig::default()
    })
}

/// After a 401 the cached data belongs to a session that no longer exists
fn on_session_expired(cache: QueryClient) -> impl Fn() + 'static {
    move || {
        warn!("Session expired, clearing cached data");
        cache.clear();
        #[cfg(target_arch = "wasm32")]
        crate::api::redirect_to_login();
    }
}

#[cfg(target_arch = "wasm32")]
fn rest_client(config: &ClientConfig, cache: &QueryClient) -> RestClient {
    use crate::api::LocalStorageTokenStore;

    RestClient::from_config(config)
        .with_tokens(Rc::new(LocalStorageTokenStore))
        .on_unauthorized(on_session_expired(cache.clone()))
}

#[cfg(not(target_arch = "wasm32"))]
fn rest_client(config: &ClientConfig, cache: &QueryClient) -> RestClient {
    use crate::api::MemoryTokenStore;

    RestClient::from_config(config)
        .with_tokens(Rc::new(MemoryTokenStore::default()))
        .on_unauthorized(on_session_expired(cache.clone()))
}

#[component]
pub fn App() -> impl IntoView {
    let config = load_config();
    info!("API at {}", config.api_url);

    let client = QueryClient::new();
    let rest = rest_client(&config, &client);
    let tareas = TareasService::new(client.clone(), Rc::new(HttpTareas::new(rest.clone())), &config);

    provide_context(AppContext::new(client, rest, tareas, config));
    provide_context(Store::new(UiState::default()));

    view! {
        <div class="app-layout">
            <main class="main-content">
                <h1>"📝 Tareas"</h1>
                <TareasLista />
            </main>
            <aside class="academy-column">
                <ProgressList player_id=PLAYER_ID module_number=MODULE_NUMBER />
                <BugHuntPanel player_id=PLAYER_ID />
            </aside>
        </div>
    }
}
