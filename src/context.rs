//! Application Context
//!
//! Shared handles provided via Leptos Context API. The cache and services
//! are single-threaded, so they sit in local storage and the context itself
//! stays `Copy`.

use leptos::prelude::*;

use crate::api::RestClient;
use crate::cache::QueryClient;
use crate::config::ClientConfig;
use crate::services::TareasService;

#[derive(Clone, Copy)]
pub struct AppContext {
    client: StoredValue<QueryClient, LocalStorage>,
    rest: StoredValue<RestClient, LocalStorage>,
    tareas: StoredValue<TareasService, LocalStorage>,
    config: StoredValue<ClientConfig>,
}

impl AppContext {
    pub fn new(client: QueryClient, rest: RestClient, tareas: TareasService, config: ClientConfig) -> Self {
        Self {
            client: StoredValue::new_local(client),
            rest: StoredValue::new_local(rest),
            tareas: StoredValue::new_local(tareas),
            config: StoredValue::new(config),
        }
    }

    pub fn client(&self) -> QueryClient {
        self.client.get_value()
    }

    pub fn rest(&self) -> RestClient {
        self.rest.get_value()
    }

    pub fn tareas(&self) -> TareasService {
        self.tareas.get_value()
    }

    pub fn config(&self) -> ClientConfig {
        self.config.get_value()
    }
}

pub fn use_app_context() -> AppContext {
    expect_context::<AppContext>()
}
