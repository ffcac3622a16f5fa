//! Authentication
//!
//! Token storage and the `/auth` endpoints. The token is attached to
//! requests by `RestClient`; this module only obtains and forgets it.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::info;

use super::client::RestClient;
use crate::cache::QueryClient;
use crate::error::ApiResult;
use crate::models::{AuthResponse, LoginRequest, RegisterRequest, User};

/// Browser storage key of the access token
pub const TOKEN_KEY: &str = "auth_token";

pub trait TokenStore {
    fn get(&self) -> Option<String>;
    fn set(&self, token: &str);
    fn clear(&self);
}

#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: RefCell<Option<String>>,
}

impl TokenStore for MemoryTokenStore {
    fn get(&self) -> Option<String> {
        self.token.borrow().clone()
    }

    fn set(&self, token: &str) {
        *self.token.borrow_mut() = Some(token.to_string());
    }

    fn clear(&self) {
        self.token.borrow_mut().take();
    }
}

/// `localStorage`-backed store
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Default)]
pub struct LocalStorageTokenStore;

#[cfg(target_arch = "wasm32")]
impl LocalStorageTokenStore {
    fn storage() -> Option<web_sys::Storage> {
        web_sys::window()?.local_storage().ok()?
    }
}

#[cfg(target_arch = "wasm32")]
impl TokenStore for LocalStorageTokenStore {
    fn get(&self) -> Option<String> {
        Self::storage()?.get_item(TOKEN_KEY).ok()?
    }

    fn set(&self, token: &str) {
        if let Some(storage) = Self::storage() {
            if storage.set_item(TOKEN_KEY, token).is_err() {
                tracing::warn!("Failed to persist auth token");
            }
        }
    }

    fn clear(&self) {
        if let Some(storage) = Self::storage() {
            let _ = storage.remove_item(TOKEN_KEY);
        }
    }
}

/// Send the browser to the login page unless it is already there
#[cfg(target_arch = "wasm32")]
pub fn redirect_to_login() {
    let Some(window) = web_sys::window() else {
        return;
    };
    let location = window.location();
    let on_login = location
        .pathname()
        .map(|path| path.contains("/login"))
        .unwrap_or(false);
    if !on_login {
        let _ = location.set_href("/login");
    }
}

#[derive(Clone)]
pub struct AuthApi {
    client: RestClient,
    tokens: Rc<dyn TokenStore>,
    cache: Option<QueryClient>,
}

impl AuthApi {
    /// `client` should carry the same token store so requests are authorized
    pub fn new(client: RestClient, tokens: Rc<dyn TokenStore>) -> Self {
        Self {
            client,
            tokens,
            cache: None,
        }
    }

    /// Drop this cache on logout so one user's data never outlives the session
    pub fn with_cache(mut self, cache: QueryClient) -> Self {
        self.cache = Some(cache);
        self
    }

    pub async fn register(&self, request: &RegisterRequest) -> ApiResult<AuthResponse> {
        let response: AuthResponse = self.client.post("/auth/register", &[], request).await?;
        self.tokens.set(&response.access_token);
        info!("Registered {}", response.user.email);
        Ok(response)
    }

    pub async fn login(&self, request: &LoginRequest) -> ApiResult<AuthResponse> {
        let response: AuthResponse = self.client.post("/auth/login", &[], request).await?;
        self.tokens.set(&response.access_token);
        info!("Logged in as {}", response.user.email);
        Ok(response)
    }

    pub async fn current_user(&self) -> ApiResult<User> {
        self.client.get("/auth/me", &[]).await
    }

    pub fn logout(&self) {
        self.tokens.clear();
        if let Some(cache) = &self.cache {
            cache.clear();
        }
        info!("Logged out");
    }

    pub fn is_authenticated(&self) -> bool {
        self.tokens.get().is_some()
    }
}
