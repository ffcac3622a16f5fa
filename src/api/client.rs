//! REST Client
//!
//! Thin wrapper over `reqwest` that knows the API base URL, attaches the
//! common headers and normalizes every failure into an `ApiError`.

use std::rc::Rc;

use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use super::auth::TokenStore;
use crate::config::ClientConfig;
use crate::error::{ApiError, ApiResult};

/// Query-string pairs appended to a request
pub type Query = [(String, String)];

/// Called after a 401 once the stored token has been cleared
pub type UnauthorizedHook = Rc<dyn Fn()>;

#[derive(Clone)]
pub struct RestClient {
    http: reqwest::Client,
    base_url: String,
    accept_language: Option<String>,
    tokens: Option<Rc<dyn TokenStore>>,
    on_unauthorized: Option<UnauthorizedHook>,
}

impl RestClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            accept_language: None,
            tokens: None,
            on_unauthorized: None,
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        let client = Self::new(&config.api_url);
        match &config.accept_language {
            Some(lang) => client.with_language(lang),
            None => client,
        }
    }

    pub fn with_language(mut self, lang: &str) -> Self {
        self.accept_language = Some(lang.to_string());
        self
    }

    /// Send `Authorization: Bearer <token>` whenever the store holds one
    pub fn with_tokens(mut self, tokens: Rc<dyn TokenStore>) -> Self {
        self.tokens = Some(tokens);
        self
    }

    pub fn on_unauthorized(mut self, hook: impl Fn() + 'static) -> Self {
        self.on_unauthorized = Some(Rc::new(hook));
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // ========================
    // Verbs
    // ========================

    pub async fn get<T: DeserializeOwned>(&self, path: &str, query: &Query) -> ApiResult<T> {
        let body = self.send(self.request(Method::GET, path, query)).await?;
        decode(&body)
    }

    pub async fn post<B, T>(&self, path: &str, query: &Query, payload: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = self
            .send(self.request(Method::POST, path, query).json(payload))
            .await?;
        decode(&body)
    }

    pub async fn patch<B, T>(&self, path: &str, payload: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = self
            .send(self.request(Method::PATCH, path, &[]).json(payload))
            .await?;
        decode(&body)
    }

    pub async fn delete(&self, path: &str) -> ApiResult<()> {
        self.send(self.request(Method::DELETE, path, &[])).await?;
        Ok(())
    }

    // ========================
    // Plumbing
    // ========================

    fn request(&self, method: Method, path: &str, query: &Query) -> RequestBuilder {
        let url = self.url(path);
        debug!("[API] {} {}", method, url);

        let mut request = self
            .http
            .request(method, url)
            .header(reqwest::header::CONTENT_TYPE, "application/json");
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(lang) = &self.accept_language {
            request = request.header(reqwest::header::ACCEPT_LANGUAGE, lang);
        }
        if let Some(token) = self.tokens.as_ref().and_then(|t| t.get()) {
            request = request.bearer_auth(token);
        }
        request
    }

    /// Execute and return the body of a 2xx response
    async fn send(&self, request: RequestBuilder) -> ApiResult<String> {
        let response = request.send().await.map_err(|e| {
            warn!("[API] Request error: {}", e);
            ApiError::network(e.to_string())
        })?;
        let status = response.status();
        debug!("[API] Response: {}", status.as_u16());

        let body = response.text().await.map_err(ApiError::from)?;
        if status.is_success() {
            return Ok(body);
        }

        if status == StatusCode::UNAUTHORIZED {
            self.handle_unauthorized();
        }
        let err = ApiError::from_body(status.as_u16(), &body);
        warn!("[API] Response error: {} {}", status.as_u16(), err);
        Err(err)
    }

    fn handle_unauthorized(&self) {
        if let Some(tokens) = &self.tokens {
            tokens.clear();
        }
        if let Some(hook) = &self.on_unauthorized {
            hook();
        }
    }
}

/// Empty bodies decode as JSON `null`, which covers `()` and `Option<T>`
fn decode<T: DeserializeOwned>(body: &str) -> ApiResult<T> {
    let body = if body.trim().is_empty() { "null" } else { body };
    serde_json::from_str(body).map_err(|e| ApiError::decode(format!("Invalid response body: {}", e)))
}
