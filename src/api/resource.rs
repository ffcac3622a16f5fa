//! Resource Endpoints
//!
//! One HTTP call per logical operation. No retries and no caching here.

use std::marker::PhantomData;

use async_trait::async_trait;

use super::client::RestClient;
use crate::error::ApiResult;
use crate::resource::{Collection, Record, Resource};

/// CRUD access to one backend collection
#[async_trait(?Send)]
pub trait ResourceApi<R: Resource> {
    async fn list(&self) -> ApiResult<Collection<R>>;
    async fn get(&self, id: &R::Id) -> ApiResult<Record<R>>;
    async fn create(&self, draft: &R::Draft) -> ApiResult<Record<R>>;
    async fn update(&self, id: &R::Id, patch: &R::Patch) -> ApiResult<Record<R>>;
    async fn delete(&self, id: &R::Id) -> ApiResult<()>;
}

/// `ResourceApi` over REST paths derived from `R::PATH`
#[derive(Clone)]
pub struct HttpResource<R> {
    client: RestClient,
    list_path: String,
    create_path: String,
    query: Vec<(String, String)>,
    _marker: PhantomData<fn() -> R>,
}

impl<R: Resource> HttpResource<R> {
    pub fn new(client: RestClient) -> Self {
        Self {
            client,
            list_path: R::PATH.to_string(),
            create_path: R::PATH.to_string(),
            query: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// List from a scoped path such as `/progress/7/module/1`
    pub fn with_list_path(mut self, path: impl Into<String>) -> Self {
        self.list_path = path.into();
        self
    }

    pub fn with_create_path(mut self, path: impl Into<String>) -> Self {
        self.create_path = path.into();
        self
    }

    /// Query parameter sent with list and create calls
    pub fn with_query(mut self, key: &str, value: &str) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn client(&self) -> &RestClient {
        &self.client
    }

    fn item_path(id: &R::Id) -> String {
        format!("{}/{}", R::PATH, id)
    }
}

#[async_trait(?Send)]
impl<R: Resource> ResourceApi<R> for HttpResource<R> {
    async fn list(&self) -> ApiResult<Collection<R>> {
        self.client.get(&self.list_path, &self.query).await
    }

    async fn get(&self, id: &R::Id) -> ApiResult<Record<R>> {
        self.client.get(&Self::item_path(id), &[]).await
    }

    async fn create(&self, draft: &R::Draft) -> ApiResult<Record<R>> {
        self.client.post(&self.create_path, &self.query, draft).await
    }

    async fn update(&self, id: &R::Id, patch: &R::Patch) -> ApiResult<Record<R>> {
        self.client.patch(&Self::item_path(id), patch).await
    }

    async fn delete(&self, id: &R::Id) -> ApiResult<()> {
        self.client.delete(&Self::item_path(id)).await
    }
}
