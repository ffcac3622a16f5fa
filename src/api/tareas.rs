//! Tareas Endpoints

use async_trait::async_trait;

use super::client::RestClient;
use super::resource::{HttpResource, ResourceApi};
use crate::error::ApiResult;
use crate::models::{ActualizarTarea, CrearTarea, Estadisticas, Tarea};
use crate::resource::{Collection, Record};

/// Resource access plus the statistics endpoint
#[async_trait(?Send)]
pub trait TareasApi: ResourceApi<Tarea> {
    async fn estadisticas(&self) -> ApiResult<Estadisticas>;
}

#[derive(Clone)]
pub struct HttpTareas {
    resource: HttpResource<Tarea>,
}

impl HttpTareas {
    pub fn new(client: RestClient) -> Self {
        Self {
            resource: HttpResource::new(client),
        }
    }
}

#[async_trait(?Send)]
impl ResourceApi<Tarea> for HttpTareas {
    async fn list(&self) -> ApiResult<Collection<Tarea>> {
        self.resource.list().await
    }

    async fn get(&self, id: &i64) -> ApiResult<Record<Tarea>> {
        self.resource.get(id).await
    }

    async fn create(&self, draft: &CrearTarea) -> ApiResult<Record<Tarea>> {
        self.resource.create(draft).await
    }

    async fn update(&self, id: &i64, patch: &ActualizarTarea) -> ApiResult<Record<Tarea>> {
        self.resource.update(id, patch).await
    }

    async fn delete(&self, id: &i64) -> ApiResult<()> {
        self.resource.delete(id).await
    }
}

#[async_trait(?Send)]
impl TareasApi for HttpTareas {
    async fn estadisticas(&self) -> ApiResult<Estadisticas> {
        self.resource.client().get("/tareas/stats", &[]).await
    }
}
