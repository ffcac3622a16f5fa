//! Tareas Service

use std::rc::Rc;

use crate::api::{HttpTareas, TareasApi};
use crate::cache::{QueryClient, QueryKey, QueryOptions};
use crate::config::ClientConfig;
use crate::error::ApiResult;
use crate::models::{ActualizarTarea, CrearTarea, Estadisticas, Tarea};
use crate::mutation::Mutations;
use crate::resource::{Collection, Record, RecordId};

pub const TAREAS_KEY: QueryKey<Collection<Tarea>> = QueryKey::new("tareas");
pub const ESTADISTICAS_KEY: QueryKey<Estadisticas> = QueryKey::new("estadisticas");

pub fn tarea_key(id: i64) -> QueryKey<Record<Tarea>> {
    QueryKey::owned(format!("tareas/{}", id))
}

pub struct TareasService<A = HttpTareas> {
    client: QueryClient,
    api: Rc<A>,
    mutations: Mutations<Tarea, A>,
    list_options: QueryOptions,
}

impl<A> Clone for TareasService<A> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            api: self.api.clone(),
            mutations: self.mutations.clone(),
            list_options: self.list_options,
        }
    }
}

impl<A: TareasApi + 'static> TareasService<A> {
    pub fn new(client: QueryClient, api: Rc<A>, config: &ClientConfig) -> Self {
        let list_options = QueryOptions::stale_after(config.list_stale_time());

        let list_api = api.clone();
        client.register(&TAREAS_KEY, list_options, move || {
            let api = list_api.clone();
            async move { api.list().await }
        });
        let stats_api = api.clone();
        client.register(
            &ESTADISTICAS_KEY,
            QueryOptions::stale_after(config.stats_stale_time()),
            move || {
                let api = stats_api.clone();
                async move { api.estadisticas().await }
            },
        );

        let mutations = Mutations::new(client.clone(), api.clone(), TAREAS_KEY)
            .invalidates(ESTADISTICAS_KEY.path());
        Self {
            client,
            api,
            mutations,
            list_options,
        }
    }

    pub fn client(&self) -> &QueryClient {
        &self.client
    }

    pub async fn lista(&self) -> ApiResult<Collection<Tarea>> {
        self.client.fetch(&TAREAS_KEY).await
    }

    /// One task, cached under its own key
    pub async fn tarea(&self, id: i64) -> ApiResult<Record<Tarea>> {
        let key = tarea_key(id);
        let api = self.api.clone();
        self.client.register(&key, self.list_options, move || {
            let api = api.clone();
            async move { api.get(&id).await }
        });
        self.client.fetch(&key).await
    }

    pub async fn estadisticas(&self) -> ApiResult<Estadisticas> {
        self.client.fetch(&ESTADISTICAS_KEY).await
    }

    pub async fn crear(&self, nombre: &str) -> ApiResult<Record<Tarea>> {
        self.mutations
            .create(CrearTarea {
                nombre: nombre.to_string(),
            })
            .await
    }

    /// Flip `completada`
    pub async fn alternar(&self, tarea: &Record<Tarea>) -> ApiResult<Record<Tarea>> {
        self.actualizar(&tarea.id, ActualizarTarea::completada(!tarea.fields.completada))
            .await
    }

    pub async fn actualizar(
        &self,
        id: &RecordId<i64>,
        cambios: ActualizarTarea,
    ) -> ApiResult<Record<Tarea>> {
        self.mutations.update(id, cambios).await
    }

    pub async fn eliminar(&self, id: &RecordId<i64>) -> ApiResult<()> {
        self.mutations.delete(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeResource;

    fn service(tareas: Vec<Tarea>) -> (TareasService<FakeResource<Tarea>>, Rc<FakeResource<Tarea>>) {
        let api = Rc::new(FakeResource::with_records(tareas));
        let service = TareasService::new(QueryClient::new(), api.clone(), &ClientConfig::default());
        (service, api)
    }

    #[tokio::test]
    async fn test_two_reads_one_call() {
        let (service, api) = service(vec![Tarea::new("A")]);
        service.lista().await.unwrap();
        service.lista().await.unwrap();
        assert_eq!(api.calls("list"), 1);
    }

    #[tokio::test]
    async fn test_toggle_flips_and_refreshes_stats() {
        let (service, api) = service(vec![Tarea::new("A")]);
        let tareas = service.lista().await.unwrap();
        let stats = service.estadisticas().await.unwrap();
        assert_eq!(stats.completadas, 0);

        let updated = service.alternar(&tareas[0]).await.unwrap();
        assert!(updated.fields.completada);

        // Not subscribed: stale, refetched on the next read
        assert_eq!(api.calls("estadisticas"), 1);
        assert_eq!(service.estadisticas().await.unwrap().completadas, 1);
        assert_eq!(api.calls("estadisticas"), 2);
    }

    #[tokio::test]
    async fn test_detail_goes_stale_with_collection() {
        let (service, api) = service(vec![Tarea::new("A")]);
        service.tarea(1).await.unwrap();
        service.tarea(1).await.unwrap();
        assert_eq!(api.calls("get"), 1);

        service.lista().await.unwrap();
        service
            .actualizar(&RecordId::Confirmed(1), ActualizarTarea::nombre("B"))
            .await
            .unwrap();
        let detail = service.tarea(1).await.unwrap();
        assert_eq!(detail.fields.nombre, "B");
        assert_eq!(api.calls("get"), 2);
    }
}
