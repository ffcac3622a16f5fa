//! Academy Endpoints
//!
//! Progress records are listed per player and module, and every call that
//! touches course content is scoped with `course_id`.

use async_trait::async_trait;
use serde::Deserialize;

use super::client::RestClient;
use super::resource::{HttpResource, ResourceApi};
use crate::error::ApiResult;
use crate::models::{CourseProgress, NextClass, PlayerStats, Progress, ProgressCreate, ProgressUpdate};
use crate::resource::{Collection, Record};

#[async_trait(?Send)]
pub trait AcademyApi: ResourceApi<Progress> {
    async fn player_stats(&self, player_id: i64) -> ApiResult<PlayerStats>;

    /// Every module of the course with per-class status
    async fn course_progress(&self, player_id: i64) -> ApiResult<CourseProgress>;

    /// `None` once the curriculum is complete
    async fn next_unlockable(&self, player_id: i64) -> ApiResult<Option<NextClass>>;
}

/// Progress of one player in one module
#[derive(Clone)]
pub struct HttpModuleProgress {
    resource: HttpResource<Progress>,
    course: Vec<(String, String)>,
}

impl HttpModuleProgress {
    pub fn new(client: RestClient, course_id: &str, player_id: i64, module_number: u32) -> Self {
        let resource = HttpResource::new(client)
            .with_list_path(format!("/progress/{}/module/{}", player_id, module_number))
            .with_create_path("/progress/")
            .with_query("course_id", course_id);
        Self {
            resource,
            course: vec![("course_id".to_string(), course_id.to_string())],
        }
    }
}

/// The backend answers with null coordinates when nothing is left
#[derive(Deserialize)]
struct NextUnlockableBody {
    module_number: Option<u32>,
    class_number: Option<u32>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    xp_reward: Option<u32>,
}

impl NextUnlockableBody {
    fn into_next(self) -> Option<NextClass> {
        Some(NextClass {
            module_number: self.module_number?,
            class_number: self.class_number?,
            title: self.title.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            xp_reward: self.xp_reward.unwrap_or(0),
        })
    }
}

#[async_trait(?Send)]
impl ResourceApi<Progress> for HttpModuleProgress {
    async fn list(&self) -> ApiResult<Collection<Progress>> {
        self.resource.list().await
    }

    async fn get(&self, id: &i64) -> ApiResult<Record<Progress>> {
        self.resource.get(id).await
    }

    async fn create(&self, draft: &ProgressCreate) -> ApiResult<Record<Progress>> {
        self.resource.create(draft).await
    }

    async fn update(&self, id: &i64, patch: &ProgressUpdate) -> ApiResult<Record<Progress>> {
        self.resource.update(id, patch).await
    }

    async fn delete(&self, id: &i64) -> ApiResult<()> {
        self.resource.delete(id).await
    }
}

#[async_trait(?Send)]
impl AcademyApi for HttpModuleProgress {
    async fn player_stats(&self, player_id: i64) -> ApiResult<PlayerStats> {
        let path = format!("/player/{}/stats", player_id);
        self.resource.client().get(&path, &[]).await
    }

    async fn course_progress(&self, player_id: i64) -> ApiResult<CourseProgress> {
        let path = format!("/progress/{}", player_id);
        self.resource.client().get(&path, &self.course).await
    }

    async fn next_unlockable(&self, player_id: i64) -> ApiResult<Option<NextClass>> {
        let path = format!("/progress/{}/next-unlockable", player_id);
        let body: Option<NextUnlockableBody> = self.resource.client().get(&path, &self.course).await?;
        Ok(body.and_then(NextUnlockableBody::into_next))
    }
}
