//! Academy Service
//!
//! Progress of one player through one module of a course.

use std::rc::Rc;

use crate::api::{AcademyApi, HttpModuleProgress, RestClient};
use crate::cache::{QueryClient, QueryKey, QueryOptions};
use crate::config::ClientConfig;
use crate::error::{ApiError, ApiResult};
use crate::models::{
    CourseProgress, NextClass, PlayerStats, Progress, ProgressCreate, ProgressStatus, ProgressUpdate,
};
use crate::mutation::Mutations;
use crate::resource::{Collection, Record};

pub fn module_progress_key(player_id: i64, module_number: u32) -> QueryKey<Collection<Progress>> {
    QueryKey::owned(format!("progress/{}/module/{}", player_id, module_number))
}

pub fn player_stats_key(player_id: i64) -> QueryKey<PlayerStats> {
    QueryKey::owned(format!("player/{}/stats", player_id))
}

pub fn course_progress_key(player_id: i64) -> QueryKey<CourseProgress> {
    QueryKey::owned(format!("progress/{}/overview", player_id))
}

pub fn next_unlockable_key(player_id: i64) -> QueryKey<Option<NextClass>> {
    QueryKey::owned(format!("progress/{}/next-unlockable", player_id))
}

pub struct AcademyService<A = HttpModuleProgress> {
    client: QueryClient,
    player_id: i64,
    module_number: u32,
    mutations: Mutations<Progress, A>,
}

impl<A> Clone for AcademyService<A> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            player_id: self.player_id,
            module_number: self.module_number,
            mutations: self.mutations.clone(),
        }
    }
}

impl AcademyService<HttpModuleProgress> {
    pub fn connect(
        client: QueryClient,
        rest: RestClient,
        config: &ClientConfig,
        player_id: i64,
        module_number: u32,
    ) -> Self {
        let api = HttpModuleProgress::new(rest, &config.course_id, player_id, module_number);
        Self::new(client, Rc::new(api), config, player_id, module_number)
    }
}

impl<A: AcademyApi + 'static> AcademyService<A> {
    pub fn new(
        client: QueryClient,
        api: Rc<A>,
        config: &ClientConfig,
        player_id: i64,
        module_number: u32,
    ) -> Self {
        let progress_key = module_progress_key(player_id, module_number);
        let stats_key = player_stats_key(player_id);

        let list_api = api.clone();
        client.register(
            &progress_key,
            QueryOptions::stale_after(config.list_stale_time()),
            move || {
                let api = list_api.clone();
                async move { api.list().await }
            },
        );
        let stats_api = api.clone();
        client.register(
            &stats_key,
            QueryOptions::stale_after(config.stats_stale_time()),
            move || {
                let api = stats_api.clone();
                async move { api.player_stats(player_id).await }
            },
        );

        let overview_key = course_progress_key(player_id);
        let overview_api = api.clone();
        client.register(
            &overview_key,
            QueryOptions::stale_after(config.stats_stale_time()),
            move || {
                let api = overview_api.clone();
                async move { api.course_progress(player_id).await }
            },
        );
        let next_key = next_unlockable_key(player_id);
        let next_api = api.clone();
        client.register(
            &next_key,
            QueryOptions::stale_after(config.stats_stale_time()),
            move || {
                let api = next_api.clone();
                async move { api.next_unlockable(player_id).await }
            },
        );

        // Any class change moves the player's aggregates
        let mutations = Mutations::new(client.clone(), api, progress_key)
            .invalidates(stats_key.path())
            .invalidates(overview_key.path())
            .invalidates(next_key.path());
        Self {
            client,
            player_id,
            module_number,
            mutations,
        }
    }

    pub fn client(&self) -> &QueryClient {
        &self.client
    }

    pub fn progress_key(&self) -> QueryKey<Collection<Progress>> {
        self.mutations.key().clone()
    }

    pub async fn progress(&self) -> ApiResult<Collection<Progress>> {
        self.client.fetch(self.mutations.key()).await
    }

    pub async fn stats(&self) -> ApiResult<PlayerStats> {
        self.client.fetch(&player_stats_key(self.player_id)).await
    }

    pub async fn course_progress(&self) -> ApiResult<CourseProgress> {
        self.client.fetch(&course_progress_key(self.player_id)).await
    }

    pub async fn next_unlockable(&self) -> ApiResult<Option<NextClass>> {
        self.client.fetch(&next_unlockable_key(self.player_id)).await
    }

    /// Open a class of this module for the player
    pub async fn unlock(&self, class_number: u32) -> ApiResult<Record<Progress>> {
        self.mutations
            .create(ProgressCreate {
                player_id: self.player_id,
                module_number: self.module_number,
                class_number,
                status: ProgressStatus::Unlocked,
            })
            .await
    }

    /// Move a class one step forward: unlocked → in progress → completed
    pub async fn advance(&self, progress: &Record<Progress>) -> ApiResult<Record<Progress>> {
        let next = progress.fields.status.next().ok_or_else(|| {
            ApiError::validation(format!(
                "Class {} cannot advance from {}",
                progress.fields.class_number,
                progress.fields.status.as_str()
            ))
        })?;
        self.mutations
            .update(
                &progress.id,
                ProgressUpdate {
                    status: Some(next),
                    ..Default::default()
                },
            )
            .await
    }

    pub async fn record_exercises(
        &self,
        progress: &Record<Progress>,
        exercises_completed: u32,
    ) -> ApiResult<Record<Progress>> {
        self.mutations
            .update(
                &progress.id,
                ProgressUpdate {
                    exercises_completed: Some(exercises_completed),
                    ..Default::default()
                },
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::testing::FakeResource;

    fn class(number: u32, status: ProgressStatus) -> Progress {
        Progress {
            player_id: 7,
            module_number: 1,
            class_number: number,
            status,
            exercises_completed: 0,
            started_at: None,
            completed_at: None,
            last_accessed_at: None,
        }
    }

    fn service(classes: Vec<Progress>) -> (AcademyService<FakeResource<Progress>>, Rc<FakeResource<Progress>>) {
        let api = Rc::new(FakeResource::with_records(classes));
        let service = AcademyService::new(QueryClient::new(), api.clone(), &ClientConfig::default(), 7, 1);
        (service, api)
    }

    #[test]
    fn test_keys_are_scoped_by_player_and_module() {
        assert_eq!(module_progress_key(7, 2).path(), "progress/7/module/2");
        assert_eq!(player_stats_key(7).path(), "player/7/stats");
        assert_eq!(course_progress_key(7).path(), "progress/7/overview");
    }

    #[tokio::test]
    async fn test_advance_completes_class_and_refreshes_stats() {
        let (service, api) = service(vec![class(1, ProgressStatus::InProgress)]);
        let progress = service.progress().await.unwrap();
        assert_eq!(service.stats().await.unwrap().classes_completed, 0);

        let updated = service.advance(&progress[0]).await.unwrap();
        assert_eq!(updated.fields.status, ProgressStatus::Completed);

        assert_eq!(service.stats().await.unwrap().classes_completed, 1);
        assert_eq!(api.calls("player_stats"), 2);
    }

    #[tokio::test]
    async fn test_completing_class_refreshes_overview_and_next() {
        let (service, api) = service(vec![class(1, ProgressStatus::InProgress), class(2, ProgressStatus::Locked)]);
        let progress = service.progress().await.unwrap();
        assert_eq!(service.course_progress().await.unwrap().total_classes_completed, 0);
        assert_eq!(service.next_unlockable().await.unwrap().map(|n| n.class_number), Some(1));

        service.advance(&progress[0]).await.unwrap();

        assert_eq!(service.course_progress().await.unwrap().total_classes_completed, 1);
        assert_eq!(service.next_unlockable().await.unwrap().map(|n| n.class_number), Some(2));
        assert_eq!(api.calls("course_progress"), 2);
        assert_eq!(api.calls("next_unlockable"), 2);
    }

    #[tokio::test]
    async fn test_locked_class_cannot_advance() {
        let (service, api) = service(vec![class(1, ProgressStatus::Locked)]);
        let progress = service.progress().await.unwrap();

        let err = service.advance(&progress[0]).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(api.calls("update"), 0);
    }

    #[tokio::test]
    async fn test_unlock_failure_rolls_back() {
        let (service, api) = service(vec![class(1, ProgressStatus::Completed)]);
        let before = service.progress().await.unwrap();

        api.set_offline(true);
        assert!(service.unlock(2).await.is_err());
        assert_eq!(service.client().read(&service.progress_key()).data, Some(before));
    }
}
