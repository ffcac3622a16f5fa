//! Player Endpoints
//!
//! Player profiles and their achievements. Achievement calls are scoped
//! to a course with `course_id`.

use async_trait::async_trait;

use super::client::RestClient;
use crate::error::ApiResult;
use crate::models::{
    AchievementCatalog, AchievementsUnlocked, CheckAchievements, Player, PlayerAchievements,
    PlayerCreate, PlayerUpdate,
};

#[async_trait(?Send)]
pub trait PlayerApi {
    async fn create_player(&self, draft: &PlayerCreate) -> ApiResult<Player>;
    async fn player(&self, player_id: i64) -> ApiResult<Player>;
    async fn update_player(&self, player_id: i64, patch: &PlayerUpdate) -> ApiResult<Player>;
}

#[async_trait(?Send)]
pub trait AchievementsApi {
    /// Every achievement the course offers
    async fn achievement_catalog(&self) -> ApiResult<AchievementCatalog>;
    async fn player_achievements(&self, player_id: i64) -> ApiResult<PlayerAchievements>;
    /// Report an action; the backend unlocks whatever it earned
    async fn check_achievements(&self, request: &CheckAchievements) -> ApiResult<AchievementsUnlocked>;
}

#[derive(Clone)]
pub struct HttpPlayers {
    client: RestClient,
    course: Vec<(String, String)>,
}

impl HttpPlayers {
    pub fn new(client: RestClient, course_id: &str) -> Self {
        Self {
            client,
            course: vec![("course_id".to_string(), course_id.to_string())],
        }
    }
}

#[async_trait(?Send)]
impl PlayerApi for HttpPlayers {
    async fn create_player(&self, draft: &PlayerCreate) -> ApiResult<Player> {
        self.client.post("/player/", &[], draft).await
    }

    async fn player(&self, player_id: i64) -> ApiResult<Player> {
        self.client.get(&format!("/player/{}", player_id), &[]).await
    }

    async fn update_player(&self, player_id: i64, patch: &PlayerUpdate) -> ApiResult<Player> {
        self.client.patch(&format!("/player/{}", player_id), patch).await
    }
}

#[async_trait(?Send)]
impl AchievementsApi for HttpPlayers {
    async fn achievement_catalog(&self) -> ApiResult<AchievementCatalog> {
        self.client.get("/achievements/", &self.course).await
    }

    async fn player_achievements(&self, player_id: i64) -> ApiResult<PlayerAchievements> {
        let path = format!("/achievements/player/{}", player_id);
        self.client.get(&path, &self.course).await
    }

    async fn check_achievements(&self, request: &CheckAchievements) -> ApiResult<AchievementsUnlocked> {
        self.client.post("/achievements/check", &self.course, request).await
    }
}
