//! Player Service
//!
//! Profile and achievements of one player. Keys under `player/{id}` cover
//! the profile and, by prefix, the statistics aggregate.

use std::rc::Rc;

use tracing::info;

use crate::api::{AchievementsApi, HttpPlayers, PlayerApi, RestClient};
use crate::cache::{QueryClient, QueryKey, QueryOptions};
use crate::config::ClientConfig;
use crate::error::ApiResult;
use crate::models::{
    AchievementAction, AchievementCatalog, AchievementsUnlocked, CheckAchievements, Player,
    PlayerAchievements, PlayerCreate, PlayerUpdate,
};

pub const ACHIEVEMENT_CATALOG_KEY: QueryKey<AchievementCatalog> = QueryKey::new("achievements");

pub fn player_key(player_id: i64) -> QueryKey<Player> {
    QueryKey::owned(format!("player/{}", player_id))
}

pub fn player_achievements_key(player_id: i64) -> QueryKey<PlayerAchievements> {
    QueryKey::owned(format!("achievements/player/{}", player_id))
}

pub struct PlayerService<A = HttpPlayers> {
    client: QueryClient,
    api: Rc<A>,
    player_id: i64,
}

impl<A> Clone for PlayerService<A> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            api: self.api.clone(),
            player_id: self.player_id,
        }
    }
}

impl PlayerService<HttpPlayers> {
    pub fn connect(client: QueryClient, rest: RestClient, config: &ClientConfig, player_id: i64) -> Self {
        let api = HttpPlayers::new(rest, &config.course_id);
        Self::new(client, Rc::new(api), config, player_id)
    }
}

impl<A: PlayerApi + AchievementsApi + 'static> PlayerService<A> {
    pub fn new(client: QueryClient, api: Rc<A>, config: &ClientConfig, player_id: i64) -> Self {
        let profile_api = api.clone();
        client.register(
            &player_key(player_id),
            QueryOptions::stale_after(config.list_stale_time()),
            move || {
                let api = profile_api.clone();
                async move { api.player(player_id).await }
            },
        );
        let unlocked_api = api.clone();
        client.register(
            &player_achievements_key(player_id),
            QueryOptions::stale_after(config.stats_stale_time()),
            move || {
                let api = unlocked_api.clone();
                async move { api.player_achievements(player_id).await }
            },
        );
        let catalog_api = api.clone();
        client.register(
            &ACHIEVEMENT_CATALOG_KEY,
            QueryOptions::stale_after(config.list_stale_time()),
            move || {
                let api = catalog_api.clone();
                async move { api.achievement_catalog().await }
            },
        );

        Self {
            client,
            api,
            player_id,
        }
    }

    /// Register a new player and return a service bound to it, profile cached
    pub async fn create(
        client: QueryClient,
        api: Rc<A>,
        config: &ClientConfig,
        draft: PlayerCreate,
    ) -> ApiResult<Self> {
        let draft = draft.validate()?;
        let player = api.create_player(&draft).await?;
        info!("Created player {} ({})", player.username, player.id);

        let service = Self::new(client, api, config, player.id);
        service.client.write(&player_key(player.id), player);
        Ok(service)
    }

    pub fn player_id(&self) -> i64 {
        self.player_id
    }

    pub async fn profile(&self) -> ApiResult<Player> {
        self.client.fetch(&player_key(self.player_id)).await
    }

    /// Validated before sending; the server's answer replaces the cached profile
    pub async fn update(&self, patch: PlayerUpdate) -> ApiResult<Player> {
        let patch = patch.validate()?;
        let player = self.api.update_player(self.player_id, &patch).await?;
        self.client.write(&player_key(self.player_id), player.clone());
        Ok(player)
    }

    pub async fn achievements(&self) -> ApiResult<PlayerAchievements> {
        self.client.fetch(&player_achievements_key(self.player_id)).await
    }

    pub async fn catalog(&self) -> ApiResult<AchievementCatalog> {
        self.client.fetch(&ACHIEVEMENT_CATALOG_KEY).await
    }

    /// Report an action. Unlocked achievements and earned XP change the
    /// player's aggregates, so those keys are invalidated either way.
    pub async fn check_achievements(
        &self,
        action: AchievementAction,
        data: Option<serde_json::Value>,
    ) -> ApiResult<AchievementsUnlocked> {
        let request = CheckAchievements {
            player_id: self.player_id,
            action_type: action,
            action_data: data,
        };
        let result = self.api.check_achievements(&request).await;
        if let Ok(unlocked) = &result {
            if !unlocked.achievements_unlocked.is_empty() {
                info!(
                    "Player {} unlocked {} achievement(s), +{} XP",
                    self.player_id,
                    unlocked.achievements_unlocked.len(),
                    unlocked.xp_earned
                );
            }
        }
        self.client.invalidate(player_achievements_key(self.player_id).path()).await;
        self.client.invalidate(player_key(self.player_id).path()).await;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::testing::FakePlayers;

    fn service() -> (PlayerService<FakePlayers>, Rc<FakePlayers>) {
        let api = Rc::new(FakePlayers::default());
        let service = PlayerService::new(QueryClient::new(), api.clone(), &ClientConfig::default(), 1);
        (service, api)
    }

    #[tokio::test]
    async fn test_create_caches_profile() {
        let api = Rc::new(FakePlayers::default());
        let service = PlayerService::create(
            QueryClient::new(),
            api.clone(),
            &ClientConfig::default(),
            PlayerCreate::new(" ana "),
        )
        .await
        .unwrap();

        let profile = service.profile().await.unwrap();
        assert_eq!(profile.username, "ana");
        assert_eq!(api.calls("player"), 0);
    }

    #[tokio::test]
    async fn test_short_username_is_rejected_before_sending() {
        let api = Rc::new(FakePlayers::default());
        let err = PlayerService::create(
            QueryClient::new(),
            api.clone(),
            &ClientConfig::default(),
            PlayerCreate::new("al"),
        )
        .await
        .err()
        .map(|e| e.kind);
        assert_eq!(err, Some(ErrorKind::Validation));
        assert_eq!(api.calls("create_player"), 0);
    }

    #[tokio::test]
    async fn test_check_refreshes_achievements_and_profile() {
        let (service, api) = service();
        assert_eq!(service.achievements().await.unwrap().total_achievements, 0);
        assert_eq!(service.profile().await.unwrap().xp, 0);

        let unlocked = service
            .check_achievements(AchievementAction::CompleteClass, None)
            .await
            .unwrap();
        assert_eq!(unlocked.achievements_unlocked.len(), 1);

        assert_eq!(service.achievements().await.unwrap().total_achievements, 1);
        assert_eq!(service.profile().await.unwrap().xp, unlocked.xp_earned);
        assert_eq!(api.calls("player_achievements"), 2);
        assert_eq!(api.calls("player"), 2);
    }
}
