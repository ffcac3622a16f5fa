//! Bug Hunt Service
//!
//! Sessions are not cached; the leaderboards and statistics they feed are.
//! A submission is a mutation without a speculative edit: once it settles,
//! every aggregate the game touches is invalidated.

use std::rc::Rc;

use tracing::{debug, warn};

use crate::api::{BugHuntApi, HttpBugHunt, RestClient};
use crate::cache::{QueryClient, QueryKey, QueryOptions};
use crate::config::ClientConfig;
use crate::error::{ApiError, ApiResult};
use crate::models::{BugHuntResult, BugHuntSession, BugHuntStart, BugHuntStats, BugHuntSubmission, Difficulty, Leaderboard};

use super::player::{player_achievements_key, player_key};

/// Every leaderboard key lives under this prefix
pub const LEADERBOARD_PREFIX: &str = "bug-hunt/leaderboard";

/// Entries requested per leaderboard
pub const LEADERBOARD_LIMIT: u32 = 10;

pub fn leaderboard_key(difficulty: Option<Difficulty>) -> QueryKey<Leaderboard> {
    let scope = difficulty.map_or("all", |d| d.as_str());
    QueryKey::owned(format!("{}/{}", LEADERBOARD_PREFIX, scope))
}

pub fn bug_hunt_stats_key(player_id: i64) -> QueryKey<BugHuntStats> {
    QueryKey::owned(format!("bug-hunt/stats/{}", player_id))
}

pub struct BugHuntService<A = HttpBugHunt> {
    client: QueryClient,
    api: Rc<A>,
    player_id: i64,
    options: QueryOptions,
}

impl<A> Clone for BugHuntService<A> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            api: self.api.clone(),
            player_id: self.player_id,
            options: self.options,
        }
    }
}

impl BugHuntService<HttpBugHunt> {
    pub fn connect(client: QueryClient, rest: RestClient, config: &ClientConfig, player_id: i64) -> Self {
        Self::new(client, Rc::new(HttpBugHunt::new(rest)), config, player_id)
    }
}

impl<A: BugHuntApi + 'static> BugHuntService<A> {
    pub fn new(client: QueryClient, api: Rc<A>, config: &ClientConfig, player_id: i64) -> Self {
        let options = QueryOptions::stale_after(config.stats_stale_time());
        let stats_api = api.clone();
        client.register(&bug_hunt_stats_key(player_id), options, move || {
            let api = stats_api.clone();
            async move { api.stats(player_id).await }
        });
        Self {
            client,
            api,
            player_id,
            options,
        }
    }

    pub fn client(&self) -> &QueryClient {
        &self.client
    }

    /// Random difficulty when `None`
    pub async fn start(&self, difficulty: Option<Difficulty>) -> ApiResult<BugHuntSession> {
        let session = self
            .api
            .start(&BugHuntStart {
                player_id: self.player_id,
                difficulty,
            })
            .await?;
        debug!(session = session.session_id, bugs = session.bugs_count, "bug hunt started");
        Ok(session)
    }

    /// Grade the lines found in `session`
    pub async fn submit(
        &self,
        session: &BugHuntSession,
        found_bug_lines: Vec<u32>,
        time_seconds: f64,
    ) -> ApiResult<BugHuntResult> {
        let submission = BugHuntSubmission {
            session_id: session.session_id,
            player_id: self.player_id,
            found_bug_lines,
            time_seconds,
        }
        .validate()?;

        let result = self.api.submit(&submission).await;
        match &result {
            Ok(graded) => debug!(
                session = session.session_id,
                score = graded.score,
                perfect = graded.is_perfect,
                "bug hunt graded"
            ),
            Err(e) => warn!(session = session.session_id, error = %e, "bug hunt submission failed"),
        }
        self.settle().await;
        result
    }

    /// Register the leaderboard for `difficulty` and return its key
    pub fn leaderboard_query(&self, difficulty: Option<Difficulty>) -> QueryKey<Leaderboard> {
        let key = leaderboard_key(difficulty);
        let api = self.api.clone();
        self.client.register(&key, self.options, move || {
            let api = api.clone();
            async move { api.leaderboard(difficulty, LEADERBOARD_LIMIT).await }
        });
        key
    }

    pub async fn leaderboard(&self, difficulty: Option<Difficulty>) -> ApiResult<Leaderboard> {
        let key = self.leaderboard_query(difficulty);
        self.client.fetch(&key).await
    }

    pub async fn stats(&self) -> ApiResult<BugHuntStats> {
        self.client.fetch(&bug_hunt_stats_key(self.player_id)).await
    }

    /// Rank of this player on a loaded leaderboard
    pub fn rank_in(&self, leaderboard: &Leaderboard) -> Option<u32> {
        leaderboard
            .entries
            .iter()
            .find(|entry| entry.player_id == self.player_id)
            .map(|entry| entry.rank)
    }

    async fn settle(&self) {
        self.client.invalidate(LEADERBOARD_PREFIX).await;
        self.client.invalidate(bug_hunt_stats_key(self.player_id).path()).await;
        self.client.invalidate(player_achievements_key(self.player_id).path()).await;
        // Covers the profile and `player/{p}/stats`
        self.client.invalidate(player_key(self.player_id).path()).await;
    }
}

/// Seconds elapsed since a session started, for the submission
pub fn elapsed_seconds(session: &BugHuntSession, now: chrono::DateTime<chrono::Utc>) -> ApiResult<f64> {
    let started = chrono::DateTime::parse_from_rfc3339(&session.started_at)
        .or_else(|_| {
            chrono::NaiveDateTime::parse_from_str(&session.started_at, "%Y-%m-%dT%H:%M:%S%.f")
                .map(|naive| naive.and_utc().fixed_offset())
        })
        .map_err(|e| ApiError::decode(format!("Invalid started_at {}: {}", session.started_at, e)))?;
    let elapsed = now.signed_duration_since(started).num_milliseconds().max(0);
    Ok(elapsed as f64 / 1000.0)
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use chrono::TimeZone;

    use super::*;
    use crate::error::ErrorKind;
    use crate::models::PlayerStats;
    use crate::services::player_stats_key;
    use crate::testing::FakeBugHunt;

    fn service() -> (BugHuntService<FakeBugHunt>, Rc<FakeBugHunt>) {
        let api = Rc::new(FakeBugHunt::default());
        let service = BugHuntService::new(QueryClient::new(), api.clone(), &ClientConfig::default(), 7);
        (service, api)
    }

    /// Counts fetches of the player's stats aggregate
    fn watch_player_stats(client: &QueryClient) -> Rc<Cell<u32>> {
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        client.register(&player_stats_key(7), QueryOptions::default(), move || {
            counter.set(counter.get() + 1);
            let games = counter.get();
            async move {
                Ok::<_, ApiError>(PlayerStats {
                    player_id: 7,
                    classes_completed: 0,
                    exercises_completed: 0,
                    bug_hunt_wins: 0,
                    bug_hunt_games_played: games - 1,
                    current_streak: 0,
                    longest_streak: 0,
                    last_activity_date: None,
                })
            }
        });
        calls
    }

    #[test]
    fn test_leaderboard_keys_share_prefix() {
        assert_eq!(leaderboard_key(None).path(), "bug-hunt/leaderboard/all");
        assert_eq!(leaderboard_key(Some(Difficulty::Hard)).path(), "bug-hunt/leaderboard/hard");
        assert_eq!(bug_hunt_stats_key(7).path(), "bug-hunt/stats/7");
    }

    #[tokio::test]
    async fn test_submit_refreshes_leaderboards_and_player_stats() {
        let (service, api) = service();
        let player_stats = watch_player_stats(service.client());
        let _sub = service.client().subscribe(player_stats_key(7).path(), |_| {});
        service.client().fetch(&player_stats_key(7)).await.unwrap();

        assert_eq!(service.leaderboard(None).await.unwrap().total_entries, 0);
        assert_eq!(service.leaderboard(Some(Difficulty::Easy)).await.unwrap().total_entries, 0);

        let session = service.start(Some(Difficulty::Easy)).await.unwrap();
        let result = service.submit(&session, vec![3, 3], 42.0).await.unwrap();
        assert!(result.success);
        assert_eq!(api.last_submission().map(|s| s.found_bug_lines), Some(vec![3]));

        // Subscribed aggregate refetched at once, leaderboards on next read
        assert_eq!(player_stats.get(), 2);
        assert_eq!(api.calls("leaderboard"), 2);
        let all = service.leaderboard(None).await.unwrap();
        let easy = service.leaderboard(Some(Difficulty::Easy)).await.unwrap();
        assert_eq!((all.total_entries, easy.total_entries), (1, 1));
        assert_eq!(service.rank_in(&all), Some(1));
        assert_eq!(api.calls("leaderboard"), 4);
    }

    #[tokio::test]
    async fn test_failed_submit_still_settles() {
        let (service, api) = service();
        service.stats().await.unwrap();
        let session = service.start(None).await.unwrap();

        api.set_offline(true);
        let err = service.submit(&session, vec![1], 5.0).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Network);
        assert!(service.client().read(&bug_hunt_stats_key(7)).is_stale);
    }

    #[tokio::test]
    async fn test_invalid_time_is_not_sent() {
        let (service, api) = service();
        let session = service.start(None).await.unwrap();

        let err = service.submit(&session, vec![1], f64::NAN).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(api.calls("submit"), 0);
    }

    #[test]
    fn test_elapsed_seconds_accepts_naive_timestamps() {
        let session = BugHuntSession {
            session_id: 1,
            template_id: "t".into(),
            title: "t".into(),
            description: String::new(),
            difficulty: Difficulty::Easy,
            code: String::new(),
            bugs_count: 1,
            max_xp: 100,
            started_at: "2024-05-01T10:00:00.250000".into(),
        };
        let now = chrono::Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 30).unwrap();
        assert_eq!(elapsed_seconds(&session, now).unwrap(), 29.75);
    }
}
