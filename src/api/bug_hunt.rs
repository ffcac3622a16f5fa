//! Bug Hunt Endpoints
//!
//! The mini-game: start a session, submit the lines found, read the
//! leaderboard and per-player statistics.

use async_trait::async_trait;

use super::client::RestClient;
use crate::error::ApiResult;
use crate::models::{BugHuntResult, BugHuntSession, BugHuntStart, BugHuntStats, BugHuntSubmission, Difficulty, Leaderboard};

const BASE_PATH: &str = "/minigames/bug-hunt";

#[async_trait(?Send)]
pub trait BugHuntApi {
    async fn start(&self, request: &BugHuntStart) -> ApiResult<BugHuntSession>;
    async fn submit(&self, submission: &BugHuntSubmission) -> ApiResult<BugHuntResult>;
    /// Best scores, optionally for one difficulty
    async fn leaderboard(&self, difficulty: Option<Difficulty>, limit: u32) -> ApiResult<Leaderboard>;
    async fn stats(&self, player_id: i64) -> ApiResult<BugHuntStats>;
}

#[derive(Clone)]
pub struct HttpBugHunt {
    client: RestClient,
}

impl HttpBugHunt {
    pub fn new(client: RestClient) -> Self {
        Self { client }
    }
}

#[async_trait(?Send)]
impl BugHuntApi for HttpBugHunt {
    async fn start(&self, request: &BugHuntStart) -> ApiResult<BugHuntSession> {
        self.client
            .post(&format!("{}/start", BASE_PATH), &[], request)
            .await
    }

    async fn submit(&self, submission: &BugHuntSubmission) -> ApiResult<BugHuntResult> {
        self.client
            .post(&format!("{}/submit", BASE_PATH), &[], submission)
            .await
    }

    async fn leaderboard(&self, difficulty: Option<Difficulty>, limit: u32) -> ApiResult<Leaderboard> {
        let mut query = vec![("limit".to_string(), limit.to_string())];
        if let Some(difficulty) = difficulty {
            query.push(("difficulty".to_string(), difficulty.as_str().to_string()));
        }
        self.client
            .get(&format!("{}/leaderboard", BASE_PATH), &query)
            .await
    }

    async fn stats(&self, player_id: i64) -> ApiResult<BugHuntStats> {
        self.client
            .get(&format!("{}/stats/{}", BASE_PATH, player_id), &[])
            .await
    }
}
