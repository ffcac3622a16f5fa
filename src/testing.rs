//! In-memory backend for tests

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::api::{AcademyApi, AchievementsApi, BugHuntApi, PlayerApi, ResourceApi, TareasApi};
use crate::error::{ApiError, ApiResult};
use crate::models::{
    AchievementAction, AchievementCatalog, AchievementCategory, AchievementRarity,
    AchievementsUnlocked, BugHuntResult, BugHuntSession, BugHuntStart, BugHuntStats,
    BugHuntSubmission, BugResult, CheckAchievements, CourseProgress, Difficulty, Estadisticas,
    Leaderboard, LeaderboardEntry, NextClass, Player, PlayerAchievements, PlayerCreate,
    PlayerStats, PlayerUpdate, Progress, ProgressStatus, Tarea, UnlockedAchievement,
};
use crate::resource::{Collection, Record, Resource};

/// Fake `ResourceApi` with call counting, failure injection and a gate
/// that holds mutations until released
pub struct FakeResource<R: Resource> {
    records: RefCell<Vec<Record<R>>>,
    next_id: Cell<i64>,
    calls: RefCell<Vec<&'static str>>,
    offline: Cell<bool>,
    fail_next: RefCell<Option<ApiError>>,
    gate: RefCell<Option<Rc<Notify>>>,
}

impl<R> FakeResource<R>
where
    R: Resource<Id = i64>,
{
    pub fn new() -> Self {
        Self {
            records: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
            calls: RefCell::new(Vec::new()),
            offline: Cell::new(false),
            fail_next: RefCell::new(None),
            gate: RefCell::new(None),
        }
    }

    pub fn with_records(records: Vec<R>) -> Self {
        let fake = Self::new();
        for fields in records {
            fake.insert(fields);
        }
        fake
    }

    pub fn insert(&self, fields: R) -> i64 {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        self.records.borrow_mut().push(Record::confirmed(id, fields));
        id
    }

    pub fn records(&self) -> Vec<Record<R>> {
        self.records.borrow().clone()
    }

    pub fn calls(&self, op: &str) -> usize {
        self.calls.borrow().iter().filter(|c| **c == op).count()
    }

    /// Every call fails with a network error until brought back
    pub fn set_offline(&self, offline: bool) {
        self.offline.set(offline);
    }

    /// Fail the next mutation only
    pub fn fail_next(&self, err: ApiError) {
        *self.fail_next.borrow_mut() = Some(err);
    }

    /// Hold mutations until the returned `Notify` is notified
    pub fn hold(&self) -> Rc<Notify> {
        let gate = Rc::new(Notify::new());
        *self.gate.borrow_mut() = Some(gate.clone());
        gate
    }

    fn start(&self, op: &'static str) -> ApiResult<()> {
        self.calls.borrow_mut().push(op);
        if self.offline.get() {
            return Err(ApiError::network("connection refused"));
        }
        Ok(())
    }

    /// Decide the outcome now, then wait for the gate
    async fn start_mutation(&self, op: &'static str) -> ApiResult<()> {
        let outcome = self
            .start(op)
            .and_then(|()| self.fail_next.borrow_mut().take().map_or(Ok(()), Err));
        let gate = self.gate.borrow().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        outcome
    }

    fn not_found() -> ApiError {
        ApiError::server(404, Some("Not found".to_string()))
    }
}

impl<R> Default for FakeResource<R>
where
    R: Resource<Id = i64>,
{
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait(?Send)]
impl<R> ResourceApi<R> for FakeResource<R>
where
    R: Resource<Id = i64>,
{
    async fn list(&self) -> ApiResult<Collection<R>> {
        self.start("list")?;
        Ok(self.records())
    }

    async fn get(&self, id: &i64) -> ApiResult<Record<R>> {
        self.start("get")?;
        self.records()
            .into_iter()
            .find(|r| r.server_id() == Some(id))
            .ok_or_else(Self::not_found)
    }

    async fn create(&self, draft: &R::Draft) -> ApiResult<Record<R>> {
        self.start_mutation("create").await?;
        let id = self.insert(R::speculative(draft));
        self.get_record(id)
    }

    async fn update(&self, id: &i64, patch: &R::Patch) -> ApiResult<Record<R>> {
        self.start_mutation("update").await?;
        let mut records = self.records.borrow_mut();
        let record = records
            .iter_mut()
            .find(|r| r.server_id() == Some(id))
            .ok_or_else(Self::not_found)?;
        record.fields.apply_patch(patch);
        Ok(record.clone())
    }

    async fn delete(&self, id: &i64) -> ApiResult<()> {
        self.start_mutation("delete").await?;
        let mut records = self.records.borrow_mut();
        let before = records.len();
        records.retain(|r| r.server_id() != Some(id));
        if records.len() == before {
            return Err(Self::not_found());
        }
        Ok(())
    }
}

impl<R> FakeResource<R>
where
    R: Resource<Id = i64>,
{
    fn get_record(&self, id: i64) -> ApiResult<Record<R>> {
        self.records()
            .into_iter()
            .find(|r| r.server_id() == Some(&id))
            .ok_or_else(Self::not_found)
    }
}

#[async_trait(?Send)]
impl TareasApi for FakeResource<Tarea> {
    async fn estadisticas(&self) -> ApiResult<Estadisticas> {
        self.start("estadisticas")?;
        let records = self.records();
        let total = records.len() as u32;
        let completadas = records.iter().filter(|r| r.fields.completada).count() as u32;
        Ok(Estadisticas {
            total,
            completadas,
            pendientes: total - completadas,
        })
    }
}

#[async_trait(?Send)]
impl AcademyApi for FakeResource<Progress> {
    async fn player_stats(&self, player_id: i64) -> ApiResult<PlayerStats> {
        self.start("player_stats")?;
        let records = self.records();
        let completed = |r: &&Record<Progress>| r.fields.status == ProgressStatus::Completed;
        Ok(PlayerStats {
            player_id,
            classes_completed: records.iter().filter(completed).count() as u32,
            exercises_completed: records.iter().map(|r| r.fields.exercises_completed).sum(),
            bug_hunt_wins: 0,
            bug_hunt_games_played: 0,
            current_streak: 0,
            longest_streak: 0,
            last_activity_date: None,
        })
    }

    async fn course_progress(&self, player_id: i64) -> ApiResult<CourseProgress> {
        self.start("course_progress")?;
        let records = self.records();
        let completed = records
            .iter()
            .filter(|r| r.fields.status == ProgressStatus::Completed)
            .count() as u32;
        let percentage = if records.is_empty() {
            0.0
        } else {
            f64::from(completed) * 100.0 / records.len() as f64
        };
        Ok(CourseProgress {
            player_id,
            total_classes_completed: completed,
            total_exercises_completed: records.iter().map(|r| r.fields.exercises_completed).sum(),
            overall_progress_percentage: percentage,
            modules: Vec::new(),
        })
    }

    async fn next_unlockable(&self, _player_id: i64) -> ApiResult<Option<NextClass>> {
        self.start("next_unlockable")?;
        Ok(self
            .records()
            .into_iter()
            .find(|r| r.fields.status != ProgressStatus::Completed)
            .map(|r| NextClass {
                module_number: r.fields.module_number,
                class_number: r.fields.class_number,
                title: format!("Class {}", r.fields.class_number),
                description: String::new(),
                xp_reward: 100,
            }))
    }
}

/// Calls made to a fake and whether it answers at all
#[derive(Default)]
struct CallLog {
    calls: RefCell<Vec<&'static str>>,
    offline: Cell<bool>,
}

impl CallLog {
    fn start(&self, op: &'static str) -> ApiResult<()> {
        self.calls.borrow_mut().push(op);
        if self.offline.get() {
            return Err(ApiError::network("connection refused"));
        }
        Ok(())
    }

    fn count(&self, op: &str) -> usize {
        self.calls.borrow().iter().filter(|c| **c == op).count()
    }
}

/// Fake mini-game: every submitted line counts as a bug found
#[derive(Default)]
pub struct FakeBugHunt {
    log: CallLog,
    sessions: RefCell<Vec<BugHuntSession>>,
    submissions: RefCell<Vec<BugHuntSubmission>>,
    entries: RefCell<Vec<LeaderboardEntry>>,
}

impl FakeBugHunt {
    pub fn calls(&self, op: &str) -> usize {
        self.log.count(op)
    }

    pub fn set_offline(&self, offline: bool) {
        self.log.offline.set(offline);
    }

    pub fn last_submission(&self) -> Option<BugHuntSubmission> {
        self.submissions.borrow().last().cloned()
    }
}

#[async_trait(?Send)]
impl BugHuntApi for FakeBugHunt {
    async fn start(&self, request: &BugHuntStart) -> ApiResult<BugHuntSession> {
        self.log.start("start")?;
        let mut sessions = self.sessions.borrow_mut();
        let session = BugHuntSession {
            session_id: sessions.len() as i64 + 1,
            template_id: "off_by_one".to_string(),
            title: "Off by one".to_string(),
            description: "Find the bugs".to_string(),
            difficulty: request.difficulty.unwrap_or(Difficulty::Medium),
            code: "for i in 0..=len {\n    total += items[i];\n}".to_string(),
            bugs_count: 1,
            max_xp: 100,
            started_at: "2024-05-01T10:00:00".to_string(),
        };
        sessions.push(session.clone());
        Ok(session)
    }

    async fn submit(&self, submission: &BugHuntSubmission) -> ApiResult<BugHuntResult> {
        self.log.start("submit")?;
        let session = self
            .sessions
            .borrow()
            .iter()
            .find(|s| s.session_id == submission.session_id)
            .cloned()
            .ok_or_else(|| ApiError::server(404, Some("Session not found".to_string())))?;
        self.submissions.borrow_mut().push(submission.clone());

        let found = submission.found_bug_lines.len() as u32;
        let score = found * 100;
        let mut entries = self.entries.borrow_mut();
        entries.push(LeaderboardEntry {
            rank: 0,
            player_id: submission.player_id,
            username: format!("player{}", submission.player_id),
            score,
            bugs_found: found,
            bugs_total: session.bugs_count,
            time_seconds: submission.time_seconds,
            accuracy: 100.0,
            difficulty: session.difficulty,
            completed_at: session.started_at.clone(),
        });
        Ok(BugHuntResult {
            success: found > 0,
            score,
            xp_earned: score,
            bugs_found: found,
            bugs_total: session.bugs_count,
            bugs_missed: session.bugs_count.saturating_sub(found),
            false_positives: 0,
            accuracy: 100.0,
            time_seconds: submission.time_seconds,
            is_perfect: found == session.bugs_count,
            results: submission
                .found_bug_lines
                .iter()
                .map(|&line| BugResult {
                    line,
                    found: true,
                    is_correct: true,
                    bug_type: None,
                    description: None,
                })
                .collect(),
            performance_bonus: 0,
            achievements_unlocked: Vec::new(),
        })
    }

    async fn leaderboard(&self, difficulty: Option<Difficulty>, limit: u32) -> ApiResult<Leaderboard> {
        self.log.start("leaderboard")?;
        let mut entries: Vec<LeaderboardEntry> = self
            .entries
            .borrow()
            .iter()
            .filter(|e| difficulty.map_or(true, |d| e.difficulty == d))
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.score.cmp(&a.score));
        entries.truncate(limit as usize);
        for (i, entry) in entries.iter_mut().enumerate() {
            entry.rank = i as u32 + 1;
        }
        Ok(Leaderboard {
            total_entries: entries.len() as u32,
            entries,
            difficulty_filter: difficulty,
        })
    }

    async fn stats(&self, player_id: i64) -> ApiResult<BugHuntStats> {
        self.log.start("stats")?;
        let entries = self.entries.borrow();
        let games: Vec<&LeaderboardEntry> = entries.iter().filter(|e| e.player_id == player_id).collect();
        let total_score: u32 = games.iter().map(|e| e.score).sum();
        Ok(BugHuntStats {
            total_games_played: games.len() as u32,
            total_bugs_found: games.iter().map(|e| e.bugs_found).sum(),
            total_perfect_games: games.iter().filter(|e| e.bugs_found == e.bugs_total).count() as u32,
            best_score: games.iter().map(|e| e.score).max().unwrap_or(0),
            average_score: if games.is_empty() {
                0.0
            } else {
                f64::from(total_score) / games.len() as f64
            },
            average_accuracy: 100.0,
            favorite_difficulty: games.first().map(|e| e.difficulty),
            total_xp_earned: total_score,
        })
    }
}

/// Fake player backend; the first check of any action unlocks one
/// achievement worth 50 XP
#[derive(Default)]
pub struct FakePlayers {
    log: CallLog,
    players: RefCell<Vec<Player>>,
    unlocked: RefCell<Vec<UnlockedAchievement>>,
}

const FIRST_STEPS_XP: u32 = 50;

impl FakePlayers {
    pub fn calls(&self, op: &str) -> usize {
        self.log.count(op)
    }

    pub fn set_offline(&self, offline: bool) {
        self.log.offline.set(offline);
    }

    fn player_mut<T>(&self, player_id: i64, f: impl FnOnce(&mut Player) -> T) -> ApiResult<T> {
        let mut players = self.players.borrow_mut();
        if !players.iter().any(|p| p.id == player_id) {
            players.push(Self::blank(player_id, &format!("player{}", player_id)));
        }
        players
            .iter_mut()
            .find(|p| p.id == player_id)
            .map(f)
            .ok_or_else(|| ApiError::server(404, Some("Player not found".to_string())))
    }

    fn blank(id: i64, username: &str) -> Player {
        Player {
            id,
            username: username.to_string(),
            avatar: crate::models::DEFAULT_AVATAR.to_string(),
            level: 1,
            xp: 0,
            created_at: None,
            last_login: None,
        }
    }
}

#[async_trait(?Send)]
impl PlayerApi for FakePlayers {
    async fn create_player(&self, draft: &PlayerCreate) -> ApiResult<Player> {
        self.log.start("create_player")?;
        let mut players = self.players.borrow_mut();
        if players.iter().any(|p| p.username == draft.username) {
            return Err(ApiError::server(400, Some("Username already exists".to_string())));
        }
        let player = Self::blank(players.len() as i64 + 1, &draft.username);
        players.push(player.clone());
        Ok(player)
    }

    async fn player(&self, player_id: i64) -> ApiResult<Player> {
        self.log.start("player")?;
        self.player_mut(player_id, |p| p.clone())
    }

    async fn update_player(&self, player_id: i64, patch: &PlayerUpdate) -> ApiResult<Player> {
        self.log.start("update_player")?;
        self.player_mut(player_id, |p| {
            if let Some(username) = &patch.username {
                p.username = username.clone();
            }
            if let Some(avatar) = &patch.avatar {
                p.avatar = avatar.clone();
            }
            p.clone()
        })
    }
}

#[async_trait(?Send)]
impl AchievementsApi for FakePlayers {
    async fn achievement_catalog(&self) -> ApiResult<AchievementCatalog> {
        self.log.start("achievement_catalog")?;
        Ok(AchievementCatalog {
            total_achievements: 0,
            achievements: Vec::new(),
        })
    }

    async fn player_achievements(&self, player_id: i64) -> ApiResult<PlayerAchievements> {
        self.log.start("player_achievements")?;
        let achievements: Vec<UnlockedAchievement> = self
            .unlocked
            .borrow()
            .iter()
            .filter(|a| a.player_id == player_id)
            .cloned()
            .collect();
        Ok(PlayerAchievements {
            player_id,
            total_achievements: achievements.len() as u32,
            achievements,
        })
    }

    async fn check_achievements(&self, request: &CheckAchievements) -> ApiResult<AchievementsUnlocked> {
        self.log.start("check_achievements")?;
        let achievement_id = match request.action_type {
            AchievementAction::CompleteClass => "first_class",
            AchievementAction::BugHuntWin => "first_bug_hunt",
            AchievementAction::CompleteExercise => "first_exercise",
        };
        let mut unlocked = self.unlocked.borrow_mut();
        if unlocked
            .iter()
            .any(|a| a.player_id == request.player_id && a.achievement_id == achievement_id)
        {
            return Ok(AchievementsUnlocked {
                achievements_unlocked: Vec::new(),
                xp_earned: 0,
            });
        }
        let achievement = UnlockedAchievement {
            id: unlocked.len() as i64 + 1,
            player_id: request.player_id,
            achievement_id: achievement_id.to_string(),
            title: "First steps".to_string(),
            description: String::new(),
            icon: "star".to_string(),
            category: AchievementCategory::Learning,
            rarity: AchievementRarity::Common,
            xp_reward: FIRST_STEPS_XP,
            unlocked_at: "2024-05-01T10:00:00".to_string(),
        };
        unlocked.push(achievement.clone());
        drop(unlocked);
        self.player_mut(request.player_id, |p| p.xp += FIRST_STEPS_XP)?;
        Ok(AchievementsUnlocked {
            achievements_unlocked: vec![achievement],
            xp_earned: FIRST_STEPS_XP,
        })
    }
}
