//! Frontend Models
//!
//! Data structures matching backend entities.

use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::resource::Resource;

/// Maximum length of a task name
pub const NOMBRE_MAX_CHARS: usize = 200;

/// Modules are numbered 0 through 5
pub const MAX_MODULE_NUMBER: u32 = 5;

// ========================
// Tareas
// ========================

/// Task fields (the id travels in the cached record)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tarea {
    pub nombre: String,
    pub completada: bool,
}

impl Tarea {
    pub fn new(nombre: &str) -> Self {
        Self {
            nombre: nombre.to_string(),
            completada: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrearTarea {
    pub nombre: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ActualizarTarea {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nombre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completada: Option<bool>,
}

impl ActualizarTarea {
    pub fn completada(completada: bool) -> Self {
        Self {
            completada: Some(completada),
            ..Default::default()
        }
    }

    pub fn nombre(nombre: &str) -> Self {
        Self {
            nombre: Some(nombre.to_string()),
            ..Default::default()
        }
    }
}

/// Trimmed, 1..=200 characters
fn validate_nombre(nombre: &str) -> ApiResult<String> {
    let trimmed = nombre.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation("El nombre es requerido"));
    }
    if trimmed.chars().count() > NOMBRE_MAX_CHARS {
        return Err(ApiError::validation("El nombre no puede exceder 200 caracteres"));
    }
    Ok(trimmed.to_string())
}

impl Resource for Tarea {
    type Id = i64;
    type Draft = CrearTarea;
    type Patch = ActualizarTarea;

    const PATH: &'static str = "/tareas";

    fn validate_draft(draft: CrearTarea) -> ApiResult<CrearTarea> {
        Ok(CrearTarea {
            nombre: validate_nombre(&draft.nombre)?,
        })
    }

    fn validate_patch(patch: ActualizarTarea) -> ApiResult<ActualizarTarea> {
        let nombre = patch.nombre.as_deref().map(validate_nombre).transpose()?;
        Ok(ActualizarTarea { nombre, ..patch })
    }

    fn speculative(draft: &CrearTarea) -> Self {
        Tarea::new(&draft.nombre)
    }

    fn apply_patch(&mut self, patch: &ActualizarTarea) {
        if let Some(nombre) = &patch.nombre {
            self.nombre = nombre.clone();
        }
        if let Some(completada) = patch.completada {
            self.completada = completada;
        }
    }
}

/// Aggregate served by `GET /tareas/stats`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Estadisticas {
    pub total: u32,
    pub completadas: u32,
    pub pendientes: u32,
}

// ========================
// Academy progress
// ========================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    #[default]
    Locked,
    Unlocked,
    InProgress,
    Completed,
}

impl ProgressStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgressStatus::Locked => "locked",
            ProgressStatus::Unlocked => "unlocked",
            ProgressStatus::InProgress => "in_progress",
            ProgressStatus::Completed => "completed",
        }
    }

    /// Status reached by the "advance" action; locked classes stay locked
    pub fn next(&self) -> Option<Self> {
        match self {
            ProgressStatus::Locked => None,
            ProgressStatus::Unlocked => Some(ProgressStatus::InProgress),
            ProgressStatus::InProgress => Some(ProgressStatus::Completed),
            ProgressStatus::Completed => None,
        }
    }
}

/// Per-class progress of one player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    pub player_id: i64,
    pub module_number: u32,
    pub class_number: u32,
    pub status: ProgressStatus,
    #[serde(default)]
    pub exercises_completed: u32,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub completed_at: Option<String>,
    #[serde(default)]
    pub last_accessed_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressCreate {
    pub player_id: i64,
    pub module_number: u32,
    pub class_number: u32,
    pub status: ProgressStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProgressUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ProgressStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exercises_completed: Option<u32>,
}

impl Resource for Progress {
    type Id = i64;
    type Draft = ProgressCreate;
    type Patch = ProgressUpdate;

    const PATH: &'static str = "/progress";

    fn validate_draft(draft: ProgressCreate) -> ApiResult<ProgressCreate> {
        if draft.player_id <= 0 {
            return Err(ApiError::validation("A player is required"));
        }
        if draft.module_number > MAX_MODULE_NUMBER {
            return Err(ApiError::validation(format!(
                "Module {} does not exist (0-{})",
                draft.module_number, MAX_MODULE_NUMBER
            )));
        }
        Ok(draft)
    }

    fn speculative(draft: &ProgressCreate) -> Self {
        Self {
            player_id: draft.player_id,
            module_number: draft.module_number,
            class_number: draft.class_number,
            status: draft.status,
            exercises_completed: 0,
            started_at: None,
            completed_at: None,
            last_accessed_at: None,
        }
    }

    fn apply_patch(&mut self, patch: &ProgressUpdate) {
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(count) = patch.exercises_completed {
            self.exercises_completed = count;
        }
    }
}

/// Aggregate served by `GET /player/{id}/stats`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub player_id: i64,
    pub classes_completed: u32,
    pub exercises_completed: u32,
    pub bug_hunt_wins: u32,
    pub bug_hunt_games_played: u32,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub last_activity_date: Option<String>,
}

/// Course-wide progress served by `GET /progress/{player}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseProgress {
    pub player_id: i64,
    pub total_classes_completed: u32,
    pub total_exercises_completed: u32,
    pub overall_progress_percentage: f64,
    pub modules: Vec<ModuleSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleSummary {
    pub module_number: u32,
    pub module_name: String,
    pub total_classes: u32,
    pub completed_classes: u32,
    pub progress_percentage: f64,
    pub classes: Vec<ClassSummary>,
}

/// One class inside a module summary; `id` is absent until the class is unlocked
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassSummary {
    #[serde(default)]
    pub id: Option<i64>,
    pub class_number: u32,
    pub status: ProgressStatus,
    #[serde(default)]
    pub exercises_completed: u32,
    #[serde(default)]
    pub completed_at: Option<String>,
}

/// Next class the player may unlock
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NextClass {
    pub module_number: u32,
    pub class_number: u32,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub xp_reward: u32,
}

// ========================
// Players
// ========================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: i64,
    pub username: String,
    pub avatar: String,
    pub level: u32,
    pub xp: u32,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub last_login: Option<String>,
}

pub const DEFAULT_AVATAR: &str = "default.png";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerCreate {
    pub username: String,
    pub avatar: String,
}

impl PlayerCreate {
    pub fn new(username: &str) -> Self {
        Self {
            username: username.to_string(),
            avatar: DEFAULT_AVATAR.to_string(),
        }
    }

    /// Trimmed username of 3 to 20 characters
    pub fn validate(self) -> ApiResult<Self> {
        let username = validate_username(&self.username, 20)?;
        Ok(Self { username, ..self })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlayerUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl PlayerUpdate {
    /// Renames may use up to 50 characters
    pub fn validate(self) -> ApiResult<Self> {
        let username = self
            .username
            .as_deref()
            .map(|name| validate_username(name, 50))
            .transpose()?;
        Ok(Self { username, ..self })
    }
}

fn validate_username(username: &str, max_chars: usize) -> ApiResult<String> {
    let trimmed = username.trim();
    let len = trimmed.chars().count();
    if len < 3 || len > max_chars {
        return Err(ApiError::validation(format!(
            "Username must be 3-{} characters",
            max_chars
        )));
    }
    Ok(trimmed.to_string())
}

// ========================
// Achievements
// ========================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AchievementCategory {
    Learning,
    Minigame,
    Streak,
    Mastery,
    Special,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AchievementRarity {
    Common,
    Rare,
    Epic,
    Legendary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AchievementDefinition {
    pub achievement_id: String,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub category: AchievementCategory,
    pub rarity: AchievementRarity,
    pub xp_reward: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AchievementCatalog {
    pub total_achievements: u32,
    pub achievements: Vec<AchievementDefinition>,
}

/// An achievement a player has unlocked, with its definition inlined
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnlockedAchievement {
    pub id: i64,
    pub player_id: i64,
    pub achievement_id: String,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub category: AchievementCategory,
    pub rarity: AchievementRarity,
    pub xp_reward: u32,
    pub unlocked_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerAchievements {
    pub player_id: i64,
    pub total_achievements: u32,
    pub achievements: Vec<UnlockedAchievement>,
}

/// Player action that may unlock achievements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AchievementAction {
    CompleteClass,
    BugHuntWin,
    CompleteExercise,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckAchievements {
    pub player_id: i64,
    pub action_type: AchievementAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_data: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AchievementsUnlocked {
    pub achievements_unlocked: Vec<UnlockedAchievement>,
    pub xp_earned: u32,
}

// ========================
// Bug Hunt
// ========================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BugHuntStart {
    pub player_id: i64,
    /// Random when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
}

/// A game in progress: the buggy snippet to inspect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BugHuntSession {
    pub session_id: i64,
    pub template_id: String,
    pub title: String,
    pub description: String,
    pub difficulty: Difficulty,
    pub code: String,
    pub bugs_count: u32,
    pub max_xp: u32,
    pub started_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BugHuntSubmission {
    pub session_id: i64,
    pub player_id: i64,
    pub found_bug_lines: Vec<u32>,
    pub time_seconds: f64,
}

impl BugHuntSubmission {
    /// Duplicate lines are dropped; the time must be a non-negative number
    pub fn validate(mut self) -> ApiResult<Self> {
        if !self.time_seconds.is_finite() || self.time_seconds < 0.0 {
            return Err(ApiError::validation("Elapsed time must be zero or more seconds"));
        }
        self.found_bug_lines.sort_unstable();
        self.found_bug_lines.dedup();
        Ok(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BugResult {
    pub line: u32,
    pub found: bool,
    pub is_correct: bool,
    #[serde(default)]
    pub bug_type: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BugHuntResult {
    pub success: bool,
    pub score: u32,
    pub xp_earned: u32,
    pub bugs_found: u32,
    pub bugs_total: u32,
    pub bugs_missed: u32,
    pub false_positives: u32,
    pub accuracy: f64,
    pub time_seconds: f64,
    pub is_perfect: bool,
    pub results: Vec<BugResult>,
    #[serde(default)]
    pub performance_bonus: u32,
    #[serde(default)]
    pub achievements_unlocked: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub player_id: i64,
    pub username: String,
    pub score: u32,
    pub bugs_found: u32,
    pub bugs_total: u32,
    pub time_seconds: f64,
    pub accuracy: f64,
    pub difficulty: Difficulty,
    pub completed_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leaderboard {
    pub total_entries: u32,
    pub entries: Vec<LeaderboardEntry>,
    #[serde(default)]
    pub difficulty_filter: Option<Difficulty>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BugHuntStats {
    pub total_games_played: u32,
    pub total_bugs_found: u32,
    pub total_perfect_games: u32,
    pub best_score: u32,
    pub average_score: f64,
    pub average_accuracy: f64,
    #[serde(default)]
    pub favorite_difficulty: Option<Difficulty>,
    pub total_xp_earned: u32,
}

// ========================
// Auth
// ========================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub nombre: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: String,
    pub user: User,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub nombre: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}
