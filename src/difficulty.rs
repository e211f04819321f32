//! Difficulty presets, round rules and scoring.
//!
//! A `DifficultyConfig` is selected once per round and never changes while the round runs.
//! Configs come from the built-in `Difficulty` presets or from a JSON file via
//! `load_settings`.
use crate::board::{MAX_TYPE_COUNT, MIN_TYPE_COUNT};
use crate::detector::{MatchGroup, MatchShape};
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Named difficulty level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    /// The preset parameter bundle for this level.
    ///
    /// # Examples
    /// ```
    /// use match3_engine::difficulty::{Difficulty, GoalKind};
    /// let cfg = Difficulty::Hard.config();
    /// assert_eq!(cfg.active_type_count, 6);
    /// assert_eq!(cfg.goal, GoalKind::ScoreAndObstacles);
    /// assert_eq!(cfg.target_obstacle_clear(), 24);
    /// ```
    pub fn config(&self) -> DifficultyConfig {
        match self {
            Difficulty::Easy => DifficultyConfig {
                duration_secs: 90.0,
                active_type_count: 5,
                score_multiplier: 1.0,
                target_score: 3500,
                obstacle_count: 6,
                chain_count: 3,
                shuffle_tool_charges: 3,
                max_obstacle_layer: 2,
                goal: GoalKind::Score,
            },
            Difficulty::Medium => DifficultyConfig {
                duration_secs: 60.0,
                active_type_count: 6,
                score_multiplier: 1.2,
                target_score: 5200,
                obstacle_count: 10,
                chain_count: 6,
                shuffle_tool_charges: 2,
                max_obstacle_layer: 2,
                goal: GoalKind::Obstacles,
            },
            Difficulty::Hard => DifficultyConfig {
                duration_secs: 45.0,
                active_type_count: 6,
                score_multiplier: 1.5,
                target_score: 7000,
                obstacle_count: 14,
                chain_count: 10,
                shuffle_tool_charges: 1,
                max_obstacle_layer: 3,
                goal: GoalKind::ScoreAndObstacles,
            },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }
}

/// What has to be achieved for the round goal to count as reached.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalKind {
    /// `score >= target_score`.
    Score,
    /// `obstacles_cleared >= target_obstacle_clear`.
    Obstacles,
    /// Both of the above at once.
    ScoreAndObstacles,
}

impl GoalKind {
    pub fn is_reached(
        &self,
        score: u32,
        target_score: u32,
        obstacles_cleared: usize,
        target_obstacle_clear: usize,
    ) -> bool {
        let score_ok = score >= target_score;
        let obstacles_ok = obstacles_cleared >= target_obstacle_clear;
        match self {
            GoalKind::Score => score_ok,
            GoalKind::Obstacles => obstacles_ok,
            GoalKind::ScoreAndObstacles => score_ok && obstacles_ok,
        }
    }
}

/// Parameters seeding board generation and the round goal.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DifficultyConfig {
    pub duration_secs: f32,
    pub active_type_count: u8,
    pub score_multiplier: f64,
    pub target_score: u32,
    /// Number of ice cells placed at round start.
    pub obstacle_count: usize,
    /// Number of chain cells placed at round start.
    pub chain_count: usize,
    pub shuffle_tool_charges: u32,
    /// Highest layer count drawn for either obstacle kind.
    pub max_obstacle_layer: u8,
    pub goal: GoalKind,
}

impl DifficultyConfig {
    pub fn duration(&self) -> Duration {
        secs_to_duration(self.duration_secs)
    }

    /// Obstacle cells that must be cleared for an obstacle goal.
    pub fn target_obstacle_clear(&self) -> usize {
        self.obstacle_count + self.chain_count
    }

    /// Checks the values a hand-written config could get wrong.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_TYPE_COUNT..=MAX_TYPE_COUNT).contains(&self.active_type_count) {
            return Err(ConfigError::Invalid(format!(
                "active_type_count must be in [{}, {}], got {}",
                MIN_TYPE_COUNT, MAX_TYPE_COUNT, self.active_type_count
            )));
        }
        if !self.duration_secs.is_finite() || self.duration_secs <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "duration_secs must be positive, got {}",
                self.duration_secs
            )));
        }
        if !self.score_multiplier.is_finite() || self.score_multiplier < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "score_multiplier must be a non-negative number, got {}",
                self.score_multiplier
            )));
        }
        if self.max_obstacle_layer == 0 {
            return Err(ConfigError::Invalid(
                "max_obstacle_layer must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for DifficultyConfig {
    fn default() -> Self {
        Difficulty::Medium.config()
    }
}

/// Round-level rules that do not vary with difficulty.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoundRules {
    /// Work progress needed to complete one round.
    pub progress_per_round: u32,
    pub base_fee_per_round: u32,
    /// Share of the score paid out as a bonus fee.
    pub fee_multiplier: f64,
    pub hint_cooldown_secs: f32,
}

impl Default for RoundRules {
    fn default() -> Self {
        RoundRules {
            progress_per_round: 1000,
            base_fee_per_round: 60,
            fee_multiplier: 0.5,
            hint_cooldown_secs: 15.0,
        }
    }
}

impl RoundRules {
    pub fn hint_cooldown(&self) -> Duration {
        secs_to_duration(self.hint_cooldown_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.hint_cooldown_secs.is_finite() || self.hint_cooldown_secs < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "hint_cooldown_secs must be a non-negative number, got {}",
                self.hint_cooldown_secs
            )));
        }
        if !self.fee_multiplier.is_finite() || self.fee_multiplier < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "fee_multiplier must be a non-negative number, got {}",
                self.fee_multiplier
            )));
        }
        Ok(())
    }
}

/// Negative and NaN values map to zero, values past `Duration::MAX` saturate.
fn secs_to_duration(secs: f32) -> Duration {
    if secs.is_nan() || secs <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f32(secs).unwrap_or(Duration::MAX)
}

/// Contents of a settings file: a difficulty config plus optional round rules.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameSettings {
    pub difficulty: DifficultyConfig,
    #[serde(default)]
    pub rules: RoundRules,
}

/// Reads and validates a JSON settings file.
pub fn load_settings(path: &Path) -> Result<GameSettings, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_settings(&content)
}

/// Parses and validates settings from a JSON string.
pub fn parse_settings(json: &str) -> Result<GameSettings, ConfigError> {
    let settings: GameSettings = serde_json::from_str(json)?;
    settings.difficulty.validate()?;
    settings.rules.validate()?;
    Ok(settings)
}

/// Base score of one group before combo bonus and multiplier.
pub fn group_base_score(group: &MatchGroup) -> u32 {
    let len = group.len();
    if len >= 5 && group.shape == MatchShape::LShape {
        500
    } else if len >= 5 {
        1000
    } else if len == 4 {
        300
    } else {
        100
    }
}

/// Per-group bonus for the `combo`-th cascade iteration.
pub fn combo_bonus(combo: u32) -> u32 {
    if combo > 1 {
        (combo - 1) * 50
    } else {
        0
    }
}

/// Score for one cascade iteration: every group's base score plus the combo bonus, summed,
/// scaled by `multiplier` and rounded to the nearest integer.
///
/// # Examples
/// ```
/// use match3_engine::board::Cell;
/// use match3_engine::detector::{MatchGroup, MatchShape, Orientation};
/// use match3_engine::difficulty::score_groups;
///
/// let three = MatchGroup {
///     cells: (0..3).map(|x| Cell::new(x, 0)).collect(),
///     orientation: Orientation::Horizontal,
///     shape: MatchShape::Line,
/// };
/// assert_eq!(score_groups(&[three.clone()], 1, 1.0), 100);
/// assert_eq!(score_groups(&[three], 3, 1.2), 240);
/// ```
pub fn score_groups(groups: &[MatchGroup], combo: u32, multiplier: f64) -> u32 {
    let total: u32 = groups
        .iter()
        .map(|g| group_base_score(g) + combo_bonus(combo))
        .sum();
    (total as f64 * multiplier).round() as u32
}

/// Adds `gained` to the work-progress accumulator and rolls over completed rounds.
///
/// # Returns
/// The number of rounds completed by this addition (possibly more than one).
pub fn add_work_progress(progress: &mut u32, gained: u32, per_round: u32) -> u32 {
    *progress += gained;
    if per_round == 0 {
        return 0;
    }
    let completed = *progress / per_round;
    *progress %= per_round;
    completed
}
