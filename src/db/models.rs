use crate::riot::types::MatchStats;

/// Difficulty bucket an exercise trains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExerciseCategory {
    Upper,
    Lower,
    Core,
}

impl ExerciseCategory {
    pub const ALL: [ExerciseCategory; 3] = [Self::Upper, Self::Lower, Self::Core];

    /// Unknown labels are read as [`ExerciseCategory::Upper`].
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "lower" => Self::Lower,
            "core" => Self::Core,
            _ => Self::Upper,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upper => "upper",
            Self::Lower => "lower",
            Self::Core => "core",
        }
    }

    pub(crate) fn multiplier_column(&self) -> &'static str {
        match self {
            Self::Upper => "wimp_mult_upper",
            Self::Lower => "wimp_mult_lower",
            Self::Core => "wimp_mult_core",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExerciseDefinition {
    pub name: String,
    pub set_count: u32,
    pub category: ExerciseCategory,
}

impl ExerciseDefinition {
    /// Used when the catalogue is empty.
    pub fn fallback() -> Self {
        Self {
            name: "Pushups".to_string(),
            set_count: 10,
            category: ExerciseCategory::Upper,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Multipliers {
    pub upper: f64,
    pub lower: f64,
    pub core: f64,
}

impl Default for Multipliers {
    fn default() -> Self {
        Self {
            upper: 1.0,
            lower: 1.0,
            core: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegisteredAccount {
    /// Discord user owning the account.
    pub owner_id: u64,
    pub puuid: String,
    pub game_name: String,
    pub tag_line: String,
    pub region: String,
    pub multipliers: Multipliers,
    pub last_match_id: Option<String>,
}

impl RegisteredAccount {
    pub fn riot_id(&self) -> String {
        format!("{}#{}", self.game_name, self.tag_line)
    }
}

/// Persisted outcome of one match for one owner. Its presence marks the match as processed.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchRecord {
    pub match_id: String,
    pub owner_id: u64,
    pub game_creation: i64,
    pub game_duration: i64,
    pub champion_name: String,
    pub kills: u32,
    pub deaths: u32,
    pub assists: u32,
    pub win: bool,
    pub kp_percent: f64,
    pub cs: u32,
    pub cs_per_min: f64,
}

impl MatchRecord {
    pub fn from_stats(owner_id: u64, stats: &MatchStats) -> Self {
        Self {
            match_id: stats.match_id.clone(),
            owner_id,
            game_creation: stats.game_creation,
            game_duration: stats.game_duration,
            champion_name: stats.champion_name.clone(),
            kills: stats.kills,
            deaths: stats.deaths,
            assists: stats.assists,
            win: stats.win,
            kp_percent: stats.kp_percent,
            cs: stats.cs,
            cs_per_min: stats.cs_per_min,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewPunishment {
    pub owner_id: u64,
    pub match_id: String,
    pub exercise_name: String,
    pub reps: u32,
    pub original_deaths: u32,
}

/// A pending exercise assignment.
#[derive(Debug, Clone, PartialEq)]
pub struct PunishmentItem {
    pub id: i64,
    pub owner_id: u64,
    pub match_id: String,
    pub exercise_name: String,
    pub reps: u32,
    pub original_deaths: u32,
    /// Unix seconds.
    pub created_at: i64,
}

/// Aggregated history of one owner.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserStats {
    pub total_deaths: u32,
    pub total_games: u32,
    pub most_deaths_single: u32,
    pub avg_deaths_per_min: f64,
    /// Lowest KDA among games with at least one death, 0 when there is none.
    pub lowest_kda: f64,
    /// Completed reps per exercise.
    pub exercise_counts: Vec<(String, u32)>,
    /// Champions with the most deaths, at most three.
    pub top_death_champs: Vec<(String, u32)>,
    pub pending_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaderboardKind {
    Reps,
    Deaths,
    Kda,
}

impl LeaderboardKind {
    /// Unknown labels rank by completed reps.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "deaths" => Self::Deaths,
            "kda" => Self::Kda,
            _ => Self::Reps,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Reps => "Gym Rats (Reps)",
            Self::Deaths => "Feeders (Deaths)",
            Self::Kda => "Carries (KDA)",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LeaderboardEntry {
    pub name: String,
    pub score: f64,
}
