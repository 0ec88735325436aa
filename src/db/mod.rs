use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::{Connection, OptionalExtension, Row, params};
use thiserror::Error;
use tracing::{debug, info};

use crate::riot::types::AccountIdentity;

mod migrations;
pub mod models;

pub use models::{
    ExerciseCategory, ExerciseDefinition, LeaderboardEntry, LeaderboardKind, MatchRecord,
    Multipliers, NewPunishment, PunishmentItem, RegisteredAccount, UserStats,
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Database connection lock poisoned")]
    Poisoned,
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence contract used by the match poller and the commands.
pub trait Store: Send + Sync {
    fn list_accounts(&self) -> StoreResult<Vec<RegisteredAccount>>;

    fn has_match_record(&self, owner_id: u64, match_id: &str) -> StoreResult<bool>;

    /// Returns `true` only when the record did not exist before.
    fn save_match_record(&self, record: &MatchRecord) -> StoreResult<bool>;

    /// Saves the record and, when given, its punishment in one transaction.
    /// Returns `false` and writes nothing when the record already existed.
    fn record_match(
        &self,
        record: &MatchRecord,
        punishment: Option<&NewPunishment>,
    ) -> StoreResult<bool>;

    /// Returns `false` when a punishment already exists for the same owner and match.
    fn enqueue_punishment(&self, punishment: &NewPunishment) -> StoreResult<bool>;

    fn pick_random_exercise(&self) -> StoreResult<Option<ExerciseDefinition>>;

    /// 1.0 when the owner has no registered account.
    fn category_multiplier(&self, owner_id: u64, category: ExerciseCategory) -> StoreResult<f64>;

    fn update_last_seen_match(&self, owner_id: u64, puuid: &str, match_id: &str)
    -> StoreResult<()>;

    /// Registers an account for the owner, inheriting the owner's current multipliers.
    fn add_account(
        &self,
        owner_id: u64,
        identity: &AccountIdentity,
        region: &str,
    ) -> StoreResult<()>;

    /// Sets the multiplier of one category, or all of them when `None`.
    /// Returns the number of accounts updated.
    fn set_multiplier(
        &self,
        owner_id: u64,
        multiplier: f64,
        category: Option<ExerciseCategory>,
    ) -> StoreResult<usize>;

    /// Oldest first.
    fn pending_punishments(&self, owner_id: u64) -> StoreResult<Vec<PunishmentItem>>;

    fn punishment_for_match(
        &self,
        owner_id: u64,
        match_id: &str,
    ) -> StoreResult<Option<PunishmentItem>>;

    /// Moves the pending punishment into the history. `None` when nothing was pending.
    fn complete_punishment(
        &self,
        owner_id: u64,
        match_id: &str,
    ) -> StoreResult<Option<PunishmentItem>>;

    fn update_punishment(&self, id: i64, exercise_name: &str, reps: u32) -> StoreResult<()>;

    /// Replaces the whole exercise catalogue.
    fn seed_exercises(&self, exercises: &[ExerciseDefinition]) -> StoreResult<()>;

    fn match_record(&self, owner_id: u64, match_id: &str) -> StoreResult<Option<MatchRecord>>;

    /// Newest first.
    fn recent_match_records(&self, owner_id: u64, limit: u32) -> StoreResult<Vec<MatchRecord>>;

    fn user_stats(&self, owner_id: u64) -> StoreResult<UserStats>;

    /// Top ten owners for the given ranking, best first.
    fn leaderboard(&self, kind: LeaderboardKind) -> StoreResult<Vec<LeaderboardEntry>>;
}

/// SQLite backed [`Store`] sharing a single connection.
#[derive(Clone, Debug)]
pub struct SharedDatabase {
    conn: Arc<Mutex<Connection>>,
}

impl SharedDatabase {
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "🗄️ Opening database connection...");

        let conn = Connection::open(path)?;
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        debug!(mode, "🗄️ Journal mode set");

        Self::init(conn)
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> StoreResult<Self> {
        migrations::run_migrations(&conn)?;
        info!("🗄️ Database initialized");

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }
}

const PUNISHMENT_COLUMNS: &str =
    "id, user_id, match_id, exercise_name, reps, original_deaths, created_at";

fn punishment_from_row(row: &Row<'_>) -> rusqlite::Result<PunishmentItem> {
    Ok(PunishmentItem {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        match_id: row.get(2)?,
        exercise_name: row.get(3)?,
        reps: row.get(4)?,
        original_deaths: row.get(5)?,
        created_at: row.get(6)?,
    })
}

const GAME_COLUMNS: &str = "match_id, user_id, game_creation, game_duration, champion_name,
    kills, deaths, assists, win, kp_percent, cs, cs_per_min";

fn match_record_from_row(row: &Row<'_>) -> rusqlite::Result<MatchRecord> {
    Ok(MatchRecord {
        match_id: row.get(0)?,
        owner_id: row.get(1)?,
        game_creation: row.get(2)?,
        game_duration: row.get(3)?,
        champion_name: row.get(4)?,
        kills: row.get(5)?,
        deaths: row.get(6)?,
        assists: row.get(7)?,
        win: row.get(8)?,
        kp_percent: row.get(9)?,
        cs: row.get(10)?,
        cs_per_min: row.get(11)?,
    })
}

fn named_totals(
    conn: &Connection,
    sql: &str,
    owner_id: u64,
) -> rusqlite::Result<Vec<(String, u32)>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map([owner_id], |row| Ok((row.get(0)?, row.get(1)?)))?;
    rows.collect()
}

fn select_punishment(
    conn: &Connection,
    owner_id: u64,
    match_id: &str,
) -> rusqlite::Result<Option<PunishmentItem>> {
    conn.query_row(
        &format!(
            "SELECT {PUNISHMENT_COLUMNS} FROM exercise_queue WHERE user_id = ?1 AND match_id = ?2"
        ),
        params![owner_id, match_id],
        punishment_from_row,
    )
    .optional()
}

fn insert_match_record(conn: &Connection, record: &MatchRecord) -> rusqlite::Result<bool> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO games
        (match_id, user_id, game_creation, game_duration, champion_name,
         kills, deaths, assists, win, kp_percent, cs, cs_per_min)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            record.match_id,
            record.owner_id,
            record.game_creation,
            record.game_duration,
            record.champion_name,
            record.kills,
            record.deaths,
            record.assists,
            record.win,
            record.kp_percent,
            record.cs,
            record.cs_per_min,
        ],
    )?;

    Ok(inserted > 0)
}

fn insert_punishment(conn: &Connection, punishment: &NewPunishment) -> rusqlite::Result<bool> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO exercise_queue
        (user_id, match_id, exercise_name, reps, original_deaths)
        VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            punishment.owner_id,
            punishment.match_id,
            punishment.exercise_name,
            punishment.reps,
            punishment.original_deaths,
        ],
    )?;

    Ok(inserted > 0)
}

impl Store for SharedDatabase {
    fn list_accounts(&self) -> StoreResult<Vec<RegisteredAccount>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT discord_id, riot_puuid, riot_name, riot_tag, region, last_match_id,
                wimp_mult_upper, wimp_mult_lower, wimp_mult_core
            FROM users
            ORDER BY created_at, discord_id",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(RegisteredAccount {
                owner_id: row.get(0)?,
                puuid: row.get(1)?,
                game_name: row.get(2)?,
                tag_line: row.get(3)?,
                region: row.get(4)?,
                last_match_id: row.get(5)?,
                multipliers: Multipliers {
                    upper: row.get(6)?,
                    lower: row.get(7)?,
                    core: row.get(8)?,
                },
            })
        })?;

        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    fn has_match_record(&self, owner_id: u64, match_id: &str) -> StoreResult<bool> {
        let conn = self.lock()?;
        let found = conn
            .query_row(
                "SELECT 1 FROM games WHERE user_id = ?1 AND match_id = ?2",
                params![owner_id, match_id],
                |_| Ok(()),
            )
            .optional()?;

        Ok(found.is_some())
    }

    fn save_match_record(&self, record: &MatchRecord) -> StoreResult<bool> {
        let conn = self.lock()?;
        Ok(insert_match_record(&conn, record)?)
    }

    fn record_match(
        &self,
        record: &MatchRecord,
        punishment: Option<&NewPunishment>,
    ) -> StoreResult<bool> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        if !insert_match_record(&tx, record)? {
            return Ok(false);
        }
        if let Some(punishment) = punishment {
            insert_punishment(&tx, punishment)?;
        }
        tx.commit()?;

        Ok(true)
    }

    fn enqueue_punishment(&self, punishment: &NewPunishment) -> StoreResult<bool> {
        let conn = self.lock()?;
        Ok(insert_punishment(&conn, punishment)?)
    }

    fn pick_random_exercise(&self) -> StoreResult<Option<ExerciseDefinition>> {
        let conn = self.lock()?;
        let exercise = conn
            .query_row(
                "SELECT name, set_count, category FROM exercises ORDER BY RANDOM() LIMIT 1",
                [],
                |row| {
                    let category: String = row.get(2)?;
                    Ok(ExerciseDefinition {
                        name: row.get(0)?,
                        set_count: row.get(1)?,
                        category: ExerciseCategory::from_label(&category),
                    })
                },
            )
            .optional()?;

        Ok(exercise)
    }

    fn category_multiplier(&self, owner_id: u64, category: ExerciseCategory) -> StoreResult<f64> {
        let conn = self.lock()?;
        let multiplier: Option<f64> = conn
            .query_row(
                &format!(
                    "SELECT {} FROM users WHERE discord_id = ?1 LIMIT 1",
                    category.multiplier_column()
                ),
                [owner_id],
                |row| row.get(0),
            )
            .optional()?;

        Ok(multiplier.unwrap_or(1.0))
    }

    fn update_last_seen_match(
        &self,
        owner_id: u64,
        puuid: &str,
        match_id: &str,
    ) -> StoreResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "UPDATE users SET last_match_id = ?1 WHERE discord_id = ?2 AND riot_puuid = ?3",
            params![match_id, owner_id, puuid],
        )?;

        Ok(())
    }

    fn add_account(
        &self,
        owner_id: u64,
        identity: &AccountIdentity,
        region: &str,
    ) -> StoreResult<()> {
        let conn = self.lock()?;
        let multipliers = conn
            .query_row(
                "SELECT wimp_mult_upper, wimp_mult_lower, wimp_mult_core
                FROM users WHERE discord_id = ?1 LIMIT 1",
                [owner_id],
                |row| {
                    Ok(Multipliers {
                        upper: row.get(0)?,
                        lower: row.get(1)?,
                        core: row.get(2)?,
                    })
                },
            )
            .optional()?
            .unwrap_or_default();

        conn.execute(
            "INSERT INTO users
            (discord_id, riot_puuid, riot_name, riot_tag, region,
             wimp_mult_upper, wimp_mult_lower, wimp_mult_core)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(discord_id, riot_puuid) DO UPDATE SET
                riot_name = excluded.riot_name,
                riot_tag = excluded.riot_tag,
                region = excluded.region",
            params![
                owner_id,
                identity.puuid,
                identity.game_name,
                identity.tag_line,
                region,
                multipliers.upper,
                multipliers.lower,
                multipliers.core,
            ],
        )?;

        Ok(())
    }

    fn set_multiplier(
        &self,
        owner_id: u64,
        multiplier: f64,
        category: Option<ExerciseCategory>,
    ) -> StoreResult<usize> {
        let assignments = match category {
            Some(category) => format!("{} = ?1", category.multiplier_column()),
            None => ExerciseCategory::ALL
                .iter()
                .map(|c| format!("{} = ?1", c.multiplier_column()))
                .collect::<Vec<_>>()
                .join(", "),
        };

        let conn = self.lock()?;
        let updated = conn.execute(
            &format!("UPDATE users SET {assignments} WHERE discord_id = ?2"),
            params![multiplier, owner_id],
        )?;

        Ok(updated)
    }

    fn pending_punishments(&self, owner_id: u64) -> StoreResult<Vec<PunishmentItem>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {PUNISHMENT_COLUMNS} FROM exercise_queue WHERE user_id = ?1 ORDER BY id"
        ))?;
        let rows = stmt.query_map([owner_id], punishment_from_row)?;

        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    fn punishment_for_match(
        &self,
        owner_id: u64,
        match_id: &str,
    ) -> StoreResult<Option<PunishmentItem>> {
        let conn = self.lock()?;
        Ok(select_punishment(&conn, owner_id, match_id)?)
    }

    fn complete_punishment(
        &self,
        owner_id: u64,
        match_id: &str,
    ) -> StoreResult<Option<PunishmentItem>> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let Some(item) = select_punishment(&tx, owner_id, match_id)? else {
            return Ok(None);
        };

        tx.execute("DELETE FROM exercise_queue WHERE id = ?1", [item.id])?;
        tx.execute(
            "INSERT INTO exercise_history (user_id, match_id, exercise_name, reps)
            VALUES (?1, ?2, ?3, ?4)",
            params![item.owner_id, item.match_id, item.exercise_name, item.reps],
        )?;
        tx.commit()?;

        Ok(Some(item))
    }

    fn update_punishment(&self, id: i64, exercise_name: &str, reps: u32) -> StoreResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "UPDATE exercise_queue SET exercise_name = ?1, reps = ?2 WHERE id = ?3",
            params![exercise_name, reps, id],
        )?;

        Ok(())
    }

    fn seed_exercises(&self, exercises: &[ExerciseDefinition]) -> StoreResult<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        tx.execute("DELETE FROM exercises", [])?;
        {
            let mut stmt =
                tx.prepare("INSERT INTO exercises (name, set_count, category) VALUES (?1, ?2, ?3)")?;
            for exercise in exercises {
                stmt.execute(params![
                    exercise.name,
                    exercise.set_count,
                    exercise.category.as_str()
                ])?;
            }
        }
        tx.commit()?;

        info!(count = exercises.len(), "🗄️ Exercise catalogue seeded");
        Ok(())
    }

    fn match_record(&self, owner_id: u64, match_id: &str) -> StoreResult<Option<MatchRecord>> {
        let conn = self.lock()?;
        let record = conn
            .query_row(
                &format!("SELECT {GAME_COLUMNS} FROM games WHERE user_id = ?1 AND match_id = ?2"),
                params![owner_id, match_id],
                match_record_from_row,
            )
            .optional()?;

        Ok(record)
    }

    fn recent_match_records(&self, owner_id: u64, limit: u32) -> StoreResult<Vec<MatchRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {GAME_COLUMNS} FROM games WHERE user_id = ?1
            ORDER BY game_creation DESC LIMIT ?2"
        ))?;
        let rows = stmt.query_map(params![owner_id, limit], match_record_from_row)?;

        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    fn user_stats(&self, owner_id: u64) -> StoreResult<UserStats> {
        let conn = self.lock()?;

        let (total_deaths, total_games, most_deaths_single, duration): (u32, u32, u32, f64) = conn
            .query_row(
                "SELECT COALESCE(SUM(deaths), 0), COUNT(*), COALESCE(MAX(deaths), 0),
                    COALESCE(SUM(game_duration), 0.0)
                FROM games WHERE user_id = ?1",
                [owner_id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )?;

        let lowest_kda: f64 = conn.query_row(
            "SELECT COALESCE(MIN(CAST(kills + assists AS REAL) / deaths), 0.0)
            FROM games WHERE user_id = ?1 AND deaths > 0",
            [owner_id],
            |row| row.get(0),
        )?;

        let pending_count: u32 = conn.query_row(
            "SELECT COUNT(*) FROM exercise_queue WHERE user_id = ?1",
            [owner_id],
            |row| row.get(0),
        )?;

        let exercise_counts = named_totals(
            &conn,
            "SELECT exercise_name, SUM(reps) FROM exercise_history
            WHERE user_id = ?1 GROUP BY exercise_name ORDER BY exercise_name",
            owner_id,
        )?;
        let top_death_champs = named_totals(
            &conn,
            "SELECT champion_name, SUM(deaths) AS total FROM games
            WHERE user_id = ?1 GROUP BY champion_name
            HAVING total > 0 ORDER BY total DESC, champion_name LIMIT 3",
            owner_id,
        )?;

        let avg_deaths_per_min = if duration > 0.0 {
            f64::from(total_deaths) / (duration / 60.0)
        } else {
            0.0
        };

        Ok(UserStats {
            total_deaths,
            total_games,
            most_deaths_single,
            avg_deaths_per_min,
            lowest_kda,
            exercise_counts,
            top_death_champs,
            pending_count,
        })
    }

    fn leaderboard(&self, kind: LeaderboardKind) -> StoreResult<Vec<LeaderboardEntry>> {
        let (source, score, having) = match kind {
            LeaderboardKind::Reps => ("exercise_history", "SUM(t.reps)", ""),
            LeaderboardKind::Deaths => ("games", "SUM(t.deaths)", ""),
            LeaderboardKind::Kda => (
                "games",
                "CAST(SUM(t.kills) + SUM(t.assists) AS REAL) / MAX(SUM(t.deaths), 1)",
                "HAVING COUNT(*) > 5",
            ),
        };

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT
                COALESCE((SELECT riot_name FROM users u WHERE u.discord_id = t.user_id
                    ORDER BY created_at LIMIT 1), 'Unknown'),
                CAST({score} AS REAL) AS score
            FROM {source} t
            GROUP BY t.user_id {having}
            ORDER BY score DESC
            LIMIT 10"
        ))?;
        let rows = stmt.query_map([], |row| {
            Ok(LeaderboardEntry {
                name: row.get(0)?,
                score: row.get(1)?,
            })
        })?;

        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }
}
