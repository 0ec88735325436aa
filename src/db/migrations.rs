use rusqlite::Connection;
use tracing::info;

use super::StoreError;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    discord_id INTEGER NOT NULL,
    riot_puuid TEXT NOT NULL,
    riot_name TEXT NOT NULL,
    riot_tag TEXT NOT NULL,
    region TEXT NOT NULL,
    last_match_id TEXT,
    wimp_mult_upper REAL NOT NULL DEFAULT 1.0,
    wimp_mult_lower REAL NOT NULL DEFAULT 1.0,
    wimp_mult_core REAL NOT NULL DEFAULT 1.0,
    created_at INTEGER NOT NULL DEFAULT (unixepoch()),
    PRIMARY KEY (discord_id, riot_puuid)
);

CREATE TABLE IF NOT EXISTS exercises (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    set_count INTEGER NOT NULL,
    category TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS games (
    match_id TEXT NOT NULL,
    user_id INTEGER NOT NULL,
    game_creation INTEGER NOT NULL,
    game_duration INTEGER NOT NULL,
    champion_name TEXT NOT NULL,
    kills INTEGER NOT NULL,
    deaths INTEGER NOT NULL,
    assists INTEGER NOT NULL,
    win INTEGER NOT NULL,
    kp_percent REAL NOT NULL,
    cs INTEGER NOT NULL,
    cs_per_min REAL NOT NULL,
    PRIMARY KEY (match_id, user_id)
);

CREATE TABLE IF NOT EXISTS exercise_queue (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL,
    match_id TEXT NOT NULL,
    exercise_name TEXT NOT NULL,
    reps INTEGER NOT NULL,
    original_deaths INTEGER NOT NULL,
    created_at INTEGER NOT NULL DEFAULT (unixepoch()),
    UNIQUE (user_id, match_id)
);

CREATE TABLE IF NOT EXISTS exercise_history (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL,
    match_id TEXT NOT NULL,
    exercise_name TEXT NOT NULL,
    reps INTEGER NOT NULL,
    completed_at INTEGER NOT NULL DEFAULT (unixepoch())
);

CREATE INDEX IF NOT EXISTS idx_exercise_queue_user ON exercise_queue(user_id);
CREATE INDEX IF NOT EXISTS idx_games_user ON games(user_id);
"#;

pub fn run_migrations(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(SCHEMA)?;
    info!("🗄️ Database migrations completed");
    Ok(())
}
