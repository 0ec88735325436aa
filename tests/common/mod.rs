#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use league_of_gains::commands::{Cooldowns, InteractionResponder, Reply};
use league_of_gains::db::{
    ExerciseCategory, ExerciseDefinition, LeaderboardEntry, LeaderboardKind, MatchRecord,
    NewPunishment, PunishmentItem, RegisteredAccount, SharedDatabase, Store, StoreError,
    StoreResult, UserStats,
};
use league_of_gains::notifier::{DirectMessenger, NotifyError};
use league_of_gains::riot::{
    AccountIdentity, GameApi, MatchStats, RiotApiError, RiotMatchError,
};
use league_of_gains::poller::InFlightChecks;
use league_of_gains::tasks::{TaskContext, TaskSubmitter};

/// In-memory stand-in for the Riot API.
#[derive(Default)]
pub struct FakeGameApi {
    pub accounts: Mutex<HashMap<(String, String), AccountIdentity>>,
    /// Newest first, as returned upstream.
    pub match_ids: Mutex<HashMap<String, Vec<String>>>,
    pub stats: Mutex<HashMap<String, MatchStats>>,
    pub failing: Mutex<HashSet<String>>,
    pub analyzed: Mutex<Vec<String>>,
}

impl FakeGameApi {
    pub fn with_history(puuid: &str, ids: &[&str]) -> Self {
        let api = Self::default();
        api.set_history(puuid, ids);
        api
    }

    pub fn set_history(&self, puuid: &str, ids: &[&str]) {
        self.match_ids.lock().unwrap().insert(
            puuid.to_string(),
            ids.iter().map(|id| id.to_string()).collect(),
        );
    }

    pub fn add_match(&self, match_id: &str, deaths: u32) {
        self.stats
            .lock()
            .unwrap()
            .insert(match_id.to_string(), stats(match_id, deaths));
    }

    pub fn fail_match(&self, match_id: &str) {
        self.failing.lock().unwrap().insert(match_id.to_string());
    }

    pub fn heal_match(&self, match_id: &str) {
        self.failing.lock().unwrap().remove(match_id);
    }

    pub fn add_account(&self, game_name: &str, tag_line: &str, puuid: &str) {
        self.accounts.lock().unwrap().insert(
            (game_name.to_string(), tag_line.to_string()),
            AccountIdentity {
                puuid: puuid.to_string(),
                game_name: game_name.to_string(),
                tag_line: tag_line.to_string(),
            },
        );
    }

    pub fn analyzed(&self) -> Vec<String> {
        self.analyzed.lock().unwrap().clone()
    }
}

impl GameApi for FakeGameApi {
    fn get_account_identity(
        &self,
        game_name: &str,
        tag_line: &str,
        _region: &str,
    ) -> Option<AccountIdentity> {
        self.accounts
            .lock()
            .unwrap()
            .get(&(game_name.to_string(), tag_line.to_string()))
            .cloned()
    }

    fn get_recent_match_ids(&self, puuid: &str, _region: &str, count: u32) -> Vec<String> {
        self.match_ids
            .lock()
            .unwrap()
            .get(puuid)
            .map(|ids| ids.iter().take(count as usize).cloned().collect())
            .unwrap_or_default()
    }

    fn analyze_match(
        &self,
        match_id: &str,
        _puuid: &str,
        _region: &str,
    ) -> Result<MatchStats, RiotMatchError> {
        self.analyzed.lock().unwrap().push(match_id.to_string());

        if self.failing.lock().unwrap().contains(match_id) {
            return Err(RiotApiError::RateLimited { attempts: 3 }.into());
        }
        self.stats
            .lock()
            .unwrap()
            .get(match_id)
            .cloned()
            .ok_or_else(|| RiotMatchError::PuuidNotInMatch {
                match_id: match_id.to_string(),
            })
    }
}

pub fn stats(match_id: &str, deaths: u32) -> MatchStats {
    MatchStats {
        match_id: match_id.to_string(),
        champion_name: "Garen".to_string(),
        kills: 4,
        deaths,
        assists: 2,
        win: false,
        kp_percent: 30.0,
        cs: 150,
        cs_per_min: 5.0,
        game_creation: 1_700_000_000_000,
        game_duration: 1800,
    }
}

#[derive(Default)]
pub struct RecordingMessenger {
    pub sent: Mutex<Vec<(u64, String)>>,
    pub fail: bool,
}

impl RecordingMessenger {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<(u64, String)> {
        self.sent.lock().unwrap().clone()
    }
}

impl DirectMessenger for RecordingMessenger {
    fn send_direct_message(&self, user_id: u64, text: &str) -> Result<(), NotifyError> {
        if self.fail {
            return Err(serenity::Error::Other("dms closed").into());
        }
        self.sent.lock().unwrap().push((user_id, text.to_string()));
        Ok(())
    }
}

/// Collects replies sent by commands.
#[derive(Clone, Default)]
pub struct RecordingResponder {
    pub replies: Arc<Mutex<Vec<Reply>>>,
}

impl RecordingResponder {
    pub fn boxed(&self) -> Box<dyn InteractionResponder> {
        Box::new(self.clone())
    }

    pub fn last(&self) -> Reply {
        self.replies
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no reply sent")
    }
}

impl InteractionResponder for RecordingResponder {
    fn reply(&self, reply: Reply) -> Result<(), NotifyError> {
        self.replies.lock().unwrap().push(reply);
        Ok(())
    }
}

pub struct Harness {
    pub db: Arc<SharedDatabase>,
    pub api: Arc<FakeGameApi>,
    pub messenger: Arc<RecordingMessenger>,
    pub submitter: TaskSubmitter<league_of_gains::tasks::Task>,
    pub ctx: TaskContext,
}

impl Harness {
    pub fn new(api: FakeGameApi) -> Self {
        Self::with_messenger(api, RecordingMessenger::default())
    }

    pub fn with_messenger(api: FakeGameApi, messenger: RecordingMessenger) -> Self {
        let db = Arc::new(SharedDatabase::open_in_memory().unwrap());
        let api = Arc::new(api);
        let messenger = Arc::new(messenger);
        let submitter = TaskSubmitter::new();

        let ctx = TaskContext {
            store: db.clone() as Arc<dyn Store>,
            api: api.clone() as Arc<dyn GameApi>,
            messenger: messenger.clone() as Arc<dyn DirectMessenger>,
            submitter: submitter.clone(),
            cooldowns: Cooldowns::default(),
            in_flight: InFlightChecks::default(),
            match_history_depth: 15,
        };

        Self {
            db,
            api,
            messenger,
            submitter,
            ctx,
        }
    }
}

/// Wraps the SQLite store to inject failures and stale reads.
pub struct FaultyStore {
    pub inner: Arc<SharedDatabase>,
    pub fail_next_pick: AtomicBool,
    pub fail_next_record: AtomicBool,
    /// Makes `has_match_record` always answer `false`, like a check that
    /// read before a concurrent one wrote.
    pub stale_reads: AtomicBool,
}

impl FaultyStore {
    pub fn new(inner: Arc<SharedDatabase>) -> Self {
        Self {
            inner,
            fail_next_pick: AtomicBool::new(false),
            fail_next_record: AtomicBool::new(false),
            stale_reads: AtomicBool::new(false),
        }
    }

    fn trip(flag: &AtomicBool) -> StoreResult<()> {
        if flag.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Poisoned);
        }
        Ok(())
    }
}

impl Store for FaultyStore {
    fn list_accounts(&self) -> StoreResult<Vec<RegisteredAccount>> {
        self.inner.list_accounts()
    }

    fn has_match_record(&self, owner_id: u64, match_id: &str) -> StoreResult<bool> {
        if self.stale_reads.load(Ordering::SeqCst) {
            return Ok(false);
        }
        self.inner.has_match_record(owner_id, match_id)
    }

    fn save_match_record(&self, record: &MatchRecord) -> StoreResult<bool> {
        self.inner.save_match_record(record)
    }

    fn record_match(
        &self,
        record: &MatchRecord,
        punishment: Option<&NewPunishment>,
    ) -> StoreResult<bool> {
        Self::trip(&self.fail_next_record)?;
        self.inner.record_match(record, punishment)
    }

    fn enqueue_punishment(&self, punishment: &NewPunishment) -> StoreResult<bool> {
        self.inner.enqueue_punishment(punishment)
    }

    fn pick_random_exercise(&self) -> StoreResult<Option<ExerciseDefinition>> {
        Self::trip(&self.fail_next_pick)?;
        self.inner.pick_random_exercise()
    }

    fn category_multiplier(&self, owner_id: u64, category: ExerciseCategory) -> StoreResult<f64> {
        self.inner.category_multiplier(owner_id, category)
    }

    fn update_last_seen_match(
        &self,
        owner_id: u64,
        puuid: &str,
        match_id: &str,
    ) -> StoreResult<()> {
        self.inner.update_last_seen_match(owner_id, puuid, match_id)
    }

    fn add_account(
        &self,
        owner_id: u64,
        identity: &AccountIdentity,
        region: &str,
    ) -> StoreResult<()> {
        self.inner.add_account(owner_id, identity, region)
    }

    fn set_multiplier(
        &self,
        owner_id: u64,
        multiplier: f64,
        category: Option<ExerciseCategory>,
    ) -> StoreResult<usize> {
        self.inner.set_multiplier(owner_id, multiplier, category)
    }

    fn pending_punishments(&self, owner_id: u64) -> StoreResult<Vec<PunishmentItem>> {
        self.inner.pending_punishments(owner_id)
    }

    fn punishment_for_match(
        &self,
        owner_id: u64,
        match_id: &str,
    ) -> StoreResult<Option<PunishmentItem>> {
        self.inner.punishment_for_match(owner_id, match_id)
    }

    fn complete_punishment(
        &self,
        owner_id: u64,
        match_id: &str,
    ) -> StoreResult<Option<PunishmentItem>> {
        self.inner.complete_punishment(owner_id, match_id)
    }

    fn update_punishment(&self, id: i64, exercise_name: &str, reps: u32) -> StoreResult<()> {
        self.inner.update_punishment(id, exercise_name, reps)
    }

    fn seed_exercises(&self, exercises: &[ExerciseDefinition]) -> StoreResult<()> {
        self.inner.seed_exercises(exercises)
    }

    fn match_record(&self, owner_id: u64, match_id: &str) -> StoreResult<Option<MatchRecord>> {
        self.inner.match_record(owner_id, match_id)
    }

    fn recent_match_records(&self, owner_id: u64, limit: u32) -> StoreResult<Vec<MatchRecord>> {
        self.inner.recent_match_records(owner_id, limit)
    }

    fn user_stats(&self, owner_id: u64) -> StoreResult<UserStats> {
        self.inner.user_stats(owner_id)
    }

    fn leaderboard(&self, kind: LeaderboardKind) -> StoreResult<Vec<LeaderboardEntry>> {
        self.inner.leaderboard(kind)
    }
}
