//! Match polling pipeline: fan-out over registered accounts and the
//! incremental per-account check turning new matches into punishments.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{Span, debug, info, instrument, warn};

use crate::db::{ExerciseDefinition, MatchRecord, NewPunishment, RegisteredAccount};
use crate::error::AppError;
use crate::riot::MatchStats;
use crate::tasks::{Task, TaskContext};

pub mod scheduler;

/// Result of one account check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountCheckOutcome {
    /// Newly recorded match ids, oldest first.
    pub recorded: Vec<String>,
    /// Matches whose analysis failed and will be retried on the next poll.
    pub failed: usize,
}

type AccountKey = (u64, String);

fn account_key(account: &RegisteredAccount) -> AccountKey {
    (account.owner_id, account.puuid.clone())
}

/// Accounts with a check queued or running.
#[derive(Debug, Default)]
pub struct InFlightChecks {
    accounts: Mutex<HashSet<AccountKey>>,
}

impl InFlightChecks {
    /// Returns `false` when the account already has a check in flight.
    fn claim(&self, account: &RegisteredAccount) -> bool {
        self.lock().insert(account_key(account))
    }

    fn release(&self, key: &AccountKey) {
        self.lock().remove(key);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<AccountKey>> {
        self.accounts.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Releases the claim when the check ends, panics included.
struct ClaimGuard<'a> {
    checks: &'a InFlightChecks,
    key: AccountKey,
}

impl Drop for ClaimGuard<'_> {
    fn drop(&mut self) {
        self.checks.release(&self.key);
    }
}

/// Submit one low priority check per registered account, skipping accounts
/// whose previous check has not finished. Returns how many were queued.
pub fn dispatch_account_checks(ctx: &TaskContext) -> Result<usize, AppError> {
    let accounts = ctx.store.list_accounts()?;

    if accounts.is_empty() {
        debug!("🔄 No accounts registered, skipping poll cycle");
        return Ok(0);
    }

    let mut queued = 0;
    let mut skipped = 0;
    for account in accounts {
        if !ctx.in_flight.claim(&account) {
            skipped += 1;
            continue;
        }
        ctx.submitter.submit(Task::check_account(account));
        queued += 1;
    }

    info!(queued, skipped, "🔄 Queued {} account check(s)", queued);
    Ok(queued)
}

/// Run a check queued by [`dispatch_account_checks`] and release its claim.
pub fn run_queued_check(
    ctx: &TaskContext,
    account: &RegisteredAccount,
) -> Result<AccountCheckOutcome, AppError> {
    let _claim = ClaimGuard {
        checks: &ctx.in_flight,
        key: account_key(account),
    };

    check_account(ctx, account)
}

/// Process every match of the account not seen before, oldest first.
#[instrument(
    skip_all,
    fields(
        owner_id = account.owner_id,
        riot_id = %account.riot_id(),
        region = %account.region,
        recorded
    )
)]
pub fn check_account(
    ctx: &TaskContext,
    account: &RegisteredAccount,
) -> Result<AccountCheckOutcome, AppError> {
    let mut outcome = AccountCheckOutcome::default();

    let mut match_ids =
        ctx.api
            .get_recent_match_ids(&account.puuid, &account.region, ctx.match_history_depth);
    if match_ids.is_empty() {
        debug!("🔄 No matches found");
        return Ok(outcome);
    }
    match_ids.reverse();

    for match_id in &match_ids {
        if ctx.store.has_match_record(account.owner_id, match_id)? {
            continue;
        }

        let stats = match ctx.api.analyze_match(match_id, &account.puuid, &account.region) {
            Ok(stats) => stats,
            Err(e) => {
                warn!(match_id, "🔄 ⚠️ Match analysis failed, will retry next poll: {e}");
                outcome.failed += 1;
                continue;
            }
        };

        let punishment = if stats.deaths > 0 {
            Some(plan_punishment(ctx, account, &stats)?)
        } else {
            None
        };

        let record = MatchRecord::from_stats(account.owner_id, &stats);
        let new_punishment = punishment.as_ref().map(|(punishment, _)| punishment);
        if !ctx.store.record_match(&record, new_punishment)? {
            debug!(match_id, "🔄 Match already recorded concurrently");
            continue;
        }
        outcome.recorded.push(match_id.clone());

        match punishment {
            Some((punishment, exercise)) => notify_owner(ctx, account, &punishment, &exercise),
            None => debug!(match_id, "🔄 Deathless match recorded"),
        }
    }

    if let Some(latest) = outcome.recorded.last() {
        ctx.store
            .update_last_seen_match(account.owner_id, &account.puuid, latest)?;
    }

    Span::current().record("recorded", outcome.recorded.len());
    if !outcome.recorded.is_empty() {
        info!(
            count = outcome.recorded.len(),
            failed = outcome.failed,
            "🔄 ✅ Recorded new matches"
        );
    }

    Ok(outcome)
}

/// Pick an exercise and size the punishment for a match with deaths.
fn plan_punishment(
    ctx: &TaskContext,
    account: &RegisteredAccount,
    stats: &MatchStats,
) -> Result<(NewPunishment, ExerciseDefinition), AppError> {
    let exercise = ctx
        .store
        .pick_random_exercise()?
        .unwrap_or_else(ExerciseDefinition::fallback);
    let multiplier = ctx
        .store
        .category_multiplier(account.owner_id, exercise.category)?;
    let reps = compute_reps(stats.deaths, exercise.set_count, multiplier);

    let punishment = NewPunishment {
        owner_id: account.owner_id,
        match_id: stats.match_id.clone(),
        exercise_name: exercise.name.clone(),
        reps,
        original_deaths: stats.deaths,
    };
    Ok((punishment, exercise))
}

fn notify_owner(
    ctx: &TaskContext,
    account: &RegisteredAccount,
    punishment: &NewPunishment,
    exercise: &ExerciseDefinition,
) {
    let text = format!(
        "💀 **New Match Detected** ({})\nDeaths: {}\nPenance: {} {} ({})",
        account.riot_id(),
        punishment.original_deaths,
        punishment.reps,
        punishment.exercise_name,
        exercise.category.as_str()
    );
    if let Err(e) = ctx.messenger.send_direct_message(account.owner_id, &text) {
        warn!(match_id = punishment.match_id, "💬 ⚠️ Could not notify owner: {e}");
    }
}

/// `max(1, floor(deaths × set_count × multiplier))`.
pub fn compute_reps(deaths: u32, set_count: u32, multiplier: f64) -> u32 {
    let reps = (f64::from(deaths) * f64::from(set_count) * multiplier).floor() as u32;
    reps.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reps_scale_with_deaths_and_multiplier() {
        assert_eq!(compute_reps(3, 10, 0.5), 15);
        assert_eq!(compute_reps(4, 10, 1.0), 40);
        assert_eq!(compute_reps(3, 10, 1.25), 37);
    }

    #[test]
    fn reps_never_drop_below_one() {
        assert_eq!(compute_reps(1, 10, 0.01), 1);
        assert_eq!(compute_reps(1, 0, 1.0), 1);
    }
}
