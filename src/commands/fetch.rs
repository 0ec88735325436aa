use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::error::AppError;
use crate::tasks::{Task, TaskContext, TaskPriority};

use super::Reply;

/// Who a force fetch cooldown applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CooldownScope {
    Guild(u64),
    /// Direct messages, keyed by user.
    User(u64),
}

impl CooldownScope {
    pub fn for_invocation(requester: u64, guild_id: Option<u64>) -> Self {
        match guild_id {
            Some(guild_id) => Self::Guild(guild_id),
            None => Self::User(requester),
        }
    }
}

#[derive(Debug)]
pub struct Cooldowns {
    window: Duration,
    last_use: Mutex<HashMap<CooldownScope, Instant>>,
}

impl Cooldowns {
    pub const FORCE_FETCH_WINDOW: Duration = Duration::from_secs(60);

    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_use: Mutex::new(HashMap::new()),
        }
    }

    /// Start a cooldown for `scope`, or return the time left on the running one.
    pub fn try_start(&self, scope: CooldownScope, now: Instant) -> Result<(), Duration> {
        let mut last_use = self.last_use.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(previous) = last_use.get(&scope) {
            let elapsed = now.saturating_duration_since(*previous);
            if elapsed < self.window {
                return Err(self.window - elapsed);
            }
        }

        last_use.insert(scope, now);
        Ok(())
    }
}

impl Default for Cooldowns {
    fn default() -> Self {
        Self::new(Self::FORCE_FETCH_WINDOW)
    }
}

pub(super) fn force_fetch(
    ctx: &TaskContext,
    requester: u64,
    guild_id: Option<u64>,
) -> Result<Reply, AppError> {
    let scope = CooldownScope::for_invocation(requester, guild_id);

    if let Err(remaining) = ctx.cooldowns.try_start(scope, Instant::now()) {
        // Round up so a 0.4s remainder still reads as 1s.
        let secs = remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0);
        debug!(?scope, secs, "🛠️ [CMD] Force fetch on cooldown");
        return Ok(Reply::text(format!(
            "⏳ Please wait {secs}s before fetching again."
        )));
    }

    ctx.submitter.submit(Task::tracker_update(TaskPriority::High));
    Ok(Reply::text("🚀 Update queued!"))
}
