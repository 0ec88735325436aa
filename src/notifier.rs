//! Direct messages sent to account owners.

use std::sync::Arc;

use serenity::all::{CreateMessage, Http, UserId};
use thiserror::Error;
use tokio::runtime::Handle;
use tracing::debug;

#[derive(Debug, Error)]
#[error("Failed to deliver Discord message: {0}")]
pub struct NotifyError(#[source] Box<serenity::Error>);

impl From<serenity::Error> for NotifyError {
    fn from(err: serenity::Error) -> Self {
        Self(Box::new(err))
    }
}

/// A way to reach a Discord user privately.
pub trait DirectMessenger: Send + Sync {
    /// Called from worker threads. Implementations may block.
    fn send_direct_message(&self, user_id: u64, text: &str) -> Result<(), NotifyError>;
}

/// Sends direct messages through the serenity HTTP client, driving the
/// request to completion on the given runtime.
#[derive(Clone)]
pub struct DiscordMessenger {
    http: Arc<Http>,
    runtime: Handle,
}

impl DiscordMessenger {
    pub fn new(http: Arc<Http>, runtime: Handle) -> Self {
        Self { http, runtime }
    }
}

impl DirectMessenger for DiscordMessenger {
    fn send_direct_message(&self, user_id: u64, text: &str) -> Result<(), NotifyError> {
        if user_id == 0 {
            return Err(serenity::Error::Other("user id must be non-zero").into());
        }
        let message = CreateMessage::new().content(text);

        self.runtime.block_on(
            UserId::new(user_id).direct_message(self.http.as_ref(), message),
        )?;
        debug!(user_id, "💬 ✅ Direct message sent");

        Ok(())
    }
}
