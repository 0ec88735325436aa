//! Interactive commands executed on the worker pool.
//!
//! Commands are front-end independent: the gateway layer parses the slash
//! command into a [`Command`] and hands over an [`InteractionResponder`]
//! able to answer the original interaction.

use std::fmt;

use tracing::{debug, info, warn};

use crate::db::{ExerciseCategory, LeaderboardKind};
use crate::error::AppError;
use crate::notifier::NotifyError;
use crate::tasks::TaskContext;

mod fetch;
mod link;
mod penance;
mod stats;
mod wimp;

pub use fetch::{CooldownScope, Cooldowns};
pub use penance::{PAGE_SIZE, requested_page};

/// Shown to the user when a command failed for a reason they cannot fix.
pub const GENERIC_ERROR: &str = "⚠️ Something went wrong while processing your request.";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Link {
        game_name: String,
        tag_line: String,
        region: String,
    },
    ForceFetch,
    Wimp {
        multiplier: f64,
        category: Option<ExerciseCategory>,
    },
    Penance,
    Complete {
        match_id: String,
    },
    Reroll {
        match_id: String,
    },
    Stats,
    Leaderboard {
        kind: LeaderboardKind,
    },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Link { .. } => "link",
            Self::ForceFetch => "forcefetch",
            Self::Wimp { .. } => "wimp",
            Self::Penance => "penance",
            Self::Complete { .. } => "complete",
            Self::Reroll { .. } => "reroll",
            Self::Stats => "stats",
            Self::Leaderboard { .. } => "leaderboard",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyButton {
    pub custom_id: String,
    pub label: String,
    pub disabled: bool,
}

/// Plain text answer to an interaction, with optional buttons.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reply {
    pub content: String,
    pub buttons: Vec<ReplyButton>,
}

impl Reply {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            buttons: Vec::new(),
        }
    }

    pub fn with_button(mut self, custom_id: String, label: &str, disabled: bool) -> Self {
        self.buttons.push(ReplyButton {
            custom_id,
            label: label.to_string(),
            disabled,
        });
        self
    }
}

/// Answers the interaction a task was created from.
pub trait InteractionResponder: Send + Sync {
    fn reply(&self, reply: Reply) -> Result<(), NotifyError>;
}

pub struct SlashCommandRequest {
    pub command: Command,
    pub requester: u64,
    /// `None` when invoked from direct messages.
    pub guild_id: Option<u64>,
    pub responder: Box<dyn InteractionResponder>,
}

impl fmt::Debug for SlashCommandRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlashCommandRequest")
            .field("command", &self.command)
            .field("requester", &self.requester)
            .field("guild_id", &self.guild_id)
            .finish_non_exhaustive()
    }
}

/// A button click on a message previously sent by a command.
pub struct ComponentInteraction {
    pub custom_id: String,
    pub requester: u64,
    pub responder: Box<dyn InteractionResponder>,
}

impl fmt::Debug for ComponentInteraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentInteraction")
            .field("custom_id", &self.custom_id)
            .field("requester", &self.requester)
            .finish_non_exhaustive()
    }
}

pub fn run_slash_command(ctx: &TaskContext, request: SlashCommandRequest) -> Result<(), AppError> {
    let SlashCommandRequest {
        command,
        requester,
        guild_id,
        responder,
    } = request;
    info!(requester, guild_id, "🛠️ [CMD] /{} invoked", command.name());

    let result = match command {
        Command::Link {
            game_name,
            tag_line,
            region,
        } => link::link(ctx, requester, &game_name, &tag_line, &region),
        Command::ForceFetch => fetch::force_fetch(ctx, requester, guild_id),
        Command::Wimp {
            multiplier,
            category,
        } => wimp::wimp(ctx, requester, multiplier, category),
        Command::Penance => penance::render_page(ctx, requester, 0),
        Command::Complete { match_id } => penance::complete(ctx, requester, &match_id),
        Command::Reroll { match_id } => penance::reroll(ctx, requester, &match_id),
        Command::Stats => stats::stats(ctx, requester),
        Command::Leaderboard { kind } => stats::leaderboard(ctx, kind),
    };

    respond(responder.as_ref(), result)
}

pub fn run_interaction(ctx: &TaskContext, interaction: ComponentInteraction) -> Result<(), AppError> {
    let Some(page) = requested_page(&interaction.custom_id) else {
        debug!(custom_id = interaction.custom_id, "🛠️ Ignoring unknown component");
        return Ok(());
    };

    respond(
        interaction.responder.as_ref(),
        penance::render_page(ctx, interaction.requester, page),
    )
}

fn respond(
    responder: &dyn InteractionResponder,
    result: Result<Reply, AppError>,
) -> Result<(), AppError> {
    match result {
        Ok(reply) => responder.reply(reply)?,
        Err(e) => match user_error_message(&e) {
            Some(message) => {
                debug!("🛠️ [CMD] Rejected input: {e}");
                responder.reply(Reply::text(message))?;
            }
            None => {
                if let Err(reply_err) = responder.reply(Reply::text(GENERIC_ERROR)) {
                    warn!("🛠️ [CMD] Could not send error reply: {reply_err}");
                }
                return Err(e);
            }
        },
    }

    Ok(())
}

/// Message for errors caused by the requester's input.
fn user_error_message(err: &AppError) -> Option<String> {
    match err {
        AppError::InvalidRegion(region) => Some(format!(
            "❌ Unknown region `{region}`. Use a platform code such as `euw1` or `na1`."
        )),
        AppError::InvalidMultiplier(_) => Some("❌ Multiplier must be positive.".to_string()),
        _ => None,
    }
}
