use std::sync::Arc;

use crate::commands::{self, ComponentInteraction, Cooldowns, SlashCommandRequest};
use crate::db::{RegisteredAccount, Store};
use crate::error::AppError;
use crate::notifier::DirectMessenger;
use crate::poller::{self, InFlightChecks};
use crate::riot::GameApi;

pub mod pool;

pub use pool::{Job, TaskPriority, TaskSubmitter, WorkerPool};

/// Collaborators shared by every task running on the pool.
pub struct TaskContext {
    pub store: Arc<dyn Store>,
    pub api: Arc<dyn GameApi>,
    pub messenger: Arc<dyn DirectMessenger>,
    pub submitter: TaskSubmitter<Task>,
    pub cooldowns: Cooldowns,
    pub in_flight: InFlightChecks,
    /// Number of recent matches inspected per account check.
    pub match_history_depth: u32,
}

#[derive(Debug)]
pub enum TaskPayload {
    SlashCommand(SlashCommandRequest),
    Interaction(ComponentInteraction),
    /// Fan out one account check per registered account.
    TrackerUpdate,
    CheckAccount(RegisteredAccount),
}

#[derive(Debug)]
pub struct Task {
    pub priority: TaskPriority,
    pub payload: TaskPayload,
}

impl Task {
    pub fn new(priority: TaskPriority, payload: TaskPayload) -> Self {
        Self { priority, payload }
    }

    pub fn slash_command(request: SlashCommandRequest) -> Self {
        Self::new(TaskPriority::High, TaskPayload::SlashCommand(request))
    }

    pub fn interaction(interaction: ComponentInteraction) -> Self {
        Self::new(TaskPriority::High, TaskPayload::Interaction(interaction))
    }

    pub fn tracker_update(priority: TaskPriority) -> Self {
        Self::new(priority, TaskPayload::TrackerUpdate)
    }

    pub fn check_account(account: RegisteredAccount) -> Self {
        Self::new(TaskPriority::Low, TaskPayload::CheckAccount(account))
    }
}

impl Job for Task {
    type Context = TaskContext;
    type Error = AppError;

    fn priority(&self) -> TaskPriority {
        self.priority
    }

    fn kind(&self) -> &'static str {
        match self.payload {
            TaskPayload::SlashCommand(_) => "slash_command",
            TaskPayload::Interaction(_) => "interaction",
            TaskPayload::TrackerUpdate => "tracker_update",
            TaskPayload::CheckAccount(_) => "check_account",
        }
    }

    fn describe(&self) -> String {
        match &self.payload {
            TaskPayload::SlashCommand(request) => {
                format!("/{} by {}", request.command.name(), request.requester)
            }
            TaskPayload::Interaction(interaction) => {
                format!("{} by {}", interaction.custom_id, interaction.requester)
            }
            TaskPayload::TrackerUpdate => "all accounts".to_string(),
            TaskPayload::CheckAccount(account) => {
                format!("{} ({})", account.riot_id(), account.owner_id)
            }
        }
    }

    fn process(self, ctx: &TaskContext) -> Result<(), AppError> {
        match self.payload {
            TaskPayload::SlashCommand(request) => commands::run_slash_command(ctx, request),
            TaskPayload::Interaction(interaction) => commands::run_interaction(ctx, interaction),
            TaskPayload::TrackerUpdate => poller::dispatch_account_checks(ctx).map(|_| ()),
            TaskPayload::CheckAccount(account) => {
                poller::run_queued_check(ctx, &account).map(|_| ())
            }
        }
    }
}
