//! Background job layer of the League of Gains bot: polls Riot match
//! history for linked accounts and turns deaths into queued exercises.

pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod notifier;
pub mod poller;
pub mod riot;
pub mod tasks;
