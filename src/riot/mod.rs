use tracing::warn;

pub mod client;
mod endpoints;
pub mod error;
pub mod rate_limiter;
pub mod region;
pub mod types;

pub use client::{ClientOptions, RetryPolicy, RiotClient};
pub use error::{RiotApiError, RiotApiResponse, RiotMatchError};
pub use rate_limiter::RateLimiter;
pub use region::{Platform, Region};
pub use types::{AccountIdentity, MatchStats};

/// Game data source used by commands and the match poller.
///
/// Lookups that have a natural empty answer swallow transport failures
/// after logging them. Match analysis keeps the error so the caller can
/// leave the match unprocessed.
pub trait GameApi: Send + Sync {
    /// Resolve a Riot ID. `None` when the account is unknown or the call failed.
    fn get_account_identity(
        &self,
        game_name: &str,
        tag_line: &str,
        region: &str,
    ) -> Option<AccountIdentity>;

    /// Most recent match ids, newest first. Empty on failure.
    fn get_recent_match_ids(&self, puuid: &str, region: &str, count: u32) -> Vec<String>;

    fn analyze_match(
        &self,
        match_id: &str,
        puuid: &str,
        region: &str,
    ) -> Result<MatchStats, RiotMatchError>;
}

impl GameApi for RiotClient {
    fn get_account_identity(
        &self,
        game_name: &str,
        tag_line: &str,
        region: &str,
    ) -> Option<AccountIdentity> {
        match self.get_account_by_riot_id(region, game_name, tag_line) {
            Ok(dto) if !dto.puuid.is_empty() => Some(AccountIdentity {
                puuid: dto.puuid,
                game_name: dto.game_name.unwrap_or_else(|| game_name.to_string()),
                tag_line: dto.tag_line.unwrap_or_else(|| tag_line.to_string()),
            }),
            Ok(_) => {
                warn!(game_name, tag_line, "🛰️ Account lookup returned an empty puuid");
                None
            }
            Err(e) => {
                warn!(game_name, tag_line, region, "🛰️ Account lookup failed: {e}");
                None
            }
        }
    }

    fn get_recent_match_ids(&self, puuid: &str, region: &str, count: u32) -> Vec<String> {
        self.get_match_ids(region, puuid, count)
            .unwrap_or_else(|e| {
                warn!(puuid, region, "🛰️ Fetching recent match ids failed: {e}");
                Vec::new()
            })
    }

    fn analyze_match(
        &self,
        match_id: &str,
        puuid: &str,
        region: &str,
    ) -> Result<MatchStats, RiotMatchError> {
        self.get_match_stats(region, match_id, puuid)
    }
}
