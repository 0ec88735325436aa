use tracing::{info, instrument};

use crate::error::AppError;
use crate::riot::Platform;
use crate::tasks::TaskContext;

use super::Reply;

/// Link a Riot account to the requester. A user may link several accounts.
#[instrument(skip(ctx), fields(riot_id = %format!("{game_name}#{tag_line}")))]
pub(super) fn link(
    ctx: &TaskContext,
    requester: u64,
    game_name: &str,
    tag_line: &str,
    region: &str,
) -> Result<Reply, AppError> {
    let platform: Platform = region.parse()?;

    let Some(identity) = ctx
        .api
        .get_account_identity(game_name, tag_line, platform.as_str())
    else {
        return Ok(Reply::text(
            "❌ Summoner not found. Check spelling and region code.",
        ));
    };

    ctx.store
        .add_account(requester, &identity, platform.as_str())?;
    info!(puuid = identity.puuid, %platform, "🔗 Account linked");

    Ok(Reply::text(format!(
        "✅ Linked **{}** to your Discord ID.",
        identity.riot_id()
    )))
}
