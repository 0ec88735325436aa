use tracing::info;

use crate::db::ExerciseCategory;
use crate::error::AppError;
use crate::tasks::TaskContext;

use super::Reply;

pub(super) fn wimp(
    ctx: &TaskContext,
    requester: u64,
    multiplier: f64,
    category: Option<ExerciseCategory>,
) -> Result<Reply, AppError> {
    if !multiplier.is_finite() || multiplier <= 0.0 {
        return Err(AppError::InvalidMultiplier(multiplier));
    }

    let updated = ctx.store.set_multiplier(requester, multiplier, category)?;
    if updated == 0 {
        return Ok(Reply::text("❌ Link an account with `/link` first."));
    }
    info!(
        requester,
        multiplier,
        category = category.map(|c| c.as_str()),
        "🏋️ Multiplier updated"
    );

    let mode = if multiplier > 1.0 {
        "GigaChad mode"
    } else {
        "Wimp mode"
    };
    let target = match category {
        Some(category) => format!("**{}** exercises", category.as_str()),
        None => "all exercises".to_string(),
    };

    Ok(Reply::text(format!(
        "✅ {mode} set to **{multiplier}x** for {target}."
    )))
}
