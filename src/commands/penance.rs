use std::fmt::Write;

use tracing::info;

use crate::db::{MatchRecord, PunishmentItem};
use crate::error::AppError;
use crate::poller::compute_reps;
use crate::tasks::TaskContext;

use super::Reply;

pub const PAGE_SIZE: usize = 5;

const PREV_PREFIX: &str = "penance_prev_";
const NEXT_PREFIX: &str = "penance_next_";

/// Page requested by a penance navigation button, before clamping.
pub fn requested_page(custom_id: &str) -> Option<i64> {
    if let Some(page) = custom_id.strip_prefix(PREV_PREFIX) {
        page.parse::<i64>().ok().map(|p| p.saturating_sub(1))
    } else if let Some(page) = custom_id.strip_prefix(NEXT_PREFIX) {
        page.parse::<i64>().ok().map(|p| p.saturating_add(1))
    } else {
        None
    }
}

/// Clamp a page index and return it with the page count (at least one).
fn clamp_page(item_count: usize, page: i64) -> (usize, usize) {
    let total_pages = item_count.div_ceil(PAGE_SIZE).max(1);
    let page = page.clamp(0, total_pages as i64 - 1) as usize;
    (page, total_pages)
}

pub(super) fn render_page(ctx: &TaskContext, requester: u64, page: i64) -> Result<Reply, AppError> {
    let pending = ctx.store.pending_punishments(requester)?;

    if pending.is_empty() {
        return Ok(Reply::text(
            "🏋️ **Penance List**\n🎉 You are free! No pending exercises.",
        ));
    }

    let (page, total_pages) = clamp_page(pending.len(), page);
    let mut content = format!(
        "🏋️ **Penance List**\nTotal Pending: **{}**\nPage {}/{}\n",
        pending.len(),
        page + 1,
        total_pages
    );

    for item in pending.iter().skip(page * PAGE_SIZE).take(PAGE_SIZE) {
        let record = ctx.store.match_record(requester, &item.match_id)?;
        content.push('\n');
        write_item(&mut content, item, record.as_ref());
    }

    Ok(Reply::text(content)
        .with_button(format!("{PREV_PREFIX}{page}"), "Previous", page == 0)
        .with_button(
            format!("{NEXT_PREFIX}{page}"),
            "Next",
            page + 1 >= total_pages,
        ))
}

fn write_item(out: &mut String, item: &PunishmentItem, record: Option<&MatchRecord>) {
    let _ = writeln!(
        out,
        "**{} {}** (Deaths: {})",
        item.reps, item.exercise_name, item.original_deaths
    );

    if let Some(game) = record {
        let _ = writeln!(
            out,
            "**{}** • 💀 {}/{}/{} • 📊 KP {:.0}% • CS {} ({:.1}/m)",
            game.champion_name,
            game.kills,
            game.deaths,
            game.assists,
            game.kp_percent,
            game.cs,
            game.cs_per_min
        );
        let _ = writeln!(
            out,
            "⏱️ {}:{:02} • <t:{}:R>",
            game.game_duration / 60,
            game.game_duration % 60,
            game.game_creation / 1000
        );
    }

    let _ = writeln!(out, "🆔 `{}`", item.match_id);
}

pub(super) fn complete(ctx: &TaskContext, requester: u64, match_id: &str) -> Result<Reply, AppError> {
    match ctx.store.complete_punishment(requester, match_id)? {
        Some(item) => {
            info!(requester, match_id, reps = item.reps, "🏋️ Punishment completed");
            Ok(Reply::text(format!(
                "✅ Completed **{} {}** for Game {}",
                item.reps, item.exercise_name, match_id
            )))
        }
        None => Ok(not_found(match_id)),
    }
}

/// Replace the exercise of a pending punishment, keeping its original deaths.
pub(super) fn reroll(ctx: &TaskContext, requester: u64, match_id: &str) -> Result<Reply, AppError> {
    let Some(item) = ctx.store.punishment_for_match(requester, match_id)? else {
        return Ok(not_found(match_id));
    };

    let Some(exercise) = ctx.store.pick_random_exercise()? else {
        return Ok(Reply::text("❌ No exercises are defined yet."));
    };

    let multiplier = ctx
        .store
        .category_multiplier(requester, exercise.category)?;
    let reps = compute_reps(item.original_deaths, exercise.set_count, multiplier);
    ctx.store.update_punishment(item.id, &exercise.name, reps)?;
    info!(requester, match_id, exercise = exercise.name, reps, "🎲 Punishment rerolled");

    Ok(Reply::text(format!(
        "🎲 Rerolled! New task: **{} {}**",
        reps, exercise.name
    )))
}

fn not_found(match_id: &str) -> Reply {
    Reply::text(format!(
        "❌ No pending punishment found for Game ID: {match_id}"
    ))
}
