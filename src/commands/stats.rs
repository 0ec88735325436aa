use std::fmt::Write;

use crate::db::LeaderboardKind;
use crate::error::AppError;
use crate::tasks::TaskContext;

use super::Reply;

const RECENT_GAMES: u32 = 10;

pub(super) fn stats(ctx: &TaskContext, requester: u64) -> Result<Reply, AppError> {
    let stats = ctx.store.user_stats(requester)?;
    let recent = ctx.store.recent_match_records(requester, RECENT_GAMES)?;

    let mut content = String::from("📊 **Your Stats**\n");
    let _ = writeln!(content, "💀 Total Deaths: **{}**", stats.total_deaths);
    let _ = writeln!(content, "🎮 Games Tracked: **{}**", stats.total_games);
    let _ = writeln!(content, "📉 Lowest KDA: **{:.2}**", stats.lowest_kda);
    let _ = writeln!(
        content,
        "🔥 Max Deaths (1 Game): **{}**",
        stats.most_deaths_single
    );
    let _ = writeln!(
        content,
        "⏱️ Deaths per Minute: **{:.2}**",
        stats.avg_deaths_per_min
    );
    let _ = writeln!(content, "🏋️ Pending Tasks: **{}**", stats.pending_count);

    content.push_str("\n⚰️ **Top Death Champs**\n");
    push_totals(&mut content, &stats.top_death_champs, |name, total| {
        format!("{name} ({total})")
    });

    content.push_str("\n💪 **Reps Completed**\n");
    push_totals(&mut content, &stats.exercise_counts, |name, total| {
        format!("{name}: {total}")
    });

    if !recent.is_empty() {
        let deaths = recent
            .iter()
            .rev()
            .map(|game| game.deaths.to_string())
            .collect::<Vec<_>>()
            .join(" → ");
        let _ = write!(content, "\n📈 Recent Deaths: {deaths}");
    }

    Ok(Reply::text(content))
}

fn push_totals(out: &mut String, totals: &[(String, u32)], line: impl Fn(&str, u32) -> String) {
    if totals.is_empty() {
        out.push_str("None\n");
        return;
    }
    for (name, total) in totals {
        out.push_str(&line(name, *total));
        out.push('\n');
    }
}

pub(super) fn leaderboard(ctx: &TaskContext, kind: LeaderboardKind) -> Result<Reply, AppError> {
    let entries = ctx.store.leaderboard(kind)?;

    let mut content = format!("🏆 **Leaderboard: {}**\n", kind.title());
    if entries.is_empty() {
        content.push_str("No data recorded yet.");
        return Ok(Reply::text(content));
    }

    for (index, entry) in entries.iter().enumerate() {
        let rank = match index {
            0 => "🥇".to_string(),
            1 => "🥈".to_string(),
            2 => "🥉".to_string(),
            _ => format!("#{}", index + 1),
        };
        let score = match kind {
            LeaderboardKind::Kda => format!("{:.2}", entry.score),
            LeaderboardKind::Reps | LeaderboardKind::Deaths => format!("{:.0}", entry.score),
        };
        let _ = writeln!(content, "**{rank}** {} · **{score}**", entry.name);
    }

    Ok(Reply::text(content))
}
