//! Plain-text rendering of reports

use std::fmt::Write;

use reaction_service::{AggregateReport, ChannelResult, ChannelStatusEntry, StatusReport};

/// Emoji listed per channel in the run summary
const TOP_PER_CHANNEL: usize = 5;

pub fn render_aggregate(report: &AggregateReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "run {} ({} days): {:?}",
        report.run_id, report.window_days, report.outcome
    );
    if let Some(reason) = &report.abort_reason {
        let _ = writeln!(out, "  aborted: {reason}");
    }

    for channel in &report.channels {
        let status = match &channel.result {
            ChannelResult::Completed => "completed".to_string(),
            ChannelResult::AlreadyCompleted => "already completed".to_string(),
            ChannelResult::HeldByOther { owner } => {
                format!("held by {}", owner.as_deref().unwrap_or("another run"))
            }
            ChannelResult::Failed { reason } => format!("failed: {reason}"),
            ChannelResult::Interrupted => "interrupted".to_string(),
        };
        let _ = writeln!(
            out,
            "  {:<14} {:<24} pages={} threads={} messages={} reactions={}",
            channel.channel_id,
            status,
            channel.pages,
            channel.threads,
            channel.messages,
            channel.reactions.total()
        );
        for (emoji, count) in channel.reactions.ranked().into_iter().take(TOP_PER_CHANNEL) {
            let _ = writeln!(out, "      :{emoji}: {count}");
        }
    }

    let _ = writeln!(out, "total reactions this run: {}", report.total_reactions());
    out
}

fn status_line(out: &mut String, entry: &ChannelStatusEntry) {
    let _ = write!(
        out,
        "  {:<14} {:<20} {:<11} reactions={} messages={}",
        entry.channel_id, entry.name, entry.status, entry.reaction_count, entry.message_count
    );
    if let Some(cursor) = &entry.cursor {
        let _ = write!(out, " cursor={cursor}");
    }
    if let Some(reason) = &entry.failure_reason {
        let _ = write!(out, " reason={reason:?}");
    }
    out.push('\n');
}

pub fn render_status(report: &StatusReport) -> String {
    let mut out = String::new();
    if report.is_empty() {
        out.push_str("no channels tracked yet\n");
        return out;
    }

    let _ = writeln!(out, "completed ({}):", report.completed.len());
    for entry in &report.completed {
        status_line(&mut out, entry);
    }

    let _ = writeln!(out, "pending / in progress / failed ({}):", report.in_progress.len());
    for entry in &report.in_progress {
        status_line(&mut out, entry);
    }

    if !report.top_emojis.is_empty() {
        out.push_str("top emoji:\n");
        for (rank, emoji) in report.top_emojis.iter().enumerate() {
            let marker = if emoji.custom == Some(true) { " (custom)" } else { "" };
            let _ = writeln!(out, "  {:>2}. :{}: {}{marker}", rank + 1, emoji.emoji, emoji.count);
        }
    }
    out
}
