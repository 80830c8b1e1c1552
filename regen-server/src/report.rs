//! Plain-text rendering of fund listings for the command-line tools.

use regen_core::utils::fund_diff::FundChange;
use regen_sdk::objects::FundRecord;
use std::fmt::Write;

/// Longest description shown in the dashboard.
pub const DESCRIPTION_PREVIEW_CHARS: usize = 60;

/// Shorten `text` to `max` characters, appending `...` if anything was cut.
pub fn preview(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// Full details of one fund, as printed by `get-funds` and `watch-funds`.
pub fn render_fund(index: usize, fund: &FundRecord) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Fund #{}: {}", index + 1, fund.name);
    let _ = writeln!(out, "- Address: {}", fund.address);
    let _ = writeln!(out, "- Description: {}", fund.description);
    let _ = writeln!(out, "- Goal: ${}", fund.goal.normalize());
    let _ = writeln!(out, "- Current Balance: ${}", fund.current_balance.normalize());
    let _ = writeln!(out, "- Progress: {}%", fund.progress);
    let _ = writeln!(out, "- Owner: {}", fund.owner);
    out
}

/// One dashboard entry with its change marker, as printed by `monitor-funds`.
pub fn render_dashboard_entry(index: usize, fund: &FundRecord, change: &FundChange) -> String {
    let marker = match change {
        FundChange::New => "[NEW] ",
        FundChange::BalanceChanged { .. } => "[DONATION] ",
        FundChange::Unchanged => "",
    };

    let mut out = String::new();
    let _ = writeln!(out, "{marker}Fund #{}: {}", index + 1, fund.name);
    let _ = writeln!(out, "- Address: {}", fund.address);
    let _ = writeln!(
        out,
        "- Description: {}",
        preview(&fund.description, DESCRIPTION_PREVIEW_CHARS)
    );
    let _ = writeln!(out, "- Goal: ${}", fund.goal.normalize());
    match change {
        FundChange::BalanceChanged { difference, .. } => {
            let sign = if difference.is_sign_negative() { "-" } else { "+" };
            let _ = writeln!(
                out,
                "- Current Balance: ${} ({sign}${})",
                fund.current_balance.normalize(),
                difference.abs().normalize()
            );
        }
        _ => {
            let _ = writeln!(out, "- Current Balance: ${}", fund.current_balance.normalize());
        }
    }
    let _ = writeln!(out, "- Progress: {}%", fund.progress);
    let _ = writeln!(out, "- Owner: {}", fund.owner);
    out
}
