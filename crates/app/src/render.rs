use std::fmt::Write as _;

use services::{Dashboard, GoalProgressView};

const BAR_WIDTH: usize = 10;
const CHART_WIDTH: u64 = 40;

pub const EMPTY_DASHBOARD: &str = "No active goals. Set a new goal to start tracking!";

/// `[#####-----]`, one tick per 10%.
pub fn progress_bar(percent: f64) -> String {
    let clamped = percent.clamp(0.0, 100.0);
    // Truncation is intended: a tick only shows once its 10% is fully done.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let filled = ((clamped / 100.0) * BAR_WIDTH as f64) as usize;
    format!(
        "[{}{}]",
        "#".repeat(filled),
        "-".repeat(BAR_WIDTH - filled)
    )
}

fn goal_block(out: &mut String, view: &GoalProgressView) {
    let _ = writeln!(out, "{}", view.exercise());
    let _ = writeln!(
        out,
        "  {} {}",
        progress_bar(view.percent),
        view.progress_label()
    );
    let _ = writeln!(
        out,
        "  {} -> {} ({} days left)",
        view.start_date, view.end_date, view.days_remaining
    );
}

pub fn render_dashboard(dashboard: &Dashboard) -> String {
    let mut out = String::new();
    for warning in &dashboard.warnings {
        let _ = writeln!(out, "warning: {warning}");
    }
    if dashboard.is_empty() {
        let _ = writeln!(out, "{EMPTY_DASHBOARD}");
        return out;
    }

    for view in &dashboard.goals {
        goal_block(&mut out, view);
    }
    for view in dashboard.reached() {
        let _ = writeln!(
            out,
            "Congratulations! You've reached your {} goal. Run `complete {}` to close it.",
            view.exercise(),
            view.exercise()
        );
    }
    out
}

fn scaled(value: u64, max: u64) -> usize {
    if max == 0 {
        return 0;
    }
    usize::try_from(value.saturating_mul(CHART_WIDTH) / max).unwrap_or(usize::MAX)
}

/// Daily bars followed by the cumulative series against the target.
pub fn render_chart(view: &GoalProgressView) -> String {
    let mut out = String::new();
    goal_block(&mut out, view);

    if view.daily.is_empty() {
        let _ = writeln!(out, "No progress logged yet.");
        return out;
    }

    let _ = writeln!(out, "Daily progress:");
    let daily_max = view.daily.iter().map(|p| p.value).max().unwrap_or(0);
    for point in &view.daily {
        let _ = writeln!(
            out,
            "  {} {:>6} {}",
            point.date,
            point.value,
            "#".repeat(scaled(point.value, daily_max))
        );
    }

    let target = u64::from(view.goal.target());
    let top = view
        .cumulative
        .last()
        .map_or(target, |p| p.value.max(target));
    let target_col = scaled(target, top);
    let _ = writeln!(out, "Cumulative progress (target {target}):");
    for point in &view.cumulative {
        let mut bar: Vec<char> = "#".repeat(scaled(point.value, top)).chars().collect();
        if bar.len() <= target_col {
            bar.resize(target_col, ' ');
            bar.push('|');
        }
        let bar: String = bar.into_iter().collect();
        let _ = writeln!(out, "  {} {:>6} {}", point.date, point.value, bar.trim_end());
    }
    out
}
