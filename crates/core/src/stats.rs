use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::Progress;

/// Percent of `target` reached by `current`, clamped to `[0, 100]`.
///
/// A zero target yields `0.0`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn calculate_progress(current: u64, target: u64) -> f64 {
    if target == 0 {
        return 0.0;
    }
    let pct = (current as f64 / target as f64) * 100.0;
    pct.min(100.0)
}

/// Sum of all logged quantities.
#[must_use]
pub fn total_quantity(entries: &[Progress]) -> u64 {
    entries.iter().map(|p| u64::from(p.quantity())).sum()
}

/// One bar or line point in a progress chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub date: NaiveDate,
    pub value: u64,
}

/// `(date, quantity)` points in insertion order, one per log entry.
#[must_use]
pub fn daily_series(entries: &[Progress]) -> Vec<ChartPoint> {
    entries
        .iter()
        .map(|p| ChartPoint {
            date: p.date(),
            value: u64::from(p.quantity()),
        })
        .collect()
}

/// Running total of quantities in insertion order.
#[must_use]
pub fn cumulative_series(entries: &[Progress]) -> Vec<ChartPoint> {
    let mut running = 0_u64;
    entries
        .iter()
        .map(|p| {
            running = running.saturating_add(u64::from(p.quantity()));
            ChartPoint {
                date: p.date(),
                value: running,
            }
        })
        .collect()
}
