use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::models::{AgentId, DailyTable, LongTable};

/// The per-request selection: which agent, and which inclusive date range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub agent: AgentId,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Sums every metric per calendar day for the selected agent and fills
/// each day of `[start, end]` that has no rows with zeros.
///
/// Returns an empty table when `start > end` or when the agent has no
/// rows at all. Rows with a null date never match a range.
pub fn daily_totals(table: &LongTable, selection: &Selection) -> DailyTable {
    let mut daily = DailyTable {
        metrics: table.metrics.clone(),
        days: BTreeMap::new(),
    };

    if selection.start > selection.end {
        debug!(start = %selection.start, end = %selection.end, "empty date range");
        return daily;
    }

    let mut agent_rows = table
        .rows
        .iter()
        .filter(|row| row.agent_id == selection.agent)
        .peekable();
    if agent_rows.peek().is_none() {
        warn!(agent = %selection.agent, "no rows for agent");
        return daily;
    }

    for date in selection.start.iter_days().take_while(|d| *d <= selection.end) {
        daily.days.insert(date, vec![0.0; table.metrics.len()]);
    }

    for row in agent_rows {
        let Some(date) = row.date else {
            continue;
        };
        let Some(totals) = daily.days.get_mut(&date) else {
            continue;
        };
        for (total, value) in totals.iter_mut().zip(&row.values) {
            *total += value.unwrap_or(0.0);
        }
    }

    debug!(agent = %selection.agent, days = daily.len(), "aggregated daily totals");
    daily
}
