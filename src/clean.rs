//! Transaction exports: a fixed 16-column positional layout, one row per
//! sale.

use tracing::{debug, warn};

use crate::dates;
use crate::error::{Result, ViewerError};
use crate::models::{AgentId, DatedMetric, LongTable, RawTable};
use crate::reshape::parse_number;

pub const TRANSACTION_COLUMNS: [&str; 16] = [
    "Index",
    "Model_ID",
    "Date_Time",
    "Amount",
    "Fee",
    "Net",
    "Description",
    "Unknown1",
    "Time",
    "Type",
    "Date",
    "Interval",
    "Welcome_Message",
    "Unknown2",
    "EMP_ID",
    "EMP_ID_2",
];

pub const AMOUNT_METRIC: &str = "Amount";

const AMOUNT_COL: usize = 3;
const DATE_COL: usize = 10;
const EMP_ID_COL: usize = 14;
const EMP_ID_2_COL: usize = 15;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanStats {
    pub kept: usize,
    pub dropped: usize,
    pub agent_id_mismatches: usize,
}

/// Renames the positional columns, keeps agent/date/amount and drops any
/// row where one of them is missing or unparsable. `EMP_ID` is the agent
/// key; `EMP_ID_2` is only compared against it.
pub fn clean(table: &RawTable) -> Result<(LongTable, CleanStats)> {
    if table.headers.len() != TRANSACTION_COLUMNS.len() {
        return Err(ViewerError::ColumnLayout {
            expected: TRANSACTION_COLUMNS.len(),
            found: table.headers.len(),
        });
    }

    let mut long = LongTable::new(vec![AMOUNT_METRIC.to_string()]);
    let mut stats = CleanStats::default();

    for row in &table.rows {
        let field = |index: usize| row.get(index).map(|c| c.trim()).unwrap_or_default();

        let agent = field(EMP_ID_COL);
        let amount = parse_number(field(AMOUNT_COL));
        let date = dates::parse_date(field(DATE_COL));

        let (false, Some(amount), Some(date)) = (agent.is_empty(), amount, date) else {
            stats.dropped += 1;
            continue;
        };

        let secondary = field(EMP_ID_2_COL);
        if !secondary.is_empty() && secondary != agent {
            stats.agent_id_mismatches += 1;
        }

        long.rows.push(DatedMetric {
            agent_id: AgentId::new(agent),
            name: None,
            date: Some(date),
            values: vec![Some(amount)],
        });
        stats.kept += 1;
    }

    if stats.agent_id_mismatches > 0 {
        warn!(
            rows = stats.agent_id_mismatches,
            "EMP_ID_2 disagrees with EMP_ID; using EMP_ID"
        );
    }
    debug!(kept = stats.kept, dropped = stats.dropped, "cleaned transactions");
    Ok((long, stats))
}
