//! Wide shift-goal sheets: one row per agent, followed by repeated
//! `"<date> CGR"` / `"<date> CRPH Goal"` column pairs.

use std::collections::BTreeSet;

use tracing::debug;

use crate::dates;
use crate::error::{Result, ViewerError};
use crate::models::{AgentId, DatedMetric, LongTable, RawTable};

pub const AGENT_INFO_COLUMNS: [&str; 4] = ["EMP_ID", "NAME", "STATUS", "CGR/CRPH GOAL"];
pub const SALES_SUFFIX: &str = " CGR";
pub const GOAL_SUFFIX: &str = " CRPH Goal";
pub const SALES_METRIC: &str = "CGR";
pub const GOAL_METRIC: &str = "CRPH Goal";

/// Date labels are the first whitespace token of every header after the
/// agent-info columns, de-duplicated.
pub fn date_labels(table: &RawTable) -> Vec<String> {
    table
        .headers
        .iter()
        .skip(AGENT_INFO_COLUMNS.len())
        .filter_map(|header| header.split_whitespace().next())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

pub fn reshape(table: &RawTable) -> Result<LongTable> {
    let info_cols = AGENT_INFO_COLUMNS
        .iter()
        .map(|name| require_column(table, name))
        .collect::<Result<Vec<_>>>()?;
    let (emp_col, name_col) = (info_cols[0], info_cols[1]);

    let blocks: Vec<(String, Option<usize>, Option<usize>)> = date_labels(table)
        .into_iter()
        .map(|label| {
            let sales = table.column_index(&format!("{label}{SALES_SUFFIX}"));
            let goal = table.column_index(&format!("{label}{GOAL_SUFFIX}"));
            (label, sales, goal)
        })
        .collect();

    let mut long = LongTable::new(vec![SALES_METRIC.to_string(), GOAL_METRIC.to_string()]);
    for row in &table.rows {
        let agent_id = AgentId::new(cell(row, emp_col).trim());
        let name = Some(cell(row, name_col).trim().to_string()).filter(|name| !name.is_empty());

        for (label, sales, goal) in &blocks {
            // A date without both columns is skipped, not an error.
            let (Some(sales), Some(goal)) = (sales, goal) else {
                continue;
            };
            long.rows.push(DatedMetric {
                agent_id: agent_id.clone(),
                name: name.clone(),
                date: dates::parse_date(label),
                values: vec![parse_number(cell(row, *sales)), parse_number(cell(row, *goal))],
            });
        }
    }

    debug!(
        agents = table.rows.len(),
        date_blocks = blocks.len(),
        long_rows = long.rows.len(),
        "reshaped wide table"
    );
    Ok(long)
}

fn require_column(table: &RawTable, name: &str) -> Result<usize> {
    table
        .column_index(name)
        .ok_or_else(|| ViewerError::MissingColumn(name.to_string()))
}

fn cell(row: &[String], index: usize) -> &str {
    row.get(index).map(String::as_str).unwrap_or_default()
}

pub fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|value| value.is_finite())
}
