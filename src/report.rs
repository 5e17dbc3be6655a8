use std::collections::BTreeMap;
use std::fmt::Write;

use chrono::NaiveDate;
use serde::Serialize;

use crate::aggregate::Selection;
use crate::models::{AgentId, DailyTable};

#[derive(Debug, Serialize)]
struct DailyReport<'a> {
    agent: &'a AgentId,
    start: NaiveDate,
    end: NaiveDate,
    metrics: &'a [String],
    days: Vec<DayEntry<'a>>,
}

#[derive(Debug, Serialize)]
struct DayEntry<'a> {
    date: NaiveDate,
    values: BTreeMap<&'a str, f64>,
}

pub fn build_table(title: &str, selection: &Selection, daily: &DailyTable) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# {title}");
    let _ = writeln!(
        output,
        "Agent {} from {} to {}",
        selection.agent, selection.start, selection.end
    );
    let _ = writeln!(output);

    if daily.is_empty() {
        let _ = writeln!(output, "No data for this selection.");
        return output;
    }

    let _ = writeln!(output, "| Date | {} |", daily.metrics.join(" | "));
    let _ = writeln!(
        output,
        "| --- |{}",
        " ---: |".repeat(daily.metrics.len())
    );
    for (date, values) in &daily.days {
        let cells: Vec<String> = values.iter().map(|value| format!("{value:.2}")).collect();
        let _ = writeln!(output, "| {} | {} |", date, cells.join(" | "));
    }

    let totals: Vec<String> = (0..daily.metrics.len())
        .map(|index| {
            let total: f64 = daily.days.values().map(|values| values[index]).sum();
            format!("{total:.2}")
        })
        .collect();
    let _ = writeln!(output, "| **Total** | {} |", totals.join(" | "));

    output
}

pub fn build_json(selection: &Selection, daily: &DailyTable) -> serde_json::Result<String> {
    let report = DailyReport {
        agent: &selection.agent,
        start: selection.start,
        end: selection.end,
        metrics: &daily.metrics,
        days: daily
            .days
            .iter()
            .map(|(date, values)| DayEntry {
                date: *date,
                values: daily
                    .metrics
                    .iter()
                    .map(String::as_str)
                    .zip(values.iter().copied())
                    .collect(),
            })
            .collect(),
    };
    serde_json::to_string_pretty(&report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample() -> (Selection, DailyTable) {
        let selection = Selection {
            agent: AgentId::new("E1"),
            start: ymd(2024, 1, 1),
            end: ymd(2024, 1, 2),
        };
        let daily = DailyTable {
            metrics: vec!["CGR".to_string(), "CRPH Goal".to_string()],
            days: BTreeMap::from([
                (ymd(2024, 1, 1), vec![3.0, 2.0]),
                (ymd(2024, 1, 2), vec![5.0, 2.0]),
            ]),
        };
        (selection, daily)
    }

    #[test]
    fn table_lists_every_day_and_totals() {
        let (selection, daily) = sample();
        let table = build_table("Daily CGR Sales Data vs. Goal", &selection, &daily);
        assert!(table.contains("| Date | CGR | CRPH Goal |"));
        assert!(table.contains("| 2024-01-01 | 3.00 | 2.00 |"));
        assert!(table.contains("| 2024-01-02 | 5.00 | 2.00 |"));
        assert!(table.contains("| **Total** | 8.00 | 4.00 |"));
    }

    #[test]
    fn empty_selection_says_so() {
        let (selection, mut daily) = sample();
        daily.days.clear();
        let table = build_table("Daily Sales", &selection, &daily);
        assert!(table.contains("No data for this selection."));
        assert!(!table.contains("| Date |"));
    }

    #[test]
    fn json_keys_values_by_metric() {
        let (selection, daily) = sample();
        let json: serde_json::Value =
            serde_json::from_str(&build_json(&selection, &daily).unwrap()).unwrap();
        assert_eq!(json["agent"], "E1");
        assert_eq!(json["start"], "2024-01-01");
        assert_eq!(json["days"][1]["values"]["CGR"], 5.0);
        assert_eq!(json["days"].as_array().unwrap().len(), 2);
    }
}
