use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

/// A table exactly as read from the uploaded file: one header row and
/// string cells. Short rows are padded with empty cells on load.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct AgentId(pub String);

impl AgentId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One long-form row: an agent, a (possibly unparsed) date and a value
/// per metric column of the owning [`LongTable`].
#[derive(Debug, Clone, PartialEq)]
pub struct DatedMetric {
    pub agent_id: AgentId,
    pub name: Option<String>,
    pub date: Option<NaiveDate>,
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LongTable {
    pub metrics: Vec<String>,
    pub rows: Vec<DatedMetric>,
}

impl LongTable {
    pub fn new(metrics: Vec<String>) -> Self {
        Self {
            metrics,
            rows: Vec::new(),
        }
    }

    pub fn agent_name(&self, agent: &AgentId) -> Option<&str> {
        self.rows
            .iter()
            .filter(|row| &row.agent_id == agent)
            .find_map(|row| row.name.as_deref())
    }

    /// Distinct agent ids, sorted.
    pub fn agents(&self) -> Vec<AgentId> {
        self.rows
            .iter()
            .map(|row| row.agent_id.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Earliest and latest non-null date in the table.
    pub fn date_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        let mut dates = self.rows.iter().filter_map(|row| row.date);
        let first = dates.next()?;
        Some(dates.fold((first, first), |(min, max), date| {
            (min.min(date), max.max(date))
        }))
    }
}

/// Per-day sums for every metric of a [`LongTable`], covering each date of
/// the requested range exactly once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DailyTable {
    pub metrics: Vec<String>,
    pub days: BTreeMap<NaiveDate, Vec<f64>>,
}

impl DailyTable {
    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn series(&self, metric: &str) -> Option<DailySeries> {
        let index = self.metrics.iter().position(|m| m == metric)?;
        Some(DailySeries {
            points: self
                .days
                .iter()
                .map(|(date, values)| (*date, values[index]))
                .collect(),
        })
    }

    /// Adds a constant column, used for a scalar goal broadcast over every date.
    pub fn with_constant(mut self, metric: impl Into<String>, value: f64) -> Self {
        self.metrics.push(metric.into());
        for values in self.days.values_mut() {
            values.push(value);
        }
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DailySeries {
    pub points: Vec<(NaiveDate, f64)>,
}

impl DailySeries {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|(date, _)| *date).collect()
    }

    pub fn max_value(&self) -> f64 {
        self.points
            .iter()
            .map(|(_, value)| *value)
            .fold(0.0, f64::max)
    }

    pub fn min_value(&self) -> f64 {
        self.points
            .iter()
            .map(|(_, value)| *value)
            .fold(0.0, f64::min)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(agent: &str, date: Option<NaiveDate>) -> DatedMetric {
        DatedMetric {
            agent_id: AgentId::new(agent),
            name: None,
            date,
            values: vec![Some(1.0)],
        }
    }

    #[test]
    fn agents_are_distinct_and_sorted() {
        let mut table = LongTable::new(vec!["CGR".to_string()]);
        table.rows = vec![row("E2", None), row("E1", None), row("E2", None)];
        assert_eq!(table.agents(), vec![AgentId::new("E1"), AgentId::new("E2")]);
        assert_eq!(table.agent_name(&AgentId::new("E1")), None);
    }

    #[test]
    fn date_bounds_skip_null_dates() {
        let jan1 = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let jan9 = NaiveDate::from_ymd_opt(2024, 1, 9).unwrap();
        let mut table = LongTable::new(vec!["CGR".to_string()]);
        table.rows = vec![row("E1", Some(jan9)), row("E1", None), row("E1", Some(jan1))];
        assert_eq!(table.date_bounds(), Some((jan1, jan9)));

        table.rows = vec![row("E1", None)];
        assert_eq!(table.date_bounds(), None);
    }

    #[test]
    fn constant_column_is_broadcast() {
        let jan1 = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let jan2 = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let table = DailyTable {
            metrics: vec!["Amount".to_string()],
            days: BTreeMap::from([(jan1, vec![4.0]), (jan2, vec![0.0])]),
        }
        .with_constant("Goal", 7.5);

        let goal = table.series("Goal").unwrap();
        assert_eq!(goal.points, vec![(jan1, 7.5), (jan2, 7.5)]);
        assert!(table.series("Fee").is_none());
    }
}
