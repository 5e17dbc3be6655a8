use std::path::Path;

use anyhow::{bail, Result};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::FontTransform;

use crate::models::DailySeries;

const CHART_HEIGHT: u32 = 600;
const MIN_CHART_WIDTH: u32 = 1200;
const PIXELS_PER_DAY: u32 = 18;
const BAR_COLOR: RGBColor = RGBColor(135, 206, 235);
const GOAL_COLOR: RGBColor = RGBColor(255, 165, 0);

#[derive(Debug, Clone, PartialEq)]
pub enum Goal {
    /// One goal value per date, drawn as a line through each day.
    Series(DailySeries),
    /// A single goal drawn flat across the whole range.
    Constant(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SalesChart {
    pub title: String,
    pub sales_label: String,
    pub goal_label: String,
    pub sales: DailySeries,
    pub goal: Goal,
}

impl SalesChart {
    fn goal_points(&self) -> Vec<f64> {
        match &self.goal {
            Goal::Series(series) => {
                let dates = self.sales.dates();
                dates
                    .iter()
                    .map(|date| {
                        series
                            .points
                            .iter()
                            .find(|(d, _)| d == date)
                            .map(|(_, value)| *value)
                            .unwrap_or(0.0)
                    })
                    .collect()
            }
            Goal::Constant(value) => vec![*value; self.sales.points.len()],
        }
    }

    /// Y-axis range covering every bar and goal point, always including 0.
    fn value_range(&self) -> (f64, f64) {
        let goals = self.goal_points();
        let low = goals.iter().copied().fold(self.sales.min_value(), f64::min);
        let high = goals
            .iter()
            .copied()
            .fold(self.sales.max_value(), f64::max)
            .max(1.0);
        (low * 1.1, high * 1.1)
    }

    /// Wide enough that one rotated label per day never overlaps.
    fn canvas_size(&self) -> (u32, u32) {
        let days = self.sales.points.len() as u32;
        let width = MIN_CHART_WIDTH.max(PIXELS_PER_DAY * days + 200);
        (width, CHART_HEIGHT)
    }
}

pub fn render_svg(chart: &SalesChart, path: &Path) -> Result<()> {
    let root = SVGBackend::new(path, chart.canvas_size()).into_drawing_area();
    draw_sales_chart(root, chart)
}

pub fn render_svg_string(chart: &SalesChart) -> Result<String> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, chart.canvas_size()).into_drawing_area();
        draw_sales_chart(root, chart)?;
    }
    Ok(svg)
}

fn draw_sales_chart<DB>(root: DrawingArea<DB, Shift>, chart: &SalesChart) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    if chart.sales.is_empty() {
        bail!("nothing to plot: the daily series is empty");
    }

    let dates = chart.sales.dates();
    let goals = chart.goal_points();
    let day_count = dates.len() as i32;
    let (y_min, y_max) = chart.value_range();

    root.fill(&WHITE)?;

    let mut plot = ChartBuilder::on(&root)
        .caption(&chart.title, ("sans-serif", 24))
        .margin(20)
        .set_label_area_size(LabelAreaPosition::Left, 70)
        .set_label_area_size(LabelAreaPosition::Bottom, 110)
        .build_cartesian_2d((0..day_count).into_segmented(), y_min..y_max)?;

    plot.configure_mesh()
        .disable_x_mesh()
        // Loose hint: integer key points then keep a one-day step.
        .x_labels(dates.len() * 2 + 2)
        .x_label_formatter(&|value| match value {
            SegmentValue::CenterOf(index) | SegmentValue::Exact(index) => dates
                .get(*index as usize)
                .map(|date| date.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            SegmentValue::Last => String::new(),
        })
        .x_label_style(
            ("sans-serif", 14)
                .into_font()
                .transform(FontTransform::Rotate90),
        )
        .x_desc("Date")
        .y_desc("Sales Amount")
        .draw()?;

    plot.draw_series(chart.sales.points.iter().enumerate().map(|(index, (_, value))| {
        let index = index as i32;
        Rectangle::new(
            [
                (SegmentValue::Exact(index), 0.0),
                (SegmentValue::Exact(index + 1), *value),
            ],
            BAR_COLOR.filled(),
        )
    }))?
    .label(chart.sales_label.as_str())
    .legend(|(x, y)| Rectangle::new([(x, y - 6), (x + 20, y + 6)], BAR_COLOR.filled()));

    plot.draw_series(LineSeries::new(
        goals
            .iter()
            .enumerate()
            .map(|(index, goal)| (SegmentValue::CenterOf(index as i32), *goal)),
        GOAL_COLOR.stroke_width(2),
    ))?
    .label(chart.goal_label.as_str())
    .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], GOAL_COLOR.stroke_width(2)));

    plot.configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .position(SeriesLabelPosition::UpperRight)
        .draw()?;

    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn series(values: &[f64]) -> DailySeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        DailySeries {
            points: values
                .iter()
                .enumerate()
                .map(|(i, v)| (start + chrono::Duration::days(i as i64), *v))
                .collect(),
        }
    }

    fn chart(goal: Goal) -> SalesChart {
        SalesChart {
            title: "Daily CGR Shift Sales vs. Goal for Agent E1".to_string(),
            sales_label: "CGR Shift Sales".to_string(),
            goal_label: "CGR Shift Sales Goal".to_string(),
            sales: series(&[3.0, 5.0, 0.0]),
            goal,
        }
    }

    #[test]
    fn renders_bars_goal_and_day_labels() {
        let svg = render_svg_string(&chart(Goal::Series(series(&[2.0, 2.0, 2.0])))).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("Daily CGR Shift Sales vs. Goal for Agent E1"));
        assert!(svg.contains("CGR Shift Sales Goal"));
        for day in ["2024-01-01", "2024-01-02", "2024-01-03"] {
            assert!(svg.contains(day), "missing tick label {day}");
        }
    }

    #[test]
    fn constant_goal_spans_every_day() {
        let chart = chart(Goal::Constant(4.0));
        assert_eq!(chart.goal_points(), vec![4.0, 4.0, 4.0]);
        assert!(render_svg_string(&chart).is_ok());
    }

    #[test]
    fn series_goal_aligns_to_sales_dates() {
        let chart = chart(Goal::Series(series(&[1.0])));
        assert_eq!(chart.goal_points(), vec![1.0, 0.0, 0.0]);
    }

    #[test]
    fn empty_series_is_rejected() {
        let mut empty = chart(Goal::Constant(1.0));
        empty.sales = DailySeries::default();
        assert!(render_svg_string(&empty).is_err());
    }

    #[test]
    fn negative_days_extend_the_axis_below_zero() {
        let mut refunds = chart(Goal::Constant(4.0));
        refunds.sales = series(&[-50.0, 10.0]);

        let (low, high) = refunds.value_range();
        assert!(low <= -50.0, "axis starts at {low}");
        assert!(high >= 10.0, "axis ends at {high}");

        let svg = render_svg_string(&refunds).unwrap();
        assert!(svg.contains("2024-01-01"));
        assert!(svg.contains("2024-01-02"));
    }

    #[test]
    fn non_negative_data_starts_axis_at_zero() {
        let (low, high) = chart(Goal::Series(series(&[2.0, 2.0, 2.0]))).value_range();
        assert_eq!(low, 0.0);
        assert!((high - 5.5).abs() < 1e-9);
    }

    #[test]
    fn canvas_widens_for_long_ranges() {
        let mut quarter = chart(Goal::Constant(4.0));
        assert_eq!(quarter.canvas_size(), (1200, 600));

        quarter.sales = series(&[1.0; 92]);
        let (width, height) = quarter.canvas_size();
        assert_eq!(width, 18 * 92 + 200);
        assert_eq!(height, 600);
        assert!(render_svg_string(&quarter).unwrap().contains("2024-04-01"));
    }

    #[test]
    fn writes_svg_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chart.svg");
        render_svg(&chart(Goal::Constant(4.0)), &path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("</svg>"));
    }
}
