use std::io;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum, ValueHint};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod aggregate;
mod chart;
mod clean;
mod dates;
mod error;
mod loader;
mod models;
mod report;
mod reshape;

use aggregate::Selection;
use chart::{Goal, SalesChart};
use models::{AgentId, DailyTable, LongTable};

#[derive(Parser)]
#[command(name = "sales-goal-viewer")]
#[command(about = "Daily agent sales vs. goal from uploaded sales sheets", long_about = None)]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List agent ids and the date range covered by a file
    Agents {
        #[command(flatten)]
        source: SourceArgs,
        #[arg(long, value_enum, default_value_t = Layout::ShiftGoals)]
        layout: Layout,
    },
    /// Daily CGR shift sales against the per-day CRPH goal
    Shift {
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        view: ViewArgs,
    },
    /// Daily transaction amounts against a fixed goal
    Transactions {
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        view: ViewArgs,
        /// Daily sales goal drawn as a flat line
        #[arg(long)]
        goal: f64,
    },
}

#[derive(Args)]
struct SourceArgs {
    /// Spreadsheet (.xlsx, .xlsm, .xls, .ods) or .csv file
    #[arg(long, value_hint = ValueHint::FilePath)]
    file: PathBuf,
    /// Sheet to read from spreadsheets (defaults per layout)
    #[arg(long, env = "SALES_VIEWER_SHEET")]
    sheet: Option<String>,
}

#[derive(Args)]
struct ViewArgs {
    #[arg(long)]
    agent: String,
    /// First day (YYYY-MM-DD); defaults to the earliest date in the file
    #[arg(long)]
    start: Option<NaiveDate>,
    /// Last day (YYYY-MM-DD); defaults to the latest date in the file
    #[arg(long)]
    end: Option<NaiveDate>,
    /// Write the chart as SVG
    #[arg(long, value_hint = ValueHint::FilePath)]
    svg: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,
    /// Write the table/JSON here instead of stdout
    #[arg(long, value_hint = ValueHint::FilePath)]
    out: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Layout {
    /// Wide sheet with "<date> CGR" / "<date> CRPH Goal" column pairs
    ShiftGoals,
    /// Fixed 16-column transaction export
    Transactions,
}

impl Layout {
    fn default_sheet(self) -> &'static str {
        match self {
            Layout::ShiftGoals => "Sales Viewer (Manager)",
            Layout::Transactions => "Transactions",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    match cli.command {
        Commands::Agents { source, layout } => {
            let long = load_long_table(&source, layout)?;
            let agents = long.agents();
            if agents.is_empty() {
                println!("No agents found in {}.", source.file.display());
                return Ok(());
            }

            println!("Agents:");
            for agent in &agents {
                match long.agent_name(agent) {
                    Some(name) => println!("- {agent} ({name})"),
                    None => println!("- {agent}"),
                }
            }
            match long.date_bounds() {
                Some((first, last)) => println!("Dates: {first} to {last}"),
                None => println!("Dates: none parsable"),
            }
        }
        Commands::Shift { source, view } => {
            let long = load_long_table(&source, Layout::ShiftGoals)?;
            let selection = resolve_selection(&long, &view)?;
            let daily = aggregate::daily_totals(&long, &selection);

            emit_table("Daily CGR Sales Data vs. Goal", &selection, &daily, &view)?;
            if let Some(path) = view.svg.as_deref() {
                let sales = daily
                    .series(reshape::SALES_METRIC)
                    .context("shift table has no CGR column")?;
                let goal = daily
                    .series(reshape::GOAL_METRIC)
                    .context("shift table has no CRPH Goal column")?;
                emit_chart(
                    path,
                    SalesChart {
                        title: format!(
                            "Daily CGR Shift Sales vs. Goal for Agent {}",
                            selection.agent
                        ),
                        sales_label: "CGR Shift Sales".to_string(),
                        goal_label: "CGR Shift Sales Goal".to_string(),
                        sales,
                        goal: Goal::Series(goal),
                    },
                )?;
            }
        }
        Commands::Transactions { source, view, goal } => {
            let long = load_long_table(&source, Layout::Transactions)?;
            let selection = resolve_selection(&long, &view)?;
            let daily = aggregate::daily_totals(&long, &selection).with_constant("Goal", goal);

            emit_table("Daily Sales Data vs. Goal", &selection, &daily, &view)?;
            if let Some(path) = view.svg.as_deref() {
                let sales = daily
                    .series(clean::AMOUNT_METRIC)
                    .context("transaction table has no Amount column")?;
                emit_chart(
                    path,
                    SalesChart {
                        title: format!("Daily Sales vs. Goal for Agent {}", selection.agent),
                        sales_label: "Daily Sales".to_string(),
                        goal_label: "Sales Goal".to_string(),
                        sales,
                        goal: Goal::Constant(goal),
                    },
                )?;
            }
        }
    }

    Ok(())
}

fn load_long_table(source: &SourceArgs, layout: Layout) -> anyhow::Result<LongTable> {
    let sheet = source
        .sheet
        .as_deref()
        .unwrap_or_else(|| layout.default_sheet());
    let raw = loader::load_table(&source.file, sheet)
        .with_context(|| format!("failed to load {}", source.file.display()))?;

    let long = match layout {
        Layout::ShiftGoals => reshape::reshape(&raw)?,
        Layout::Transactions => clean::clean(&raw)?.0,
    };
    info!(
        file = %source.file.display(),
        raw_rows = raw.rows.len(),
        long_rows = long.rows.len(),
        "loaded sales data"
    );
    Ok(long)
}

fn resolve_selection(long: &LongTable, view: &ViewArgs) -> anyhow::Result<Selection> {
    let bounds = long.date_bounds();
    let start = view
        .start
        .or(bounds.map(|(first, _)| first))
        .context("no --start given and the file has no parsable dates")?;
    let end = view
        .end
        .or(bounds.map(|(_, last)| last))
        .context("no --end given and the file has no parsable dates")?;

    let agent = AgentId::new(view.agent.trim());
    if !long.agents().contains(&agent) {
        warn!(agent = %agent, "agent not present in file");
    }

    Ok(Selection { agent, start, end })
}

fn emit_table(
    title: &str,
    selection: &Selection,
    daily: &DailyTable,
    view: &ViewArgs,
) -> anyhow::Result<()> {
    let rendered = match view.format {
        OutputFormat::Table => report::build_table(title, selection, daily),
        OutputFormat::Json => report::build_json(selection, daily)? + "\n",
    };

    match view.out.as_deref() {
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Daily table written to {}.", path.display());
        }
        None => print!("{rendered}"),
    }
    Ok(())
}

fn emit_chart(path: &Path, chart: SalesChart) -> anyhow::Result<()> {
    if chart.sales.is_empty() {
        warn!("no days selected; skipping chart");
        return Ok(());
    }
    chart::render_svg(&chart, path)
        .with_context(|| format!("failed to render chart to {}", path.display()))?;
    println!("Chart written to {}.", path.display());
    Ok(())
}
