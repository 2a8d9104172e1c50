// Reporting model: plain tables and chart requests handed to a sink.
//
// The sink decides how to persist or render them; nothing here touches the
// filesystem.

use serde::Serialize;

use crate::error::PipelineError;
use crate::summary::{BoxStats, HistogramBin, Pivot, PositionMean, TeamPayroll, TeamTrend};
use crate::records::{PlayerSalary, TeamSeasonSummary};

/// A named table of string cells.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(name: &str, headers: &[&str]) -> Self {
        Table {
            name: name.to_string(),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }
}

/// Labelled point for scatter plots.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelledPoint {
    pub label: String,
    pub x: f64,
    pub y: f64,
}

/// Labelled bar for bar charts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar {
    pub label: String,
    pub value: f64,
}

/// Everything a renderer needs to draw one chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChartRequest {
    Histogram {
        name: String,
        title: String,
        x_label: String,
        y_label: String,
        bins: Vec<HistogramBin>,
    },
    BoxPlot {
        name: String,
        title: String,
        x_label: String,
        y_label: String,
        groups: Vec<BoxStats>,
    },
    Bar {
        name: String,
        title: String,
        x_label: String,
        y_label: String,
        bars: Vec<Bar>,
    },
    Scatter {
        name: String,
        title: String,
        x_label: String,
        y_label: String,
        points: Vec<LabelledPoint>,
    },
    HorizontalBar {
        name: String,
        title: String,
        x_label: String,
        y_label: String,
        x_range: (f64, f64),
        bars: Vec<Bar>,
    },
}

impl ChartRequest {
    pub fn name(&self) -> &str {
        match self {
            ChartRequest::Histogram { name, .. }
            | ChartRequest::BoxPlot { name, .. }
            | ChartRequest::Bar { name, .. }
            | ChartRequest::Scatter { name, .. }
            | ChartRequest::HorizontalBar { name, .. } => name,
        }
    }
}

/// Destination for pipeline output.
pub trait ReportSink {
    fn emit_table(&mut self, table: &Table) -> Result<(), PipelineError>;
    fn emit_chart(&mut self, chart: &ChartRequest) -> Result<(), PipelineError>;
}

/// Collects everything in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub tables: Vec<Table>,
    pub charts: Vec<ChartRequest>,
}

impl MemorySink {
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn chart(&self, name: &str) -> Option<&ChartRequest> {
        self.charts.iter().find(|c| c.name() == name)
    }
}

impl ReportSink for MemorySink {
    fn emit_table(&mut self, table: &Table) -> Result<(), PipelineError> {
        self.tables.push(table.clone());
        Ok(())
    }

    fn emit_chart(&mut self, chart: &ChartRequest) -> Result<(), PipelineError> {
        self.charts.push(chart.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Table builders
// ---------------------------------------------------------------------------

fn num(v: f64) -> String {
    v.to_string()
}

fn opt(v: Option<f64>) -> String {
    v.map(num).unwrap_or_default()
}

/// One row per joined player: identity, salary, clean position, then every
/// numeric stat column seen across the players (blank when absent).
pub fn player_salary_table(players: &[PlayerSalary]) -> Table {
    let mut stat_names: Vec<&str> = players
        .iter()
        .flat_map(|p| p.player.numeric_stats.keys().map(String::as_str))
        .collect();
    stat_names.sort_unstable();
    stat_names.dedup();

    let mut headers = vec!["player_key", "Player", "Tm", "Pos", "Pos_Clean", "Salary", "Stints"];
    headers.extend(stat_names.iter().copied());
    let mut table = Table::new("player_salaries", &headers);

    for p in players {
        let mut row = vec![
            p.player.normalized_key.clone(),
            p.player.raw_name.clone(),
            p.player.team.clone(),
            p.player.position.clone(),
            p.position_clean.clone(),
            num(p.salary),
            p.player.stints.to_string(),
        ];
        row.extend(stat_names.iter().map(|s| opt(p.player.stat(s))));
        table.push(row);
    }
    table
}

pub fn payroll_table(payroll: &[TeamPayroll]) -> Table {
    let mut table = Table::new("team_payroll", &["Team", "Total_Payroll", "Players"]);
    for p in payroll {
        table.push(vec![p.team.clone(), num(p.total_payroll), p.players.to_string()]);
    }
    table
}

pub fn standings_table(standings: &[TeamSeasonSummary]) -> Table {
    let mut table = Table::new(
        "team_standings",
        &["Season", "Team", "Total_Wins", "Total_Losses", "Total_Games", "Win_Pct", "Rank"],
    );
    for s in standings {
        table.push(vec![
            s.season.clone(),
            s.team.clone(),
            s.total_wins.to_string(),
            s.total_losses.to_string(),
            s.total_games.to_string(),
            num(s.win_pct),
            s.rank.to_string(),
        ]);
    }
    table
}

pub fn trend_table(trend: &[TeamTrend]) -> Table {
    let mut table = Table::new(
        "team_trend",
        &["Team", "Total_Wins", "Win_Pct", "Rank", "Total_Payroll"],
    );
    for t in trend {
        table.push(vec![
            t.team.clone(),
            t.total_wins.to_string(),
            num(t.win_pct),
            t.rank.to_string(),
            num(t.total_payroll),
        ]);
    }
    table
}

pub fn pivot_table(name: &str, pivot: &Pivot) -> Table {
    let mut headers = vec!["Season"];
    headers.extend(pivot.teams.iter().map(String::as_str));
    let mut table = Table::new(name, &headers);
    for (season, cells) in pivot.seasons.iter().zip(&pivot.cells) {
        let mut row = vec![season.clone()];
        row.extend(cells.iter().map(|c| opt(*c)));
        table.push(row);
    }
    table
}

pub fn position_mean_bars(means: &[PositionMean]) -> Vec<Bar> {
    means
        .iter()
        .map(|m| Bar {
            label: m.position.clone(),
            value: m.mean,
        })
        .collect()
}
