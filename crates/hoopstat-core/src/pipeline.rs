// Pipeline orchestration: normalize -> reconcile -> join -> aggregate -> report.
//
// Input tables come from a `TableProvider`; the pipeline keeps no state
// between runs.

use serde::Serialize;
use tracing::{info, warn};

use crate::error::PipelineError;
use crate::join::{inner_join, log_unmatched};
use crate::key::clean_position;
use crate::reconcile::{reconcile, TieBreak};
use crate::records::{GameRecord, PlayerRecord, PlayerSalary, SalaryRecord, TeamSeasonSummary};
use crate::report::{self, Bar, ChartRequest, LabelledPoint, ReportSink, Table};
use crate::standings::{aggregate, aggregate_all};
use crate::summary::{self, TeamPayroll, TeamTrend};

const MILLION: f64 = 1_000_000.0;

/// Source of the three input tables.
pub trait TableProvider {
    /// Per-player stat rows, stamped with `season`.
    fn player_stats(&self, season: &str) -> Result<Vec<PlayerRecord>, PipelineError>;
    fn salaries(&self) -> Result<Vec<SalaryRecord>, PipelineError>;
    fn games(&self) -> Result<Vec<GameRecord>, PipelineError>;
}

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub season: String,
    pub tie_break: TieBreak,
    pub histogram_bins: usize,
    /// Stat averaged per position for the scoring chart.
    pub scoring_stat: String,
}

impl PipelineSettings {
    pub fn new(season: &str) -> Self {
        PipelineSettings {
            season: season.to_string(),
            tie_break: TieBreak::default(),
            histogram_bins: 20,
            scoring_stat: "PTS".into(),
        }
    }
}

/// Row counts at every point where data can be dropped.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MatchReport {
    pub stat_rows: usize,
    pub reconciled_players: usize,
    pub multi_stint_players: usize,
    pub players_without_salary: usize,
    pub salaries_without_player: usize,
    pub joined_players: usize,
    pub payroll_teams_without_standings: usize,
    pub standings_teams_without_payroll: usize,
}

impl MatchReport {
    pub fn table(&self) -> Table {
        let mut table = Table::new("match_report", &["Metric", "Count"]);
        let rows: [(&str, usize); 8] = [
            ("stat_rows", self.stat_rows),
            ("reconciled_players", self.reconciled_players),
            ("multi_stint_players", self.multi_stint_players),
            ("players_without_salary", self.players_without_salary),
            ("salaries_without_player", self.salaries_without_player),
            ("joined_players", self.joined_players),
            ("payroll_teams_without_standings", self.payroll_teams_without_standings),
            ("standings_teams_without_payroll", self.standings_teams_without_payroll),
        ];
        for (metric, count) in rows {
            table.push(vec![metric.to_string(), count.to_string()]);
        }
        table
    }
}

/// Everything one run computes.
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub season: String,
    pub players: Vec<PlayerSalary>,
    pub payroll: Vec<TeamPayroll>,
    /// Target season, ordered by rank.
    pub standings: Vec<TeamSeasonSummary>,
    /// Every season in the game log.
    pub all_standings: Vec<TeamSeasonSummary>,
    pub trend: Vec<TeamTrend>,
    pub matches: MatchReport,
}

/// Load, analyse and publish in one go.
pub fn run(
    provider: &dyn TableProvider,
    settings: &PipelineSettings,
    sink: &mut dyn ReportSink,
) -> Result<AnalysisReport, PipelineError> {
    let report = analyze(provider, settings)?;
    publish(&report, settings, sink)?;
    Ok(report)
}

pub fn analyze(
    provider: &dyn TableProvider,
    settings: &PipelineSettings,
) -> Result<AnalysisReport, PipelineError> {
    info!("Starting analysis for {} season", settings.season);
    let mut matches = MatchReport::default();

    // --- players ---
    let stats = provider.player_stats(&settings.season)?;
    let salaries = provider.salaries()?;
    matches.stat_rows = stats.len();

    let reconciled = reconcile(&stats, &settings.tie_break);
    matches.reconciled_players = reconciled.len();
    matches.multi_stint_players = reconciled.iter().filter(|p| p.stints > 1).count();

    let joined = inner_join(
        &reconciled,
        &salaries,
        |p| p.normalized_key.clone(),
        |s| s.normalized_key.clone(),
    );
    log_unmatched("player/salary join", &joined);
    matches.players_without_salary = joined.dropped_left_rows;
    matches.salaries_without_player = joined.dropped_right_rows;

    let players: Vec<PlayerSalary> = joined
        .matched
        .into_iter()
        .map(|(player, salary)| PlayerSalary {
            position_clean: clean_position(&player.position),
            salary: salary.salary,
            player,
        })
        .collect();
    matches.joined_players = players.len();
    info!("Player data ready: {} players processed", players.len());

    // --- teams ---
    let payroll = summary::team_payroll(&players);
    let games = provider.games()?;
    let standings = aggregate(&games, &settings.season)?;
    if standings.is_empty() {
        return Err(PipelineError::invalid(
            "team standings",
            format!("no game rows for season {}", settings.season),
        ));
    }
    let all_standings = aggregate_all(&games)?;

    let trend_join = summary::team_trend(&standings, &payroll);
    log_unmatched("standings/payroll join", &trend_join);
    matches.standings_teams_without_payroll = trend_join.dropped_left_rows;
    matches.payroll_teams_without_standings = trend_join.dropped_right_rows;
    let trend = summary::trend_rows(&trend_join);
    info!("Team data ready: {} teams processed", trend.len());

    if matches.players_without_salary > 0 || matches.salaries_without_player > 0 {
        warn!(
            "{} players had no salary and {} salaries had no player; both were left out",
            matches.players_without_salary, matches.salaries_without_player
        );
    }

    Ok(AnalysisReport {
        season: settings.season.clone(),
        players,
        payroll,
        standings,
        all_standings,
        trend,
        matches,
    })
}

/// Push all tables and chart requests for `report` into `sink`.
pub fn publish(
    report: &AnalysisReport,
    settings: &PipelineSettings,
    sink: &mut dyn ReportSink,
) -> Result<(), PipelineError> {
    let season = &report.season;

    sink.emit_table(&report::player_salary_table(&report.players))?;
    sink.emit_table(&report::payroll_table(&report.payroll))?;
    sink.emit_table(&report::standings_table(&report.standings))?;
    sink.emit_table(&report::trend_table(&report.trend))?;
    let rank_pivot = summary::pivot(&report.all_standings, |s| f64::from(s.rank));
    sink.emit_table(&report::pivot_table("team_rank_pivot", &rank_pivot))?;
    let pct_pivot = summary::pivot(&report.standings, |s| s.win_pct);
    sink.emit_table(&report::pivot_table("team_win_pct_pivot", &pct_pivot))?;
    sink.emit_table(&report.matches.table())?;

    for chart in charts(report, settings) {
        sink.emit_chart(&chart)?;
    }
    info!("Published report for {season}");
    Ok(())
}

fn charts(report: &AnalysisReport, settings: &PipelineSettings) -> Vec<ChartRequest> {
    let season = &report.season;

    let salaries_m: Vec<f64> = report.players.iter().map(|p| p.salary / MILLION).collect();
    let histogram = ChartRequest::Histogram {
        name: "viz_1_salary_histogram".into(),
        title: format!("Salary Distribution ({season})"),
        x_label: "Salary (Millions USD)".into(),
        y_label: "Count of Players".into(),
        bins: summary::histogram(&salaries_m, settings.histogram_bins),
    };

    let boxplot = ChartRequest::BoxPlot {
        name: "viz_2_salary_boxplot".into(),
        title: format!("Salary Ranges by Position ({season})"),
        x_label: "Position".into(),
        y_label: "Salary (USD)".into(),
        groups: summary::salary_by_position(&report.players),
    };

    let scoring = summary::stat_by_position(&report.players, &settings.scoring_stat);
    let scoring_bar = ChartRequest::Bar {
        name: "viz_3_scoring_bar".into(),
        title: format!("Average Scoring by Position ({season})"),
        x_label: "Position".into(),
        y_label: format!("Average {} Per Game", settings.scoring_stat),
        bars: report::position_mean_bars(&scoring),
    };

    let scatter = ChartRequest::Scatter {
        name: "viz_4_payroll_wins_scatter".into(),
        title: format!("Team Payroll vs Wins ({season})"),
        x_label: "Total Payroll (Millions USD)".into(),
        y_label: "Total Wins".into(),
        points: report
            .trend
            .iter()
            .map(|t| LabelledPoint {
                label: t.team.clone(),
                x: t.total_payroll / MILLION,
                y: f64::from(t.total_wins),
            })
            .collect(),
    };

    let mut by_pct: Vec<&TeamSeasonSummary> = report.standings.iter().collect();
    by_pct.sort_by(|a, b| a.win_pct.total_cmp(&b.win_pct).then_with(|| a.team.cmp(&b.team)));
    let standings_bar = ChartRequest::HorizontalBar {
        name: "viz_5_standings_bar".into(),
        title: format!("Team Win % Rankings ({season})"),
        x_label: "Win Percentage".into(),
        y_label: "Team".into(),
        x_range: (0.0, 1.0),
        bars: by_pct
            .into_iter()
            .map(|s| Bar {
                label: s.team.clone(),
                value: s.win_pct,
            })
            .collect(),
    };

    vec![histogram, boxplot, scoring_bar, scatter, standings_bar]
}
