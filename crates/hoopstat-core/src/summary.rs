// Derived tables for reporting: payroll, position breakdowns, histogram
// bins and season/team pivots.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::join::{inner_join, JoinOutcome};
use crate::records::{PlayerSalary, TeamSeasonSummary};

// ---------------------------------------------------------------------------
// Team payroll
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamPayroll {
    pub team: String,
    pub total_payroll: f64,
    pub players: usize,
}

/// Sum of joined player salaries per team, ordered by team.
pub fn team_payroll(players: &[PlayerSalary]) -> Vec<TeamPayroll> {
    let mut totals: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for p in players {
        let entry = totals.entry(p.player.team.as_str()).or_insert((0.0, 0));
        entry.0 += p.salary;
        entry.1 += 1;
    }
    totals
        .into_iter()
        .map(|(team, (total_payroll, players))| TeamPayroll {
            team: team.to_string(),
            total_payroll,
            players,
        })
        .collect()
}

/// A team's season record next to its payroll.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamTrend {
    pub team: String,
    pub total_wins: u32,
    pub win_pct: f64,
    pub rank: u32,
    pub total_payroll: f64,
}

/// Join one season's standings with team payroll on team abbreviation.
pub fn team_trend(
    standings: &[TeamSeasonSummary],
    payroll: &[TeamPayroll],
) -> JoinOutcome<TeamSeasonSummary, TeamPayroll, String> {
    inner_join(standings, payroll, |s| s.team.clone(), |p| p.team.clone())
}

pub fn trend_rows(joined: &JoinOutcome<TeamSeasonSummary, TeamPayroll, String>) -> Vec<TeamTrend> {
    joined
        .matched
        .iter()
        .map(|(s, p)| TeamTrend {
            team: s.team.clone(),
            total_wins: s.total_wins,
            win_pct: s.win_pct,
            rank: s.rank,
            total_payroll: p.total_payroll,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Position breakdowns
// ---------------------------------------------------------------------------

/// Five-number summary used for box plots.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxStats {
    pub label: String,
    pub count: usize,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

/// Salary distribution per clean position, ordered by position.
pub fn salary_by_position(players: &[PlayerSalary]) -> Vec<BoxStats> {
    let mut groups: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for p in players {
        groups
            .entry(p.position_clean.as_str())
            .or_default()
            .push(p.salary);
    }
    groups
        .into_iter()
        .filter_map(|(pos, values)| box_stats(pos, values))
        .collect()
}

fn box_stats(label: &str, mut values: Vec<f64>) -> Option<BoxStats> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    Some(BoxStats {
        label: label.to_string(),
        count: values.len(),
        min: values[0],
        q1: quantile_sorted(&values, 0.25),
        median: quantile_sorted(&values, 0.5),
        q3: quantile_sorted(&values, 0.75),
        max: values[values.len() - 1],
    })
}

/// Linear-interpolated quantile of an ascending, non-empty slice.
fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionMean {
    pub position: String,
    pub mean: f64,
    pub players: usize,
}

/// Mean of `stat` per clean position. Players lacking the stat are skipped;
/// positions where nobody has it are omitted.
pub fn stat_by_position(players: &[PlayerSalary], stat: &str) -> Vec<PositionMean> {
    let mut groups: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for p in players {
        if let Some(v) = p.player.stat(stat) {
            let entry = groups.entry(p.position_clean.as_str()).or_insert((0.0, 0));
            entry.0 += v;
            entry.1 += 1;
        }
    }
    groups
        .into_iter()
        .map(|(pos, (sum, n))| PositionMean {
            position: pos.to_string(),
            mean: sum / n as f64,
            players: n,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Histogram
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Equal-width bins spanning the range of `values`. The last bin is closed
/// on the right. A zero-width range is widened to `[v - 0.5, v + 0.5]`.
pub fn histogram(values: &[f64], bins: usize) -> Vec<HistogramBin> {
    if values.is_empty() || bins == 0 {
        return Vec::new();
    }
    let mut lo = values.iter().copied().fold(f64::INFINITY, f64::min);
    let mut hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }
    let width = (hi - lo) / bins as f64;

    let mut counts = vec![0usize; bins];
    for v in values {
        let idx = (((v - lo) / width).floor() as usize).min(bins - 1);
        counts[idx] += 1;
    }
    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            lower: lo + width * i as f64,
            upper: if i + 1 == bins { hi } else { lo + width * (i + 1) as f64 },
            count,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Pivots
// ---------------------------------------------------------------------------

/// Seasons down, teams across. Cells are `None` where a team has no
/// summary for a season.
#[derive(Debug, Clone, PartialEq)]
pub struct Pivot {
    pub seasons: Vec<String>,
    pub teams: Vec<String>,
    pub cells: Vec<Vec<Option<f64>>>,
}

pub fn pivot<F>(summaries: &[TeamSeasonSummary], value: F) -> Pivot
where
    F: Fn(&TeamSeasonSummary) -> f64,
{
    let seasons: BTreeSet<&str> = summaries.iter().map(|s| s.season.as_str()).collect();
    let teams: BTreeSet<&str> = summaries.iter().map(|s| s.team.as_str()).collect();
    let lookup: BTreeMap<(&str, &str), f64> = summaries
        .iter()
        .map(|s| ((s.season.as_str(), s.team.as_str()), value(s)))
        .collect();

    let cells = seasons
        .iter()
        .map(|season| {
            teams
                .iter()
                .map(|team| lookup.get(&(*season, *team)).copied())
                .collect()
        })
        .collect();

    Pivot {
        seasons: seasons.into_iter().map(String::from).collect(),
        teams: teams.into_iter().map(String::from).collect(),
        cells,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{PlayerRecord, ReconciledPlayer};

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn player(name: &str, team: &str, pos: &str, salary: f64, pts: Option<f64>) -> PlayerSalary {
        let mut rec = PlayerRecord::new(name, team, pos, "2022-23");
        if let Some(p) = pts {
            rec = rec.with_stat("PTS", p);
        }
        PlayerSalary {
            player: ReconciledPlayer {
                raw_name: rec.raw_name,
                normalized_key: rec.normalized_key,
                team: rec.team,
                position: rec.position,
                numeric_stats: rec.numeric_stats,
                text_attributes: rec.text_attributes,
                season: rec.season,
                stints: 1,
            },
            salary,
            position_clean: crate::key::clean_position(pos),
        }
    }

    fn summary(season: &str, team: &str, wins: u32, games: u32, rank: u32) -> TeamSeasonSummary {
        TeamSeasonSummary {
            season: season.into(),
            team: team.into(),
            total_wins: wins,
            total_games: games,
            total_losses: games - wins,
            win_pct: f64::from(wins) / f64::from(games),
            rank,
        }
    }

    #[test]
    fn payroll_sums_per_team() {
        let players = vec![
            player("A", "BOS", "PG", 10.0, None),
            player("B", "BOS", "C", 5.0, None),
            player("C", "DEN", "C", 7.0, None),
        ];
        let payroll = team_payroll(&players);
        assert_eq!(payroll.len(), 2);
        assert_eq!(payroll[0].team, "BOS");
        assert!(approx_eq(payroll[0].total_payroll, 15.0));
        assert_eq!(payroll[0].players, 2);
        assert_eq!(payroll[1].team, "DEN");
    }

    #[test]
    fn trend_drops_teams_without_payroll() {
        let standings = vec![summary("2022-23", "BOS", 57, 82, 2), summary("2022-23", "MIL", 58, 82, 1)];
        let payroll = vec![TeamPayroll { team: "BOS".into(), total_payroll: 150.0, players: 12 }];
        let joined = team_trend(&standings, &payroll);
        let rows = trend_rows(&joined);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].team, "BOS");
        assert_eq!(rows[0].total_wins, 57);
        assert_eq!(joined.dropped_left_rows, 1);
    }

    #[test]
    fn box_stats_by_position() {
        let players = vec![
            player("A", "X", "C", 1.0, None),
            player("B", "X", "C-PF", 2.0, None),
            player("C", "X", "C", 3.0, None),
            player("D", "X", "C", 4.0, None),
            player("E", "X", "PG", 9.0, None),
        ];
        let stats = salary_by_position(&players);
        assert_eq!(stats.len(), 2);
        let c = &stats[0];
        assert_eq!(c.label, "C");
        assert_eq!(c.count, 4);
        assert!(approx_eq(c.min, 1.0));
        assert!(approx_eq(c.q1, 1.75));
        assert!(approx_eq(c.median, 2.5));
        assert!(approx_eq(c.q3, 3.25));
        assert!(approx_eq(c.max, 4.0));
        assert!(approx_eq(stats[1].median, 9.0));
    }

    #[test]
    fn scoring_by_position_skips_missing() {
        let players = vec![
            player("A", "X", "SG", 1.0, Some(10.0)),
            player("B", "X", "SG-PG", 1.0, Some(20.0)),
            player("C", "X", "SG", 1.0, None),
            player("D", "X", "C", 1.0, None),
        ];
        let means = stat_by_position(&players, "PTS");
        assert_eq!(means.len(), 1);
        assert_eq!(means[0].position, "SG");
        assert!(approx_eq(means[0].mean, 15.0));
        assert_eq!(means[0].players, 2);
    }

    #[test]
    fn histogram_counts_every_value() {
        let values = [0.0, 1.0, 2.0, 3.0, 4.0, 10.0];
        let bins = histogram(&values, 5);
        assert_eq!(bins.len(), 5);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), values.len());
        assert!(approx_eq(bins[0].lower, 0.0));
        assert!(approx_eq(bins[4].upper, 10.0));
        // 0 and 1 fall in [0, 2); max lands in the closed last bin
        assert_eq!(bins[0].count, 2);
        assert_eq!(bins[4].count, 1);
    }

    #[test]
    fn histogram_degenerate_range() {
        let bins = histogram(&[3.0, 3.0], 4);
        assert_eq!(bins.len(), 4);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 2);
        assert!(approx_eq(bins[0].lower, 2.5));
        assert!(histogram(&[], 4).is_empty());
    }

    #[test]
    fn pivot_fills_missing_cells_with_none() {
        let summaries = vec![
            summary("2021-22", "BOS", 51, 82, 4),
            summary("2022-23", "BOS", 57, 82, 2),
            summary("2022-23", "MIL", 58, 82, 1),
        ];
        let p = pivot(&summaries, |s| f64::from(s.rank));
        assert_eq!(p.seasons, vec!["2021-22", "2022-23"]);
        assert_eq!(p.teams, vec!["BOS", "MIL"]);
        assert_eq!(p.cells[0], vec![Some(4.0), None]);
        assert_eq!(p.cells[1], vec![Some(2.0), Some(1.0)]);
    }
}
