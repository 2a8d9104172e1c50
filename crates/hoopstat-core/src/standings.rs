// Team win/loss records, win percentage and rank per season.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, warn};

use crate::error::PipelineError;
use crate::records::{GameRecord, Outcome, TeamSeasonSummary};

#[derive(Default)]
struct Tally<'a> {
    games: HashSet<&'a str>,
    wins: HashSet<&'a str>,
    rows_without_id: usize,
}

/// Summaries for every team in `season`, ranked by win percentage.
pub fn aggregate(
    games: &[GameRecord],
    season: &str,
) -> Result<Vec<TeamSeasonSummary>, PipelineError> {
    let in_season: Vec<&GameRecord> = games.iter().filter(|g| g.season == season).collect();
    debug!("{} game rows for season {}", in_season.len(), season);
    summarize(in_season, NoGames::Fail)
}

/// Summaries for every season present in `games`, ranked within each season.
/// Teams without a single game id are left out with a warning.
pub fn aggregate_all(games: &[GameRecord]) -> Result<Vec<TeamSeasonSummary>, PipelineError> {
    summarize(games.iter().collect(), NoGames::Skip)
}

#[derive(Clone, Copy, PartialEq)]
enum NoGames {
    Fail,
    Skip,
}

/// Output is ordered by season, then rank, then team.
fn summarize(
    games: Vec<&GameRecord>,
    no_games: NoGames,
) -> Result<Vec<TeamSeasonSummary>, PipelineError> {
    let mut tallies: BTreeMap<(&str, &str), Tally> = BTreeMap::new();
    for g in &games {
        let tally = tallies
            .entry((g.season.as_str(), g.team.as_str()))
            .or_default();
        let id = g.game_id.trim();
        if id.is_empty() {
            tally.rows_without_id += 1;
            continue;
        }
        tally.games.insert(id);
        if g.outcome == Outcome::Win {
            tally.wins.insert(id);
        }
    }

    let mut by_season: BTreeMap<&str, Vec<TeamSeasonSummary>> = BTreeMap::new();
    for ((season, team), tally) in tallies {
        if tally.rows_without_id > 0 {
            warn!(
                "{} {}: ignored {} game rows without a game id",
                season, team, tally.rows_without_id
            );
        }
        let total_games = tally.games.len() as u32;
        if total_games == 0 && no_games == NoGames::Skip {
            warn!("{} {}: no recorded games, left out of standings", season, team);
            continue;
        }
        if total_games == 0 {
            return Err(PipelineError::invalid(
                "team standings",
                format!("team {team} has no recorded games in season {season}"),
            ));
        }
        let total_wins = tally.wins.len() as u32;
        by_season.entry(season).or_default().push(TeamSeasonSummary {
            season: season.to_string(),
            team: team.to_string(),
            total_wins,
            total_games,
            total_losses: total_games - total_wins,
            win_pct: f64::from(total_wins) / f64::from(total_games),
            rank: 0,
        });
    }

    let mut out = Vec::new();
    for (_, mut teams) in by_season {
        let pcts: Vec<f64> = teams.iter().map(|t| t.win_pct).collect();
        for (team, rank) in teams.iter_mut().zip(rank_min_descending(&pcts)) {
            team.rank = rank;
        }
        teams.sort_by(|a, b| a.rank.cmp(&b.rank).then_with(|| a.team.cmp(&b.team)));
        out.extend(teams);
    }
    Ok(out)
}

/// Rank values from highest (rank 1) to lowest. Tied values share the
/// smallest rank of their block and the next distinct value skips ahead,
/// so `[0.7, 0.7, 0.5]` ranks as `[1, 1, 3]`.
pub fn rank_min_descending(values: &[f64]) -> Vec<u32> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| {
        values[b]
            .partial_cmp(&values[a])
            .unwrap_or(Ordering::Equal)
    });

    let mut ranks = vec![0u32; values.len()];
    let mut prev: Option<(f64, u32)> = None;
    for (pos, &i) in order.iter().enumerate() {
        let rank = match prev {
            Some((v, r)) if v == values[i] => r,
            _ => pos as u32 + 1,
        };
        ranks[i] = rank;
        prev = Some((values[i], rank));
    }
    ranks
}
