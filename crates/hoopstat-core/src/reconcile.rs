// Collapse traded-player stints into one row per player.
//
// Numeric stats are averaged over the stints that report them. Text
// attributes (team, position, extra text columns) come from a single
// representative stint chosen by the `TieBreak` policy.

use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};

use crate::records::{PlayerRecord, ReconciledPlayer};

/// Which stint supplies the non-numeric attributes of a multi-stint player.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TieBreak {
    /// The first stint in input order.
    #[default]
    FirstSeen,
    /// The stint with the largest value in `column` (e.g. games played).
    /// Stints missing the column never win; equal values keep the earlier one.
    MostGames { column: String },
}

impl TieBreak {
    fn representative<'a>(&self, group: &[&'a PlayerRecord]) -> &'a PlayerRecord {
        let first = group[0];
        match self {
            TieBreak::FirstSeen => first,
            TieBreak::MostGames { column } => {
                let mut best = first;
                for rec in &group[1..] {
                    if let Some(v) = rec.stat(column) {
                        if best.stat(column).map_or(true, |b| v > b) {
                            best = rec;
                        }
                    }
                }
                best
            }
        }
    }
}

/// Group `records` by `(season, normalized_key)` and merge each group.
///
/// Groups are emitted in order of first appearance. A single-stint group
/// passes through with its values unchanged.
pub fn reconcile(records: &[PlayerRecord], tie_break: &TieBreak) -> Vec<ReconciledPlayer> {
    let mut index: HashMap<(&str, &str), usize> = HashMap::new();
    let mut groups: Vec<Vec<&PlayerRecord>> = Vec::new();

    for rec in records {
        let key = (rec.season.as_str(), rec.normalized_key.as_str());
        match index.get(&key) {
            Some(&i) => groups[i].push(rec),
            None => {
                index.insert(key, groups.len());
                groups.push(vec![rec]);
            }
        }
    }

    let mut merged = 0usize;
    let players: Vec<ReconciledPlayer> = groups
        .iter()
        .map(|group| {
            if group.len() > 1 {
                merged += 1;
                debug!(
                    "averaging {} stints for '{}'",
                    group.len(),
                    group[0].raw_name.trim()
                );
            }
            merge_group(group, tie_break)
        })
        .collect();

    info!(
        "reconciled {} stat rows into {} players ({} with multiple stints)",
        records.len(),
        players.len(),
        merged
    );
    players
}

fn merge_group(group: &[&PlayerRecord], tie_break: &TieBreak) -> ReconciledPlayer {
    let rep = tie_break.representative(group);
    ReconciledPlayer {
        raw_name: rep.raw_name.clone(),
        normalized_key: rep.normalized_key.clone(),
        team: rep.team.clone(),
        position: rep.position.clone(),
        numeric_stats: mean_stats(group),
        text_attributes: rep.text_attributes.clone(),
        season: rep.season.clone(),
        stints: group.len(),
    }
}

/// Per-column mean over the rows that carry the column.
fn mean_stats(group: &[&PlayerRecord]) -> BTreeMap<String, f64> {
    let mut sums: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for rec in group {
        for (name, value) in &rec.numeric_stats {
            let entry = sums.entry(name.as_str()).or_insert((0.0, 0));
            entry.0 += value;
            entry.1 += 1;
        }
    }
    sums.into_iter()
        .map(|(name, (sum, n))| (name.to_string(), sum / n as f64))
        .collect()
}
