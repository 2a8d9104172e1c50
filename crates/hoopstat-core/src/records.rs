// Row types flowing through the pipeline.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::key::normalize;

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// One row of the per-player season stats table. A player traded mid-season
/// appears once per team stint, so several records can share a key.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerRecord {
    pub raw_name: String,
    pub normalized_key: String,
    pub team: String,
    pub position: String,
    /// Numeric per-game stats by column name. Missing cells are absent.
    pub numeric_stats: BTreeMap<String, f64>,
    /// Remaining non-numeric columns, reconciled like `team`/`position`.
    pub text_attributes: BTreeMap<String, String>,
    pub season: String,
}

impl PlayerRecord {
    /// Build a record with its join key derived from `raw_name`.
    pub fn new(
        raw_name: impl Into<String>,
        team: impl Into<String>,
        position: impl Into<String>,
        season: impl Into<String>,
    ) -> Self {
        let raw_name = raw_name.into();
        PlayerRecord {
            normalized_key: normalize(&raw_name),
            raw_name,
            team: team.into(),
            position: position.into(),
            numeric_stats: BTreeMap::new(),
            text_attributes: BTreeMap::new(),
            season: season.into(),
        }
    }

    pub fn with_stat(mut self, name: &str, value: f64) -> Self {
        self.numeric_stats.insert(name.to_string(), value);
        self
    }

    pub fn stat(&self, name: &str) -> Option<f64> {
        self.numeric_stats.get(name).copied()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SalaryRecord {
    pub raw_name: String,
    pub normalized_key: String,
    pub salary: f64,
}

impl SalaryRecord {
    pub fn new(raw_name: impl Into<String>, salary: f64) -> Self {
        let raw_name = raw_name.into();
        SalaryRecord {
            normalized_key: normalize(&raw_name),
            raw_name,
            salary,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Outcome {
    Win,
    Loss,
}

impl Outcome {
    /// Parse a `WL` cell ("W"/"L", case-insensitive).
    pub fn from_wl(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "W" => Some(Outcome::Win),
            "L" => Some(Outcome::Loss),
            _ => None,
        }
    }
}

/// One team's result in one game. Home and away rows of the same game carry
/// the same `game_id`; an empty `game_id` means the id was missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameRecord {
    pub season: String,
    pub team: String,
    pub game_id: String,
    pub outcome: Outcome,
}

impl GameRecord {
    pub fn new(season: &str, team: &str, game_id: &str, outcome: Outcome) -> Self {
        GameRecord {
            season: season.to_string(),
            team: team.to_string(),
            game_id: game_id.to_string(),
            outcome,
        }
    }
}

// ---------------------------------------------------------------------------
// Derived
// ---------------------------------------------------------------------------

/// One row per player after traded-player stints have been collapsed.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconciledPlayer {
    pub raw_name: String,
    pub normalized_key: String,
    pub team: String,
    pub position: String,
    pub numeric_stats: BTreeMap<String, f64>,
    pub text_attributes: BTreeMap<String, String>,
    pub season: String,
    /// How many input rows were merged into this one.
    pub stints: usize,
}

impl ReconciledPlayer {
    pub fn stat(&self, name: &str) -> Option<f64> {
        self.numeric_stats.get(name).copied()
    }
}

/// A reconciled player joined with their salary.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSalary {
    pub player: ReconciledPlayer,
    pub salary: f64,
    /// Primary position: the part of `player.position` before the first hyphen.
    pub position_clean: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamSeasonSummary {
    pub season: String,
    pub team: String,
    pub total_wins: u32,
    pub total_games: u32,
    pub total_losses: u32,
    pub win_pct: f64,
    pub rank: u32,
}

impl From<ReconciledPlayer> for PlayerRecord {
    fn from(p: ReconciledPlayer) -> Self {
        PlayerRecord {
            raw_name: p.raw_name,
            normalized_key: p.normalized_key,
            team: p.team,
            position: p.position,
            numeric_stats: p.numeric_stats,
            text_attributes: p.text_attributes,
            season: p.season,
        }
    }
}
