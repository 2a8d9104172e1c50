// Delimited-text input tables: player stats, salaries and game logs.
//
// Each table has a reader-based loader (tested from in-memory text) and a
// path-based wrapper that decodes the file with its configured encoding.

use hoopstat_core::key::{normalize, parse_currency};
use hoopstat_core::pipeline::TableProvider;
use hoopstat_core::records::{GameRecord, Outcome, PlayerRecord, SalaryRecord};
use hoopstat_core::PipelineError;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::{Config, Encoding, TableFormat};

pub const PLAYER_STATS: &str = "player stats";
pub const SALARIES: &str = "salaries";
pub const GAMES: &str = "game log";

// Column names in the source files.
const COL_PLAYER: &str = "Player";
const COL_TEAM: &str = "Tm";
const COL_POS: &str = "Pos";
const COL_SALARY_NAME: &str = "Player Name";
const COL_SALARY: &str = "Salary";
const COL_SEASON: &str = "SEASON_YEAR";
const COL_TEAM_ABBR: &str = "TEAM_ABBREVIATION";
const COL_WL: &str = "WL";
const COL_GAME_ID: &str = "GAME_ID";

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Decode raw file bytes. Latin-1 maps every byte to the code point of the
/// same value; UTF-8 input may start with a byte-order mark.
pub fn decode(table: &str, bytes: Vec<u8>, encoding: Encoding) -> Result<String, PipelineError> {
    match encoding {
        Encoding::Latin1 => Ok(bytes.into_iter().map(char::from).collect()),
        Encoding::Utf8 => {
            let text = String::from_utf8(bytes).map_err(|e| {
                PipelineError::parse(table, 0, "", "", format!("invalid UTF-8: {e}"))
            })?;
            Ok(text.trim_start_matches('\u{feff}').to_string())
        }
    }
}

fn reader(text: &str, delimiter: u8) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .from_reader(text.as_bytes())
}

fn csv_error(table: &str, e: csv::Error) -> PipelineError {
    // the header is record 0, so record indices line up with 1-based data rows
    let row = e.position().map(|p| p.record() as usize).unwrap_or(0);
    PipelineError::parse(table, row, "", "", e.to_string())
}

/// Index of every required header, or a header-row parse error naming the
/// first one missing.
fn require_columns<const N: usize>(
    table: &str,
    headers: &csv::StringRecord,
    names: [&str; N],
) -> Result<[usize; N], PipelineError> {
    let mut out = [0usize; N];
    for (slot, name) in out.iter_mut().zip(names) {
        *slot = headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| PipelineError::parse(table, 0, name, "", "required column missing"))?;
    }
    Ok(out)
}

fn read_headers(table: &str, rdr: &mut csv::Reader<&[u8]>) -> Result<csv::StringRecord, PipelineError> {
    rdr.headers().cloned().map_err(|e| csv_error(table, e))
}

fn read_rows(table: &str, rdr: &mut csv::Reader<&[u8]>) -> Result<Vec<csv::StringRecord>, PipelineError> {
    rdr.records()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| csv_error(table, e))
}

fn cell(row: &csv::StringRecord, idx: usize) -> &str {
    row.get(idx).unwrap_or_default().trim()
}

// ---------------------------------------------------------------------------
// Reader-based loaders
// ---------------------------------------------------------------------------

/// Player stat rows. Besides `Player`/`Tm`/`Pos`, a column is numeric when
/// most of its non-empty cells parse as finite numbers. In a numeric column
/// an unparseable cell is left out of that row's stats and logged with its
/// row; empty cells are absent values. Other columns are kept as text
/// attributes.
pub fn load_player_stats_from_str(
    text: &str,
    delimiter: u8,
    season: &str,
) -> Result<Vec<PlayerRecord>, PipelineError> {
    let mut rdr = reader(text, delimiter);
    let headers = read_headers(PLAYER_STATS, &mut rdr)?;
    let [name_idx, team_idx, pos_idx] =
        require_columns(PLAYER_STATS, &headers, [COL_PLAYER, COL_TEAM, COL_POS])?;

    // (1-based data row, record)
    let rows: Vec<(usize, csv::StringRecord)> = read_rows(PLAYER_STATS, &mut rdr)?
        .into_iter()
        .enumerate()
        .map(|(i, row)| (i + 1, row))
        .filter(|(_, row)| {
            // basketball-reference exports repeat the header every few rows
            let repeated = cell(row, name_idx) == COL_PLAYER;
            if repeated {
                debug!("skipping repeated header row");
            }
            !repeated
        })
        .collect();

    let extra: Vec<(usize, &str)> = headers
        .iter()
        .enumerate()
        .filter(|(i, _)| ![name_idx, team_idx, pos_idx].contains(i))
        .map(|(i, h)| (i, h.trim()))
        .collect();

    let numeric: Vec<bool> = extra
        .iter()
        .map(|(i, _)| {
            let (parsed, unparsed) = rows
                .iter()
                .map(|(_, row)| cell(row, *i))
                .filter(|c| !c.is_empty())
                .fold((0usize, 0usize), |(ok, bad), c| match parse_stat(c) {
                    Some(_) => (ok + 1, bad),
                    None => (ok, bad + 1),
                });
            parsed > unparsed
        })
        .collect();

    let mut skipped_cells = 0;
    let mut records = Vec::with_capacity(rows.len());
    for (row_no, row) in &rows {
        let mut rec = PlayerRecord::new(
            cell(row, name_idx),
            cell(row, team_idx),
            cell(row, pos_idx),
            season,
        );
        for ((i, name), is_numeric) in extra.iter().zip(&numeric) {
            let c = cell(row, *i);
            if c.is_empty() {
                continue;
            }
            if !*is_numeric {
                rec.text_attributes.insert(name.to_string(), c.to_string());
                continue;
            }
            match parse_stat(c) {
                Some(v) => {
                    rec.numeric_stats.insert(name.to_string(), v);
                }
                None => {
                    warn!(
                        "{} row {}: column `{}` value {:?} is not a number, left out of the mean",
                        PLAYER_STATS, row_no, name, c
                    );
                    skipped_cells += 1;
                }
            }
        }
        records.push(rec);
    }

    let numeric_cols = numeric.iter().filter(|n| **n).count();
    debug!(
        "player stats: {} numeric and {} text columns, {} unparseable numeric cells",
        numeric_cols,
        extra.len() - numeric_cols,
        skipped_cells
    );
    Ok(records)
}

fn parse_stat(c: &str) -> Option<f64> {
    c.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Salary rows. A salary that does not parse as currency is an error naming
/// its row.
pub fn load_salaries_from_str(text: &str, delimiter: u8) -> Result<Vec<SalaryRecord>, PipelineError> {
    let mut rdr = reader(text, delimiter);
    let headers = read_headers(SALARIES, &mut rdr)?;
    let [name_idx, salary_idx] = require_columns(SALARIES, &headers, [COL_SALARY_NAME, COL_SALARY])?;

    let mut out = Vec::new();
    for (i, row) in read_rows(SALARIES, &mut rdr)?.iter().enumerate() {
        let raw = cell(row, salary_idx);
        let salary = parse_currency(raw).ok_or_else(|| {
            PipelineError::parse(SALARIES, i + 1, COL_SALARY, raw, "not a currency amount")
        })?;
        let name = cell(row, name_idx);
        out.push(SalaryRecord {
            raw_name: name.to_string(),
            normalized_key: normalize(name),
            salary,
        });
    }
    Ok(out)
}

/// Game log rows, one per team per game.
pub fn load_games_from_str(text: &str, delimiter: u8) -> Result<Vec<GameRecord>, PipelineError> {
    let mut rdr = reader(text, delimiter);
    let headers = read_headers(GAMES, &mut rdr)?;
    let [season_idx, team_idx, wl_idx, id_idx] = require_columns(
        GAMES,
        &headers,
        [COL_SEASON, COL_TEAM_ABBR, COL_WL, COL_GAME_ID],
    )?;

    let mut out = Vec::new();
    for (i, row) in read_rows(GAMES, &mut rdr)?.iter().enumerate() {
        let wl = cell(row, wl_idx);
        let outcome = Outcome::from_wl(wl)
            .ok_or_else(|| PipelineError::parse(GAMES, i + 1, COL_WL, wl, "expected W or L"))?;
        out.push(GameRecord::new(
            cell(row, season_idx),
            cell(row, team_idx),
            cell(row, id_idx),
            outcome,
        ));
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Path-based loaders
// ---------------------------------------------------------------------------

fn read_table(table: &str, path: &Path, format: &TableFormat) -> Result<(String, u8), PipelineError> {
    let bytes = std::fs::read(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => PipelineError::InputNotFound {
            table: table.to_string(),
            path: path.to_path_buf(),
        },
        _ => PipelineError::Io {
            table: table.to_string(),
            path: path.to_path_buf(),
            source: e,
        },
    })?;
    let delimiter = format.delimiter_byte().ok_or_else(|| {
        PipelineError::invalid(table, format!("unusable delimiter {:?}", format.delimiter))
    })?;
    Ok((decode(table, bytes, format.encoding)?, delimiter))
}

pub fn load_player_stats(
    path: &Path,
    format: &TableFormat,
    season: &str,
) -> Result<Vec<PlayerRecord>, PipelineError> {
    let (text, delimiter) = read_table(PLAYER_STATS, path, format)?;
    let rows = load_player_stats_from_str(&text, delimiter, season)?;
    info!("Loaded {} player stat rows from {}", rows.len(), path.display());
    Ok(rows)
}

pub fn load_salaries(path: &Path, format: &TableFormat) -> Result<Vec<SalaryRecord>, PipelineError> {
    let (text, delimiter) = read_table(SALARIES, path, format)?;
    let rows = load_salaries_from_str(&text, delimiter)?;
    info!("Loaded {} salaries from {}", rows.len(), path.display());
    Ok(rows)
}

pub fn load_games(path: &Path, format: &TableFormat) -> Result<Vec<GameRecord>, PipelineError> {
    let (text, delimiter) = read_table(GAMES, path, format)?;
    let rows = load_games_from_str(&text, delimiter)?;
    info!("Loaded {} game rows from {}", rows.len(), path.display());
    Ok(rows)
}

// ---------------------------------------------------------------------------
// TableProvider
// ---------------------------------------------------------------------------

/// Reads the three input tables from the files named in the config.
#[derive(Debug, Clone)]
pub struct CsvTableProvider {
    player_stats: (PathBuf, TableFormat),
    salaries: (PathBuf, TableFormat),
    games: (PathBuf, TableFormat),
}

impl CsvTableProvider {
    pub fn from_config(config: &Config) -> Self {
        CsvTableProvider {
            player_stats: (
                config.resolve(&config.data_paths.player_stats),
                config.player_stats.clone(),
            ),
            salaries: (
                config.resolve(&config.data_paths.salaries),
                config.salaries.clone(),
            ),
            games: (config.resolve(&config.data_paths.games), config.games.clone()),
        }
    }
}

impl TableProvider for CsvTableProvider {
    fn player_stats(&self, season: &str) -> Result<Vec<PlayerRecord>, PipelineError> {
        load_player_stats(&self.player_stats.0, &self.player_stats.1, season)
    }

    fn salaries(&self) -> Result<Vec<SalaryRecord>, PipelineError> {
        load_salaries(&self.salaries.0, &self.salaries.1)
    }

    fn games(&self) -> Result<Vec<GameRecord>, PipelineError> {
        load_games(&self.games.0, &self.games.1)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
