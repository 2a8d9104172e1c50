// Configuration loading and parsing (config/analysis.toml).

use hoopstat_core::reconcile::TieBreak;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_FILE: &str = "analysis.toml";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    /// Directory relative paths in the config are resolved against.
    pub base_dir: PathBuf,
    pub season: String,
    pub data_paths: DataPaths,
    pub player_stats: TableFormat,
    pub salaries: TableFormat,
    pub games: TableFormat,
    pub reconcile: ReconcileConfig,
    pub report: ReportConfig,
}

impl Config {
    /// Resolve a configured path: absolute paths pass through, relative
    /// ones are joined onto `base_dir`.
    pub fn resolve(&self, path: &str) -> PathBuf {
        let p = Path::new(path);
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.base_dir.join(p)
        }
    }

    pub fn output_dir(&self) -> PathBuf {
        self.resolve(&self.report.output_dir)
    }
}

// ---------------------------------------------------------------------------
// analysis.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the whole analysis.toml file.
#[derive(Debug, Clone, Deserialize)]
struct AnalysisFile {
    season: SeasonSection,
    data_paths: DataPaths,
    #[serde(default = "TableFormat::semicolon_latin1")]
    player_stats: TableFormat,
    #[serde(default)]
    salaries: TableFormat,
    #[serde(default)]
    games: TableFormat,
    #[serde(default)]
    reconcile: ReconcileConfig,
    report: ReportConfig,
}

#[derive(Debug, Clone, Deserialize)]
struct SeasonSection {
    target: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataPaths {
    pub player_stats: String,
    pub salaries: String,
    pub games: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    #[default]
    Utf8,
    Latin1,
}

/// How one delimited input file is laid out.
#[derive(Debug, Clone, Deserialize)]
pub struct TableFormat {
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
    #[serde(default)]
    pub encoding: Encoding,
}

impl Default for TableFormat {
    fn default() -> Self {
        TableFormat {
            delimiter: default_delimiter(),
            encoding: Encoding::Utf8,
        }
    }
}

impl TableFormat {
    fn semicolon_latin1() -> Self {
        TableFormat {
            delimiter: ";".into(),
            encoding: Encoding::Latin1,
        }
    }

    /// The delimiter as a single byte. Validation guarantees this succeeds
    /// for loaded configs.
    pub fn delimiter_byte(&self) -> Option<u8> {
        match self.delimiter.as_bytes() {
            [b] if b.is_ascii() => Some(*b),
            _ => None,
        }
    }
}

fn default_delimiter() -> String {
    ",".into()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TieBreakChoice {
    #[default]
    FirstSeen,
    MostGames,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReconcileConfig {
    #[serde(default)]
    pub tie_break: TieBreakChoice,
    #[serde(default = "default_games_column")]
    pub games_column: String,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        ReconcileConfig {
            tie_break: TieBreakChoice::FirstSeen,
            games_column: default_games_column(),
        }
    }
}

impl ReconcileConfig {
    pub fn tie_break(&self) -> TieBreak {
        match self.tie_break {
            TieBreakChoice::FirstSeen => TieBreak::FirstSeen,
            TieBreakChoice::MostGames => TieBreak::MostGames {
                column: self.games_column.clone(),
            },
        }
    }
}

fn default_games_column() -> String {
    "G".into()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
    pub output_dir: String,
    #[serde(default = "default_histogram_bins")]
    pub histogram_bins: usize,
    #[serde(default = "default_scoring_stat")]
    pub scoring_stat: String,
}

fn default_histogram_bins() -> usize {
    20
}

fn default_scoring_stat() -> String {
    "PTS".into()
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate `config/analysis.toml` under `base_dir`.
///
/// Does not copy defaults; `load_config()` does.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join(CONFIG_FILE);
    let text = std::fs::read_to_string(&path).map_err(|_| ConfigError::FileNotFound {
        path: path.clone(),
    })?;
    let file: AnalysisFile = toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        source: e,
    })?;

    let config = Config {
        base_dir: base_dir.to_path_buf(),
        season: file.season.target.trim().to_string(),
        data_paths: file.data_paths,
        player_stats: file.player_stats,
        salaries: file.salaries,
        games: file.games,
        reconcile: file.reconcile,
        report: file.report,
    };

    validate(&config)?;
    Ok(config)
}

/// Copy files from `defaults/` into `config/` where they are missing.
/// Returns the files that were copied. `.example` files are skipped.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");
    let copy_err = |message: String| ConfigError::DefaultsCopyError { message };

    if !defaults_dir.exists() {
        if !config_dir.exists() {
            return Err(copy_err(format!(
                "neither defaults/ nor config/ directory found in {}",
                base_dir.display()
            )));
        }
        return Ok(vec![]);
    }

    std::fs::create_dir_all(&config_dir)
        .map_err(|e| copy_err(format!("failed to create config directory: {e}")))?;

    let entries = std::fs::read_dir(&defaults_dir)
        .map_err(|e| copy_err(format!("failed to read defaults directory: {e}")))?;

    let mut copied = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|e| copy_err(format!("failed to read defaults entry: {e}")))?
            .path();
        let Some(file_name) = path.file_name() else {
            continue;
        };
        if !path.is_file() || file_name.to_str().is_some_and(|n| n.ends_with(".example")) {
            continue;
        }

        let target = config_dir.join(file_name);
        if target.exists() {
            continue;
        }
        std::fs::copy(&path, &target)
            .map_err(|e| copy_err(format!("failed to copy {}: {e}", path.display())))?;
        copied.push(target);
    }

    Ok(copied)
}

/// Load config relative to the current working directory, copying defaults
/// first.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.to_string(),
        message: message.into(),
    }
}

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.season.is_empty() {
        return Err(invalid("season.target", "must not be empty"));
    }

    let paths: &[(&str, &str)] = &[
        ("data_paths.player_stats", config.data_paths.player_stats.as_str()),
        ("data_paths.salaries", config.data_paths.salaries.as_str()),
        ("data_paths.games", config.data_paths.games.as_str()),
    ];
    for (field, value) in paths {
        if value.trim().is_empty() {
            return Err(invalid(field, "must not be empty"));
        }
    }

    let formats: &[(&str, &TableFormat)] = &[
        ("player_stats.delimiter", &config.player_stats),
        ("salaries.delimiter", &config.salaries),
        ("games.delimiter", &config.games),
    ];
    for (field, format) in formats {
        if format.delimiter_byte().is_none() {
            return Err(invalid(
                field,
                format!("must be a single ASCII character, got {:?}", format.delimiter),
            ));
        }
    }

    if config.reconcile.tie_break == TieBreakChoice::MostGames
        && config.reconcile.games_column.trim().is_empty()
    {
        return Err(invalid(
            "reconcile.games_column",
            "must be set when tie_break = \"most_games\"",
        ));
    }

    if config.report.output_dir.trim().is_empty() {
        return Err(invalid("report.output_dir", "must not be empty"));
    }
    if config.report.histogram_bins == 0 {
        return Err(invalid("report.histogram_bins", "must be > 0"));
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn defaults_file() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("defaults")
            .join(CONFIG_FILE)
    }

    /// Fresh scratch dir with `config/analysis.toml` holding `text`.
    fn scratch_with_config(name: &str, text: &str) -> PathBuf {
        let tmp = std::env::temp_dir().join(name);
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("config")).unwrap();
        fs::write(tmp.join("config").join(CONFIG_FILE), text).unwrap();
        tmp
    }

    fn default_text() -> String {
        fs::read_to_string(defaults_file()).unwrap()
    }

    fn expect_validation_field(err: ConfigError, expected: &str) {
        match err {
            ConfigError::ValidationError { field, .. } => assert_eq!(field, expected),
            other => panic!("expected ValidationError, got: {other}"),
        }
    }

    #[test]
    fn load_defaults() {
        let tmp = scratch_with_config("hoopstat_config_defaults", &default_text());
        let config = load_config_from(&tmp).expect("defaults should load");

        assert_eq!(config.season, "2022-23");
        assert_eq!(config.player_stats.delimiter_byte(), Some(b';'));
        assert_eq!(config.player_stats.encoding, Encoding::Latin1);
        assert_eq!(config.salaries.delimiter_byte(), Some(b','));
        assert_eq!(config.salaries.encoding, Encoding::Utf8);
        assert_eq!(config.reconcile.tie_break(), TieBreak::FirstSeen);
        assert_eq!(config.report.histogram_bins, 20);
        assert_eq!(config.report.scoring_stat, "PTS");
        assert_eq!(config.output_dir(), tmp.join("visualizations_final"));
        assert_eq!(
            config.resolve(config.data_paths.salaries.as_str()),
            tmp.join("data/nba_salaries.csv")
        );

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn optional_sections_fall_back() {
        let text = r#"
[season]
target = "2021-22"

[data_paths]
player_stats = "stats.csv"
salaries = "salaries.csv"
games = "games.csv"

[report]
output_dir = "out"
"#;
        let tmp = scratch_with_config("hoopstat_config_minimal", text);
        let config = load_config_from(&tmp).unwrap();
        assert_eq!(config.player_stats.delimiter, ";");
        assert_eq!(config.player_stats.encoding, Encoding::Latin1);
        assert_eq!(config.games.delimiter, ",");
        assert_eq!(config.reconcile.games_column, "G");
        assert_eq!(config.report.histogram_bins, 20);
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn most_games_tie_break() {
        let text = default_text().replace(
            "tie_break = \"first_seen\"",
            "tie_break = \"most_games\"",
        );
        let tmp = scratch_with_config("hoopstat_config_most_games", &text);
        let config = load_config_from(&tmp).unwrap();
        assert_eq!(
            config.reconcile.tie_break(),
            TieBreak::MostGames { column: "G".into() }
        );
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn absolute_paths_pass_through() {
        let tmp = scratch_with_config("hoopstat_config_abs", &default_text());
        let config = load_config_from(&tmp).unwrap();
        let abs = std::env::temp_dir().join("x.csv");
        assert_eq!(config.resolve(abs.to_str().unwrap()), abs);
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_empty_season() {
        let text = default_text().replace("target = \"2022-23\"", "target = \"  \"");
        let tmp = scratch_with_config("hoopstat_config_empty_season", &text);
        expect_validation_field(load_config_from(&tmp).unwrap_err(), "season.target");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_multi_char_delimiter() {
        let text = default_text().replace("delimiter = \";\"", "delimiter = \";;\"");
        let tmp = scratch_with_config("hoopstat_config_bad_delim", &text);
        expect_validation_field(load_config_from(&tmp).unwrap_err(), "player_stats.delimiter");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_zero_bins() {
        let text = default_text().replace("histogram_bins = 20", "histogram_bins = 0");
        let tmp = scratch_with_config("hoopstat_config_zero_bins", &text);
        expect_validation_field(load_config_from(&tmp).unwrap_err(), "report.histogram_bins");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_unknown_encoding() {
        let text = default_text().replace("encoding = \"latin1\"", "encoding = \"ebcdic\"");
        let tmp = scratch_with_config("hoopstat_config_bad_encoding", &text);
        match load_config_from(&tmp).unwrap_err() {
            ConfigError::ParseError { path, .. } => assert!(path.ends_with(CONFIG_FILE)),
            other => panic!("expected ParseError, got: {other}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn parse_error_for_invalid_toml() {
        let tmp = scratch_with_config("hoopstat_config_invalid", "this is not valid [[[ toml");
        match load_config_from(&tmp).unwrap_err() {
            ConfigError::ParseError { path, .. } => assert!(path.ends_with(CONFIG_FILE)),
            other => panic!("expected ParseError, got: {other}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn file_not_found_when_missing() {
        let tmp = std::env::temp_dir().join("hoopstat_config_missing");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&tmp).unwrap();
        match load_config_from(&tmp).unwrap_err() {
            ConfigError::FileNotFound { path } => assert!(path.ends_with(CONFIG_FILE)),
            other => panic!("expected FileNotFound, got: {other}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_copies_and_skips() {
        let tmp = std::env::temp_dir().join("hoopstat_config_ensure");
        let _ = fs::remove_dir_all(&tmp);
        let defaults_dir = tmp.join("defaults");
        fs::create_dir_all(&defaults_dir).unwrap();
        fs::copy(defaults_file(), defaults_dir.join(CONFIG_FILE)).unwrap();
        fs::write(defaults_dir.join("local.toml.example"), "# example\n").unwrap();

        let copied = ensure_config_files(&tmp).unwrap();
        assert_eq!(copied.len(), 1);
        assert!(tmp.join("config").join(CONFIG_FILE).exists());
        assert!(!tmp.join("config/local.toml.example").exists());

        // existing files are left alone
        fs::write(tmp.join("config").join(CONFIG_FILE), "# custom\n").unwrap();
        assert!(ensure_config_files(&tmp).unwrap().is_empty());
        let content = fs::read_to_string(tmp.join("config").join(CONFIG_FILE)).unwrap();
        assert_eq!(content, "# custom\n");

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_errors_when_both_dirs_missing() {
        let tmp = std::env::temp_dir().join("hoopstat_config_both_missing");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&tmp).unwrap();
        match ensure_config_files(&tmp).unwrap_err() {
            ConfigError::DefaultsCopyError { message } => {
                assert!(message.contains("neither defaults/ nor config/"))
            }
            other => panic!("expected DefaultsCopyError, got: {other}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }
}
