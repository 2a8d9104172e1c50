// Writes pipeline output to a folder: tables as CSV, chart requests as JSON.

use chrono::{DateTime, Utc};
use hoopstat_core::pipeline::MatchReport;
use hoopstat_core::report::{ChartRequest, ReportSink, Table};
use hoopstat_core::PipelineError;
use serde::Serialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Report sink rooted at an output directory, created on construction.
#[derive(Debug)]
pub struct FileReportSink {
    dir: PathBuf,
    written: Vec<PathBuf>,
}

fn report_err(path: &Path, e: impl std::fmt::Display) -> PipelineError {
    PipelineError::Report {
        message: format!("{}: {e}", path.display()),
    }
}

impl FileReportSink {
    pub fn create(dir: &Path) -> Result<Self, PipelineError> {
        std::fs::create_dir_all(dir).map_err(|e| report_err(dir, e))?;
        Ok(FileReportSink {
            dir: dir.to_path_buf(),
            written: Vec::new(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Every file written so far, in order.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    /// Write `run_summary.json`: season, timestamp and the match counts.
    pub fn write_summary(
        &mut self,
        season: &str,
        matches: &MatchReport,
        generated_at: DateTime<Utc>,
    ) -> Result<PathBuf, PipelineError> {
        #[derive(Serialize)]
        struct RunSummary<'a> {
            season: &'a str,
            generated_at: DateTime<Utc>,
            matches: &'a MatchReport,
        }
        let summary = RunSummary {
            season,
            generated_at,
            matches,
        };
        self.write_json("run_summary.json", &summary)
    }

    fn write_json<T: Serialize>(&mut self, file_name: &str, value: &T) -> Result<PathBuf, PipelineError> {
        let path = self.dir.join(file_name);
        let file = File::create(&path).map_err(|e| report_err(&path, e))?;
        serde_json::to_writer_pretty(file, value).map_err(|e| report_err(&path, e))?;
        debug!("wrote {}", path.display());
        self.written.push(path.clone());
        Ok(path)
    }
}

impl ReportSink for FileReportSink {
    fn emit_table(&mut self, table: &Table) -> Result<(), PipelineError> {
        let path = self.dir.join(format!("{}.csv", table.name));
        let mut wtr = csv::Writer::from_path(&path).map_err(|e| report_err(&path, e))?;
        wtr.write_record(&table.headers)
            .map_err(|e| report_err(&path, e))?;
        for row in &table.rows {
            wtr.write_record(row).map_err(|e| report_err(&path, e))?;
        }
        wtr.flush().map_err(|e| report_err(&path, e))?;
        debug!("wrote {} ({} rows)", path.display(), table.rows.len());
        self.written.push(path);
        Ok(())
    }

    fn emit_chart(&mut self, chart: &ChartRequest) -> Result<(), PipelineError> {
        self.write_json(&format!("{}.json", chart.name()), chart)
            .map(|_| ())
    }
}
