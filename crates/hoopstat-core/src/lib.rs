// Player/salary reconciliation and team aggregation for season analysis.
//
// This crate holds no I/O: tables come in through `pipeline::TableProvider`
// and results go out through `report::ReportSink`.

pub mod error;
pub mod join;
pub mod key;
pub mod pipeline;
pub mod reconcile;
pub mod records;
pub mod report;
pub mod standings;
pub mod summary;

pub use error::PipelineError;
