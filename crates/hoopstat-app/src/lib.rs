// Library root: configuration, CSV input and file output for the `hoopstat`
// binary, exposed for integration tests.

pub mod config;
pub mod loader;
pub mod output;
