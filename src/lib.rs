//! promptbatch: submit templated prompts as Anthropic message batches and
//! collect one result file per row.

pub mod app;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
pub(crate) mod testing;

pub use app::api::{
    ENV_DATA_DIR, RunOverrides, data_dir, fetch_at, resolve_config, serve, status_at, submit_at,
};
pub use domain::{
    AppError, BatchPhase, BatchStatus, FetchReport, OutputEncoding, RowError, SubmitReport,
};
