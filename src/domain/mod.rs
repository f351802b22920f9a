pub mod batch;
pub mod configuration;
pub mod error;
pub mod output_encoding;
pub mod report;
pub mod request;
pub mod template;
pub mod variables;

pub use batch::{
    BatchManifest, BatchPhase, BatchResultEntry, BatchStatus, ManifestRow, RequestCounts,
    ResultOutcome, output_file_name,
};
pub use configuration::{
    ApiKey, BatchApiConfig, OutputConfig, PromptConfig, RunConfig, RunPaths, load_config,
    parse_config_content,
};
pub use error::AppError;
pub use output_encoding::{OutputEncoding, Unrepresentable};
pub use report::{FailedRow, FetchReport, RowError, SkippedRow, SubmitReport, WrittenFile};
pub use request::{BatchRequestItem, GenerationParams, SystemPrompt, build_request};
pub use template::{MessageTemplate, TemplateError};
pub use variables::{VariableRow, VariableTable, topic_table};
