mod anthropic_batch_client;
mod draft_assets;
mod filesystem_store;
mod result_writer;
pub mod variables_csv;

pub use anthropic_batch_client::{HttpBatchClient, HttpBatchClientFactory};
pub use draft_assets::{DraftStyle, message_template_draft, system_prompt_draft, welcome_text};
pub use filesystem_store::FilesystemStore;
pub use result_writer::{ResultWriter, Written};
