mod batch_client;
mod run_store;

pub use batch_client::{BatchClient, BatchClientFactory};
pub use run_store::{RunStore, StoreEntry};
