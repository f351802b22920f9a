mod fake_batch_client;
mod memory_run_store;

pub use fake_batch_client::FakeBatchClient;
pub use memory_run_store::MemoryRunStore;
