use crate::domain::RunConfig;
use crate::ports::RunStore;

/// Application context holding dependencies for command execution.
pub struct AppContext<S: RunStore> {
    store: S,
    config: RunConfig,
}

impl<S: RunStore> AppContext<S> {
    /// Create a new application context.
    pub fn new(store: S, config: RunConfig) -> Self {
        Self { store, config }
    }

    /// Get a reference to the run store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Get a reference to the effective run configuration.
    pub fn config(&self) -> &RunConfig {
        &self.config
    }
}
