pub mod api;
pub mod cli;
pub mod commands;
mod context;
pub mod mcp;

pub use context::AppContext;
