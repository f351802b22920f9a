//! Model Context Protocol server over stdio.

mod handlers;
pub mod protocol;
mod resources;
mod server;
mod tools;

pub use handlers::{InvalidParams, ToolHandlers};
pub use server::McpServer;
