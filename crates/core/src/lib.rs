// Core types and functionality for Tally, an in-memory todo manager
// exposed to AI assistants through MCP tools.

pub mod store;
pub mod types;

pub use store::{SharedTodoStore, StoreError, TodoStore};
pub use types::*;
