// MCP (Model Context Protocol) surface for the Tally todo store.
// Exposes the store's operations as schema-described tools over
// JSON-RPC on stdio, with the tool documentation supplied by a
// swappable catalog.

pub mod catalog;
pub mod failure;
pub mod protocol;
pub mod server;
pub mod tools;

pub use catalog::{ActionDocs, DocsProfile, ToolCatalog};
pub use failure::{FailureKind, ToolFailure};
pub use server::McpServer;
pub use tools::{todo_registry, Tool, ToolRegistry};
