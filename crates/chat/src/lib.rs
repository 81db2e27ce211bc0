// Conversational host for the Tally todo tools: holds the dialogue,
// lets the model pick tools, executes them against the MCP surface,
// and returns the model's final reply.

pub mod client;
pub mod config;
pub mod error;
pub mod model;
pub mod orchestrator;
pub mod surface;

pub use client::{AnthropicClient, ModelClient, ModelReply};
pub use config::ChatConfig;
pub use error::ChatError;
pub use orchestrator::Orchestrator;
pub use surface::{InvocationOutcome, LocalSurface, StdioSurface, ToolSurface};
