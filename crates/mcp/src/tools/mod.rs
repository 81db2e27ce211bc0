// Tool trait, registry, and schema helpers.

pub mod todo;

use crate::failure::ToolFailure;
use crate::protocol::{CallToolResult, ToolSchema};
use anyhow::Result;
use std::collections::HashMap;
use std::sync::Arc;

pub use todo::{todo_registry, CreateTodoTool, DeleteTodoTool, ListTodosTool, UpdateTodoTool};

/// An independently invocable, schema-described action.
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    /// The schema advertised for this tool.
    fn schema(&self) -> ToolSchema;

    /// Execute the tool. Expected failures (validation, missing ids)
    /// come back as error results; `Err` is reserved for genuinely
    /// unexpected conditions and is converted to a generic internal
    /// failure by the registry.
    async fn execute(&self, arguments: serde_json::Value) -> Result<CallToolResult>;
}

/// Registry of available tools, preserving registration order for
/// `tools/list`.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    order: Vec<String>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
            order: Vec::new(),
        }
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.schema().name;
        if !self.tools.contains_key(&name) {
            self.order.push(name.clone());
        }
        self.tools.insert(name, tool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn list_schemas(&self) -> Vec<ToolSchema> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|t| t.schema())
            .collect()
    }

    /// Dispatch an invocation by name. Never returns a raw error: an
    /// unknown name becomes a not-found failure result, and an
    /// unexpected tool error becomes a generic internal failure.
    pub async fn invoke(&self, name: &str, arguments: serde_json::Value) -> CallToolResult {
        let Some(tool) = self.get(name) else {
            return ToolFailure::not_found(format!("unknown tool: {}", name)).into_result();
        };

        match tool.execute(arguments).await {
            Ok(result) => result,
            Err(err) => {
                tracing::error!(tool = name, error = %err, "tool execution failed unexpectedly");
                ToolFailure::internal().into_result()
            }
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// Helpers for assembling input schemas.

pub fn json_schema_object(
    properties: serde_json::Value,
    required: &[&str],
) -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": properties,
        "required": required
    })
}

pub fn json_schema_string(description: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "string",
        "description": description
    })
}

pub fn json_schema_integer(description: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "integer",
        "description": description
    })
}

pub fn json_schema_boolean(description: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "boolean",
        "description": description
    })
}

pub fn json_schema_enum(values: &[&str], description: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "string",
        "enum": values,
        "description": description
    })
}
