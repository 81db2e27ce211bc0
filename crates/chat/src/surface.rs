//! The tool surface as the orchestrator sees it: a catalog of tool
//! definitions and a way to invoke one. Two implementations, one
//! wrapping a registry in-process and one speaking JSON-RPC to a
//! spawned MCP server over its pipes.

use crate::error::ChatError;
use crate::model::ToolDefinition;
use serde_json::Value;
use std::process::Stdio;
use tally_mcp::protocol::{
    CallToolResult, JsonRpcRequest, JsonRpcResponse, ListToolsResult, ToolSchema,
    MCP_PROTOCOL_VERSION,
};
use tally_mcp::tools::ToolRegistry;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;

/// The result of one tool invocation, already flattened to what the
/// model gets to see.
#[derive(Debug, Clone)]
pub struct InvocationOutcome {
    pub content: String,
    pub is_error: bool,
}

impl InvocationOutcome {
    fn from_call_result(result: CallToolResult) -> Self {
        Self {
            content: result.text_content(),
            is_error: result.is_failure(),
        }
    }

    fn error(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: true,
        }
    }
}

pub fn definition_from_schema(schema: ToolSchema) -> ToolDefinition {
    ToolDefinition {
        name: schema.name,
        description: schema.description,
        input_schema: schema.input_schema,
    }
}

/// Named, schema-described actions offered to the model.
///
/// `invoke` is infallible by design: anything that goes wrong becomes
/// an error outcome fed back into the conversation, so the model can
/// recover instead of the turn crashing.
#[async_trait::async_trait]
pub trait ToolSurface: Send + Sync {
    fn catalog(&self) -> Vec<ToolDefinition>;

    async fn invoke(&self, name: &str, input: Value) -> InvocationOutcome;
}

/// In-process surface over a tool registry. Used by tests and by
/// embedders that do not want a child process.
pub struct LocalSurface {
    registry: ToolRegistry,
}

impl LocalSurface {
    pub fn new(registry: ToolRegistry) -> Self {
        Self { registry }
    }
}

#[async_trait::async_trait]
impl ToolSurface for LocalSurface {
    fn catalog(&self) -> Vec<ToolDefinition> {
        self.registry
            .list_schemas()
            .into_iter()
            .map(definition_from_schema)
            .collect()
    }

    async fn invoke(&self, name: &str, input: Value) -> InvocationOutcome {
        InvocationOutcome::from_call_result(self.registry.invoke(name, input).await)
    }
}

/// Surface backed by an MCP server child process on stdio.
pub struct StdioSurface {
    conn: Mutex<StdioConnection>,
    tools: Vec<ToolDefinition>,
}

struct StdioConnection {
    // Held so the child is killed when the surface drops.
    _child: Child,
    stdin: ChildStdin,
    lines: Lines<BufReader<ChildStdout>>,
    next_id: u64,
}

impl StdioConnection {
    async fn send(&mut self, request: &JsonRpcRequest) -> Result<(), ChatError> {
        let mut frame = serde_json::to_string(request)?;
        frame.push('\n');
        self.stdin
            .write_all(frame.as_bytes())
            .await
            .map_err(|e| ChatError::Surface(format!("failed to write to tool server: {}", e)))?;
        self.stdin
            .flush()
            .await
            .map_err(|e| ChatError::Surface(format!("failed to flush to tool server: {}", e)))?;
        Ok(())
    }

    async fn request(&mut self, method: &str, params: Option<Value>) -> Result<Value, ChatError> {
        let id = self.next_id;
        self.next_id += 1;
        self.send(&JsonRpcRequest::new(id, method, params)).await?;

        loop {
            let line = self
                .lines
                .next_line()
                .await
                .map_err(|e| ChatError::Surface(format!("failed to read from tool server: {}", e)))?
                .ok_or_else(|| ChatError::Surface("tool server closed the connection".to_string()))?;
            if line.trim().is_empty() {
                continue;
            }

            let response: JsonRpcResponse = match serde_json::from_str(&line) {
                Ok(response) => response,
                Err(err) => {
                    tracing::warn!(error = %err, "skipping unparseable frame from tool server");
                    continue;
                }
            };
            if response.id != Value::from(id) {
                tracing::debug!("skipping response for a different request id");
                continue;
            }

            if let Some(error) = response.error {
                return Err(ChatError::Surface(format!(
                    "tool server error {}: {}",
                    error.code, error.message
                )));
            }
            return Ok(response.result.unwrap_or(Value::Null));
        }
    }

    async fn notify(&mut self, method: &str) -> Result<(), ChatError> {
        self.send(&JsonRpcRequest::notification(method)).await
    }
}

impl StdioSurface {
    /// Launch the server, run the initialize handshake, and fetch the
    /// tool catalog.
    pub async fn connect(command: &str, args: &[String]) -> Result<Self, ChatError> {
        let mut child = Command::new(command)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                ChatError::Surface(format!("failed to launch tool server '{}': {}", command, e))
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| ChatError::Surface("tool server stdin unavailable".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ChatError::Surface("tool server stdout unavailable".to_string()))?;

        let mut conn = StdioConnection {
            _child: child,
            stdin,
            lines: BufReader::new(stdout).lines(),
            next_id: 1,
        };

        let init = conn
            .request(
                "initialize",
                Some(serde_json::json!({
                    "protocolVersion": MCP_PROTOCOL_VERSION,
                    "capabilities": {},
                    "clientInfo": {
                        "name": "tally",
                        "version": env!("CARGO_PKG_VERSION"),
                    },
                })),
            )
            .await?;
        conn.notify("notifications/initialized").await?;

        let listed: ListToolsResult = serde_json::from_value(conn.request("tools/list", None).await?)?;
        let tools: Vec<ToolDefinition> = listed
            .tools
            .into_iter()
            .map(definition_from_schema)
            .collect();

        tracing::info!(
            server = init["serverInfo"]["name"].as_str().unwrap_or("unknown"),
            tools = tools.len(),
            "connected to tool server"
        );

        Ok(Self {
            conn: Mutex::new(conn),
            tools,
        })
    }
}

#[async_trait::async_trait]
impl ToolSurface for StdioSurface {
    fn catalog(&self) -> Vec<ToolDefinition> {
        self.tools.clone()
    }

    async fn invoke(&self, name: &str, input: Value) -> InvocationOutcome {
        let params = serde_json::json!({ "name": name, "arguments": input });
        let mut conn = self.conn.lock().await;

        match conn.request("tools/call", Some(params)).await {
            Ok(value) => match serde_json::from_value::<CallToolResult>(value) {
                Ok(result) => InvocationOutcome::from_call_result(result),
                Err(err) => InvocationOutcome::error(format!("malformed tool result: {}", err)),
            },
            Err(err) => InvocationOutcome::error(format!("tool call failed: {}", err)),
        }
    }
}
