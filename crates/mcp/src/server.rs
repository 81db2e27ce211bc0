// JSON-RPC server over stdio. One request per line in, one response per
// line out; stderr is left to tracing.

use crate::protocol::{
    CallToolParams, InitializeResult, JsonRpcError, JsonRpcRequest, JsonRpcResponse,
    ListToolsResult, ServerCapabilities, ServerInfo, ToolsCapability, MCP_PROTOCOL_VERSION,
};
use crate::tools::ToolRegistry;
use anyhow::Result;
use futures::StreamExt;
use serde::Serialize;
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio_util::codec::{FramedRead, LinesCodec, LinesCodecError};

/// Upper bound on one request frame. Longer lines are discarded and
/// answered with a parse error instead of buffering without limit.
const MAX_FRAME_LEN: usize = 1024 * 1024;

pub struct McpServer {
    registry: ToolRegistry,
}

impl McpServer {
    pub fn new(registry: ToolRegistry) -> Self {
        Self { registry }
    }

    /// Serve requests from stdin until it closes.
    pub async fn run(self) -> Result<()> {
        self.serve(tokio::io::stdin(), tokio::io::stdout()).await
    }

    async fn serve<R, W>(&self, reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = FramedRead::new(reader, LinesCodec::new_with_max_length(MAX_FRAME_LEN));

        tracing::info!(
            tools = self.registry.list_schemas().len(),
            "MCP server listening on stdio"
        );

        while let Some(line) = lines.next().await {
            let line = match line {
                Ok(line) => line,
                Err(LinesCodecError::MaxLineLengthExceeded) => {
                    // The codec discards the rest of the line; the
                    // stream stays usable for the next frame.
                    tracing::warn!("dropping over-long frame");
                    let response =
                        JsonRpcResponse::failure(Value::Null, JsonRpcError::parse_error());
                    write_frame(&mut writer, &response).await?;
                    continue;
                }
                Err(LinesCodecError::Io(err)) => return Err(err.into()),
            };
            if line.trim().is_empty() {
                continue;
            }

            let response = match serde_json::from_str::<JsonRpcRequest>(&line) {
                Ok(request) => self.handle_request(request).await,
                Err(err) => {
                    tracing::warn!(error = %err, "received unparseable frame");
                    Some(JsonRpcResponse::failure(
                        Value::Null,
                        JsonRpcError::parse_error(),
                    ))
                }
            };

            if let Some(response) = response {
                write_frame(&mut writer, &response).await?;
            }
        }

        tracing::info!("stdin closed, shutting down");
        Ok(())
    }

    /// Handle one request. Notifications produce no response.
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if request.is_notification() {
            tracing::debug!(method = %request.method, "notification received");
            return None;
        }
        let id = request.id.clone().unwrap_or(Value::Null);
        tracing::debug!(method = %request.method, "handling request");

        let response = match request.method.as_str() {
            "initialize" => respond(id, self.initialize_result()),
            "ping" => JsonRpcResponse::success(id, serde_json::json!({})),
            "tools/list" => respond(
                id,
                ListToolsResult {
                    tools: self.registry.list_schemas(),
                },
            ),
            "tools/call" => {
                let params = request.params.unwrap_or(Value::Null);
                match serde_json::from_value::<CallToolParams>(params) {
                    Ok(params) => {
                        let result = self.registry.invoke(&params.name, params.arguments).await;
                        respond(id, result)
                    }
                    Err(err) => JsonRpcResponse::failure(
                        id,
                        JsonRpcError::invalid_params(format!("invalid tools/call params: {}", err)),
                    ),
                }
            }
            other => JsonRpcResponse::failure(id, JsonRpcError::method_not_found(other)),
        };
        Some(response)
    }

    fn initialize_result(&self) -> InitializeResult {
        InitializeResult {
            protocol_version: MCP_PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: ToolsCapability {
                    list_changed: false,
                },
            },
            server_info: ServerInfo {
                name: "tally-mcp".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        }
    }
}

async fn write_frame<W>(writer: &mut W, response: &JsonRpcResponse) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut frame = serde_json::to_string(response)?;
    frame.push('\n');
    writer.write_all(frame.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

fn respond(id: Value, result: impl Serialize) -> JsonRpcResponse {
    match serde_json::to_value(result) {
        Ok(value) => JsonRpcResponse::success(id, value),
        Err(err) => {
            tracing::error!(error = %err, "failed to serialize response");
            JsonRpcResponse::failure(
                id,
                JsonRpcError::internal_error("failed to serialize response"),
            )
        }
    }
}
