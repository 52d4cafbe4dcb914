//! Line-delimited JSON-RPC 2.0 tool server over stdin/stdout.
//!
//! Speaks the small subset of the tool-server handshake that editor and agent
//! hosts expect: `initialize`, `ping`, `tools/list` and `tools/call`. Requests
//! are handled strictly one at a time against a single [`ReportContext`].

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::handlers::{ReportContext, Response};

pub const SERVER_NAME: &str = "covfix";
pub const PROTOCOL_VERSION: &str = "2024-11-05";

pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;

#[derive(Debug, Deserialize)]
struct RpcRequest {
    #[serde(default)]
    id: Option<Value>,
    method: String,
    #[serde(default)]
    params: Value,
}

#[derive(Debug, Serialize)]
struct RpcResponse {
    jsonrpc: &'static str,
    id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<RpcError>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

impl RpcError {
    fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ToolCall {
    name: String,
    #[serde(default)]
    arguments: Value,
}

/// Tool names and their descriptions, in the order they are advertised.
const TOOLS: &[(&str, &str)] = &[
    (
        "query",
        "Show the first defect in a category (checker name, case-insensitive).",
    ),
    (
        "fix",
        "Mark every defect in a category fixed, save the fixed report and return remediation prompts.",
    ),
    ("summary", "Count defects per category."),
];

fn tool_descriptors() -> Value {
    let tools: Vec<Value> = TOOLS
        .iter()
        .map(|(name, description)| {
            let schema = if *name == "summary" {
                json!({"type": "object", "properties": {}})
            } else {
                json!({
                    "type": "object",
                    "properties": {
                        "category": {
                            "type": "string",
                            "description": "Checker name to match, e.g. NULL_RETURNS"
                        }
                    },
                    "required": ["category"]
                })
            };
            json!({"name": name, "description": description, "inputSchema": schema})
        })
        .collect();
    json!({ "tools": tools })
}

pub struct ToolServer {
    ctx: ReportContext,
}

impl ToolServer {
    pub fn new(ctx: ReportContext) -> Self {
        Self { ctx }
    }

    pub fn context_mut(&mut self) -> &mut ReportContext {
        &mut self.ctx
    }

    /// Run a tool by name. Unknown tools and bad arguments are invalid-params errors.
    pub fn call_tool(&mut self, name: &str, arguments: &Value) -> std::result::Result<Response, RpcError> {
        match name {
            "query" => Ok(self.ctx.query(category_arg(arguments)?)),
            "fix" => Ok(self.ctx.fix(category_arg(arguments)?)),
            "summary" => Ok(self.ctx.summary()),
            other => Err(RpcError::new(INVALID_PARAMS, format!("unknown tool: {other}"))),
        }
    }

    /// Handle one raw input line. Returns the response line, or `None` for notifications.
    pub fn handle_line(&mut self, line: &str) -> Result<Option<String>> {
        let response = match serde_json::from_str::<Value>(line) {
            Err(e) => Some(error_response(
                Value::Null,
                RpcError::new(PARSE_ERROR, format!("parse error: {e}")),
            )),
            Ok(raw) => {
                let id = raw.get("id").cloned().unwrap_or(Value::Null);
                match serde_json::from_value::<RpcRequest>(raw) {
                    Err(e) => Some(error_response(
                        id,
                        RpcError::new(INVALID_REQUEST, format!("invalid request: {e}")),
                    )),
                    Ok(request) => self.handle_request(request),
                }
            }
        };

        response
            .map(|r| {
                serde_json::to_string(&r)
                    .map_err(|e| Error::Protocol(format!("failed to encode response: {e}")))
            })
            .transpose()
    }

    fn handle_request(&mut self, request: RpcRequest) -> Option<RpcResponse> {
        let Some(id) = request.id.filter(|id| !id.is_null()) else {
            debug!(method = %request.method, "notification");
            return None;
        };

        let result = self.dispatch(&request.method, request.params);
        Some(match result {
            Ok(value) => RpcResponse {
                jsonrpc: "2.0",
                id,
                result: Some(value),
                error: None,
            },
            Err(err) => {
                warn!(method = %request.method, code = err.code, error = %err.message, "request rejected");
                error_response(id, err)
            }
        })
    }

    fn dispatch(&mut self, method: &str, params: Value) -> std::result::Result<Value, RpcError> {
        match method {
            "initialize" => Ok(json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": { "tools": {} },
                "serverInfo": {
                    "name": SERVER_NAME,
                    "version": env!("CARGO_PKG_VERSION"),
                },
            })),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(tool_descriptors()),
            "tools/call" => {
                let call: ToolCall = serde_json::from_value(params).map_err(|e| {
                    RpcError::new(INVALID_PARAMS, format!("invalid tools/call params: {e}"))
                })?;
                info!(tool = %call.name, "tool call");
                let response = self.call_tool(&call.name, &call.arguments)?;
                Ok(json!({
                    "content": [{ "type": "text", "text": response.to_text() }],
                    "isError": response.is_error(),
                }))
            }
            other => Err(RpcError::new(
                METHOD_NOT_FOUND,
                format!("method not found: {other}"),
            )),
        }
    }
}

fn category_arg(arguments: &Value) -> std::result::Result<&str, RpcError> {
    arguments
        .get("category")
        .and_then(Value::as_str)
        .ok_or_else(|| RpcError::new(INVALID_PARAMS, "missing string argument `category`"))
}

fn error_response(id: Value, error: RpcError) -> RpcResponse {
    RpcResponse {
        jsonrpc: "2.0",
        id,
        result: None,
        error: Some(error),
    }
}

/// Serve requests from `reader` until EOF, writing one response line per request.
///
/// A line that is not valid UTF-8 gets a parse error with a null id. A response that
/// cannot be encoded is logged and skipped. Neither ends the loop.
pub async fn serve<R, W>(server: &mut ToolServer, mut reader: R, mut writer: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    info!("tool server ready");
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }

        let reply = match std::str::from_utf8(&buf) {
            Err(e) => {
                warn!(error = %e, "dropping input line that is not valid UTF-8");
                let response = error_response(
                    Value::Null,
                    RpcError::new(PARSE_ERROR, format!("parse error: invalid UTF-8: {e}")),
                );
                serde_json::to_string(&response)
                    .map(Some)
                    .map_err(|e| Error::Protocol(format!("failed to encode response: {e}")))
            }
            Ok(line) if line.trim().is_empty() => continue,
            Ok(line) => server.handle_line(line.trim_end()),
        };

        match reply {
            Ok(Some(out)) => {
                writer.write_all(out.as_bytes()).await?;
                writer.write_all(b"\n").await?;
                writer.flush().await?;
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "no response sent for input line"),
        }
    }

    info!("input closed, shutting down");
    Ok(())
}
