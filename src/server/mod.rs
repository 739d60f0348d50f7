// src/server/mod.rs

//! Remote-procedure transport: newline-delimited JSON-RPC 2.0 on a pair of
//! byte streams (stdin/stdout in production), exposing the job operations
//! as MCP-style tools.
//!
//! Each `tools/call` runs on its own Tokio task, so a long install never
//! blocks a concurrent status query. Responses are funnelled through a
//! single writer task to keep frames intact.

pub mod handler;
pub mod protocol;
pub mod tools;

use anyhow::{Context, Result};
use serde_json::{Value, json};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

pub use handler::{ToolHandler, ToolReply};
pub use protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};
pub use tools::Tool;

/// Protocol revision announced when the client does not ask for one.
pub const DEFAULT_PROTOCOL_VERSION: &str = "2024-11-05";

pub const SERVER_NAME: &str = "nodejob";

/// Serve requests from `input` until it reaches EOF.
///
/// In-flight tool calls are allowed to finish and their responses are
/// flushed before this returns.
pub async fn serve<R, W>(handler: ToolHandler, mut input: R, output: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (out_tx, out_rx) = mpsc::channel::<JsonRpcResponse>(64);
    let writer = tokio::spawn(write_responses(output, out_rx));

    let mut in_flight = JoinSet::new();
    let mut buf = Vec::new();

    info!("nodejob server ready");

    loop {
        buf.clear();
        match input.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                // The stream is unusable, but calls already accepted still
                // get their answers.
                warn!(error = %e, "reading request stream failed");
                break;
            }
        }

        // Reap finished calls so the set doesn't grow for the server's lifetime.
        while in_flight.try_join_next().is_some() {}

        let request = match decode_line(&buf) {
            Ok(Some(req)) => req,
            Ok(None) => continue,
            Err(err) => {
                warn!(error = %err.message, "unparseable request line");
                let _ = out_tx
                    .send(JsonRpcResponse::failure(Value::Null, err))
                    .await;
                continue;
            }
        };

        debug!(method = %request.method, id = ?request.id, "request received");

        if request.is_notification() {
            debug!(method = %request.method, "ignoring notification");
            continue;
        }
        let id = request.id.clone().unwrap_or(Value::Null);

        if request.jsonrpc != "2.0" {
            let _ = out_tx
                .send(JsonRpcResponse::failure(
                    id,
                    JsonRpcError::invalid_request("jsonrpc must be \"2.0\""),
                ))
                .await;
            continue;
        }

        match request.method.as_str() {
            "tools/call" => {
                let (name, arguments) = match tool_call_params(request.params) {
                    Ok(parts) => parts,
                    Err(err) => {
                        let _ = out_tx.send(JsonRpcResponse::failure(id, err)).await;
                        continue;
                    }
                };
                let handler = handler.clone();
                let tx = out_tx.clone();
                in_flight.spawn(async move {
                    let reply = handler.call(&name, arguments).await;
                    let _ = tx
                        .send(JsonRpcResponse::success(id, reply.to_value()))
                        .await;
                });
            }
            method => {
                let response = match immediate_result(method, request.params.as_ref()) {
                    Some(result) => JsonRpcResponse::success(id, result),
                    None => JsonRpcResponse::failure(id, JsonRpcError::method_not_found(method)),
                };
                let _ = out_tx.send(response).await;
            }
        }
    }

    info!("request stream closed; waiting for in-flight calls");
    while in_flight.join_next().await.is_some() {}

    drop(out_tx);
    writer.await.context("joining response writer")??;

    info!("nodejob server stopped");
    Ok(())
}

/// One raw frame to a request; blank lines yield `None`.
fn decode_line(raw: &[u8]) -> std::result::Result<Option<JsonRpcRequest>, JsonRpcError> {
    let line = std::str::from_utf8(raw).map_err(JsonRpcError::parse_error)?;
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    serde_json::from_str(line)
        .map(Some)
        .map_err(JsonRpcError::parse_error)
}

/// Answers for methods that don't touch the supervisor.
fn immediate_result(method: &str, params: Option<&Value>) -> Option<Value> {
    match method {
        "initialize" => {
            let version = params
                .and_then(|p| p.get("protocolVersion"))
                .and_then(Value::as_str)
                .unwrap_or(DEFAULT_PROTOCOL_VERSION);
            Some(json!({
                "protocolVersion": version,
                "capabilities": { "tools": {} },
                "serverInfo": {
                    "name": SERVER_NAME,
                    "version": env!("CARGO_PKG_VERSION"),
                }
            }))
        }
        "ping" => Some(json!({})),
        "tools/list" => Some(json!({
            "tools": Tool::ALL.iter().map(|t| t.descriptor()).collect::<Vec<_>>()
        })),
        _ => None,
    }
}

fn tool_call_params(params: Option<Value>) -> std::result::Result<(String, Value), JsonRpcError> {
    let params = params.ok_or_else(|| JsonRpcError::invalid_params("missing params"))?;
    let name = params
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| JsonRpcError::invalid_params("params.name must be a string"))?
        .to_string();
    let arguments = params.get("arguments").cloned().unwrap_or(Value::Null);
    Ok((name, arguments))
}

async fn write_responses<W>(mut output: W, mut rx: mpsc::Receiver<JsonRpcResponse>) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(response) = rx.recv().await {
        let mut frame = serde_json::to_string(&response).context("serializing response")?;
        frame.push('\n');
        output
            .write_all(frame.as_bytes())
            .await
            .context("writing response")?;
        output.flush().await.context("flushing response")?;
    }
    output.shutdown().await.context("closing response stream")?;
    Ok(())
}
