//! MCP over stdin/stdout.
//!
//! rmcp owns the session. Input lines are screened before they reach it: a line
//! that is not a client message gets a JSON-RPC error frame written back, and
//! the session keeps going. stdout carries protocol frames only.

use anyhow::Context;
use rmcp::{
    ServiceExt,
    model::{ClientJsonRpcMessage, ErrorCode, ErrorData},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::{
    io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, DuplexStream},
    sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel},
};
use tracing::{debug, info, warn};

use crate::server::WeatherServer;

const BRIDGE_CAPACITY: usize = 64 * 1024;

/// Methods this server answers; a malformed call to one of them is a params problem.
const SERVED_METHODS: &[&str] = &[
    "initialize",
    "ping",
    "tools/list",
    "tools/call",
    "resources/list",
    "resources/templates/list",
    "resources/read",
];

/// Serve the process's stdin/stdout until EOF or Ctrl-C.
pub async fn run(server: WeatherServer) -> anyhow::Result<()> {
    info!("Weather MCP server running on stdio");

    tokio::select! {
        served = serve(server, tokio::io::stdin(), tokio::io::stdout()) => served,
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted, shutting down");
            Ok(())
        }
    }
}

pub async fn serve<R, W>(server: WeatherServer, input: R, output: W) -> anyhow::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let (session_io, bridge) = tokio::io::duplex(BRIDGE_CAPACITY);
    let (from_session, to_session) = tokio::io::split(bridge);
    let (frames, pending) = unbounded_channel();
    let rejections = frames.clone();

    let session = async move {
        let mut session = Box::pin(run_session(server, session_io));
        let mut screening = Box::pin(screen_input(input, to_session, rejections));

        let outcome = tokio::select! {
            // The session ended on its own; stop reading input.
            ended = &mut session => ended,
            screened = &mut screening => match screened {
                Ok(()) => session.await,
                Err(e) => Err(e),
            },
        };
        drop(screening);
        outcome
    };

    let (served, forwarded, written) =
        tokio::join!(session, forward_output(from_session, frames), write_frames(pending, output));

    served.and(forwarded).and(written)
}

async fn run_session(server: WeatherServer, io: DuplexStream) -> anyhow::Result<()> {
    let service = server
        .serve(tokio::io::split(io))
        .await
        .inspect_err(|e| warn!(error = %e, "MCP session failed to start"))?;

    let reason = service.waiting().await.context("MCP session task failed")?;
    info!(?reason, "MCP session ended");
    Ok(())
}

/// Pass client messages on to the session; answer everything else directly.
async fn screen_input<R, W>(input: R, mut session: W, rejections: UnboundedSender<String>) -> anyhow::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut reader = BufReader::new(input);
    let mut line = Vec::new();

    loop {
        line.clear();
        let read = reader.read_until(b'\n', &mut line).await.context("Failed to read from stdin")?;
        if read == 0 {
            info!("Stdin closed, shutting down");
            break;
        }

        match screen(&line) {
            Screened::Blank => {}
            Screened::Forward(message) => {
                session.write_all(message.as_bytes()).await.context("Failed to hand message to session")?;
                session.write_all(b"\n").await.context("Failed to hand message to session")?;
                session.flush().await.context("Failed to hand message to session")?;
            }
            Screened::Reject(frame) => {
                warn!(%frame, "rejected input line");
                if rejections.send(frame).is_err() {
                    break;
                }
            }
            Screened::Ignore => debug!("ignored malformed notification"),
        }
    }

    session.shutdown().await.context("Failed to close session input")?;
    Ok(())
}

async fn forward_output<R: AsyncRead + Unpin>(from_session: R, frames: UnboundedSender<String>) -> anyhow::Result<()> {
    let mut lines = BufReader::new(from_session).lines();

    while let Some(line) = lines.next_line().await.context("Failed to read session output")? {
        if frames.send(line).is_err() {
            break;
        }
    }
    Ok(())
}

/// Single writer, so frames never interleave.
async fn write_frames<W: AsyncWrite + Unpin>(mut pending: UnboundedReceiver<String>, mut output: W) -> anyhow::Result<()> {
    while let Some(frame) = pending.recv().await {
        output.write_all(frame.as_bytes()).await.context("Failed to write to stdout")?;
        output.write_all(b"\n").await.context("Failed to write to stdout")?;
        output.flush().await.context("Failed to flush stdout")?;
    }
    Ok(())
}

#[derive(Debug, PartialEq)]
enum Screened<'a> {
    Blank,
    Forward(&'a str),
    Reject(String),
    Ignore,
}

fn screen(line: &[u8]) -> Screened<'_> {
    let Ok(text) = std::str::from_utf8(line) else {
        return Screened::Reject(error_frame(
            Value::Null,
            ErrorData::new(ErrorCode::PARSE_ERROR, "Parse error: input is not valid UTF-8", None),
        ));
    };

    let text = text.trim();
    if text.is_empty() {
        return Screened::Blank;
    }

    let value: Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(e) => {
            return Screened::Reject(error_frame(
                Value::Null,
                ErrorData::new(ErrorCode::PARSE_ERROR, format!("Parse error: {e}"), None),
            ));
        }
    };

    // An absent id marks a notification; an explicit null is an invalid request, not one.
    let id = value.get("id");
    if id.is_some_and(|id| !(id.is_string() || id.is_number())) {
        return Screened::Reject(error_frame(
            Value::Null,
            ErrorData::invalid_request("Invalid Request: id must be a string or a number", None),
        ));
    }
    if ClientJsonRpcMessage::deserialize(&value).is_ok() {
        return Screened::Forward(text);
    }

    let Some(message) = value.as_object() else {
        return Screened::Reject(error_frame(
            Value::Null,
            ErrorData::invalid_request("Invalid Request: expected a JSON-RPC object", None),
        ));
    };
    let Some(id) = id else {
        return Screened::Ignore;
    };

    let error = match message.get("method").and_then(Value::as_str) {
        None => ErrorData::invalid_request("Invalid Request: missing method", None),
        Some(method) if SERVED_METHODS.contains(&method) => {
            ErrorData::invalid_params(format!("Invalid params for {method}"), None)
        }
        Some(method) => ErrorData::new(ErrorCode::METHOD_NOT_FOUND, format!("Method not found: {method}"), None),
    };
    Screened::Reject(error_frame(id.clone(), error))
}

fn error_frame(id: Value, error: ErrorData) -> String {
    json!({ "jsonrpc": "2.0", "id": id, "error": error }).to_string()
}
