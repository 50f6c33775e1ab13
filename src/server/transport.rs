//! Newline-delimited stdio transport
//!
//! Implements the framework's [`Transport`] over any buffered reader and
//! writer. Lines are read as raw bytes, so a message that is not UTF-8 or
//! not JSON gets a parse error and the session keeps going.

use super::backend::IndigoBackend;
use crate::error::{IndigoError, Result};
use async_trait::async_trait;
use pulseengine_mcp_auth::{AuthConfig, AuthenticationManager};
use pulseengine_mcp_protocol::{Error as ProtocolError, Request, Response};
use pulseengine_mcp_server::{GenericServerHandler, MiddlewareStack};
use pulseengine_mcp_transport::{RequestHandler, Transport, TransportError};
use serde_json::Value;
use std::sync::Arc;
use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Stdin, Stdout,
};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// JSON-RPC over newline-delimited frames
pub struct LineTransport<R, W> {
    reader: Mutex<R>,
    writer: Mutex<W>,
    running: bool,
}

impl LineTransport<BufReader<Stdin>, Stdout> {
    pub fn stdio() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
    }
}

impl<R, W> LineTransport<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader: Mutex::new(reader),
            writer: Mutex::new(writer),
            running: false,
        }
    }

    /// Recover the writer once the transport has stopped
    pub fn into_writer(self) -> W {
        self.writer.into_inner()
    }

    async fn serve(&mut self, handler: &RequestHandler) -> std::result::Result<(), TransportError> {
        let reader = self.reader.get_mut();
        let writer = self.writer.get_mut();
        let mut line = Vec::new();

        while self.running {
            line.clear();
            let read = reader
                .read_until(b'\n', &mut line)
                .await
                .map_err(|e| TransportError::Connection(format!("Failed to read input: {e}")))?;
            if read == 0 {
                debug!("Input closed");
                break;
            }

            let Some(response) = process_line(&line, handler).await else {
                continue;
            };

            let mut frame = serde_json::to_vec(&response)
                .map_err(|e| TransportError::Protocol(format!("Unencodable response: {e}")))?;
            frame.push(b'\n');
            writer
                .write_all(&frame)
                .await
                .map_err(|e| TransportError::Connection(format!("Failed to write output: {e}")))?;
            writer
                .flush()
                .await
                .map_err(|e| TransportError::Connection(format!("Failed to flush output: {e}")))?;
        }

        self.running = false;
        Ok(())
    }
}

#[async_trait]
impl<R, W> Transport for LineTransport<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn start(&mut self, handler: RequestHandler) -> std::result::Result<(), TransportError> {
        self.running = true;
        self.serve(&handler).await
    }

    async fn stop(&mut self) -> std::result::Result<(), TransportError> {
        self.running = false;
        Ok(())
    }

    async fn health_check(&self) -> std::result::Result<(), TransportError> {
        if self.running {
            Ok(())
        } else {
            Err(TransportError::Connection("Transport not running".to_string()))
        }
    }
}

fn parse_error(message: String) -> Response {
    Response {
        jsonrpc: "2.0".to_string(),
        id: Value::Null,
        result: None,
        error: Some(ProtocolError::parse_error(message)),
    }
}

/// Decode one frame and hand it to the handler.
///
/// Returns the response to write, if any. Notifications are handled but not
/// answered; messages without a method are client replies and are dropped.
async fn process_line(line: &[u8], handler: &RequestHandler) -> Option<Response> {
    let text = match std::str::from_utf8(line) {
        Ok(text) => text.trim(),
        Err(e) => {
            warn!("Received a message that is not UTF-8: {e}");
            return Some(parse_error(format!("Message is not valid UTF-8: {e}")));
        }
    };
    if text.is_empty() {
        return None;
    }

    let mut message: Value = match serde_json::from_str(text) {
        Ok(message) => message,
        Err(e) => {
            warn!("Received invalid JSON: {e}");
            return Some(parse_error(format!("Invalid JSON: {e}")));
        }
    };
    let Some(fields) = message.as_object_mut() else {
        return Some(parse_error("Expected a JSON-RPC object".to_string()));
    };

    if !fields.contains_key("method") {
        debug!(id = ?fields.get("id"), "Dropping message without a method");
        return None;
    }

    let is_notification = !fields.contains_key("id");
    if is_notification {
        fields.insert("id".to_string(), Value::Null);
    }

    let request: Request = match serde_json::from_value(message) {
        Ok(request) => request,
        Err(e) if is_notification => {
            debug!("Ignoring malformed notification: {e}");
            return None;
        }
        Err(e) => return Some(parse_error(format!("Malformed request: {e}"))),
    };

    let response = (handler)(request).await;
    (!is_notification).then_some(response)
}

/// Serve the backend on stdin/stdout until input closes
pub async fn serve_stdio(backend: IndigoBackend) -> Result<()> {
    let context = backend.context().clone();

    let auth_config = AuthConfig {
        enabled: false,
        ..Default::default()
    };
    let auth_manager = AuthenticationManager::new(auth_config)
        .await
        .map_err(|e| IndigoError::config(format!("Failed to initialize framework auth: {e}")))?;

    let handler =
        GenericServerHandler::new(Arc::new(backend), Arc::new(auth_manager), MiddlewareStack::new());

    info!("Serving {} tools over stdio", context.registry().len());
    let mut transport = LineTransport::stdio();
    let served = transport
        .start(Box::new(move |request| {
            let handler = handler.clone();
            Box::pin(async move {
                handler.handle_request(request).await.unwrap_or_else(|e| {
                    error!("Request handling error: {}", e);
                    Response {
                        jsonrpc: "2.0".to_string(),
                        id: Value::Null,
                        result: None,
                        error: Some(ProtocolError::internal_error(e.to_string())),
                    }
                })
            })
        }))
        .await;

    context.shutdown();
    served.map_err(|e| IndigoError::mcp(format!("stdio transport failed: {e}")))
}
