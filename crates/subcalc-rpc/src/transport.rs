//! Line-delimited transports
//!
//! One JSON-RPC request per line in, one response per line out.

use crate::{Result, RpcError, RpcServer};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::info;

/// STDIO transport
///
/// Reads requests from stdin and writes responses to stdout.
pub struct StdioTransport {
    server: Arc<RpcServer>,
}

impl StdioTransport {
    /// Create new STDIO transport
    pub fn new(server: Arc<RpcServer>) -> Self {
        Self { server }
    }

    /// Serve stdin/stdout until EOF
    pub async fn run(&self) -> Result<()> {
        info!("serving JSON-RPC on stdio");
        let reader = BufReader::new(tokio::io::stdin());
        let writer = tokio::io::stdout();
        serve_lines(&self.server, reader, writer).await
    }
}

/// Serve requests from any line reader until EOF
pub async fn serve_lines<R, W>(server: &RpcServer, mut reader: R, mut writer: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut line = String::new();

    loop {
        line.clear();
        let n = reader
            .read_line(&mut line)
            .await
            .map_err(|e| RpcError::InternalError(e.to_string()))?;

        // EOF
        if n == 0 {
            break;
        }

        // Skip empty lines
        if line.trim().is_empty() {
            continue;
        }

        let response = server.handle_request(&line).await?;

        writer
            .write_all(response.as_bytes())
            .await
            .map_err(|e| RpcError::InternalError(e.to_string()))?;
        writer
            .write_all(b"\n")
            .await
            .map_err(|e| RpcError::InternalError(e.to_string()))?;
        writer
            .flush()
            .await
            .map_err(|e| RpcError::InternalError(e.to_string()))?;
    }

    Ok(())
}
