//! Content-Length framing for LSP messages over a child process's stdio.
//!
//! A single reusable reader that works over any `AsyncBufRead`, plus a
//! matching writer over any `AsyncWrite`.

use anyhow::{Context, Result};
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Read one framed LSP message: a `Content-Length:` header, a blank line,
/// then exactly that many body bytes. Returns `Ok(None)` on clean EOF
/// before any header bytes are read.
pub async fn read_message<R>(reader: &mut R) -> Result<Option<Value>>
where
    R: AsyncBufRead + Unpin,
{
    let mut content_length: Option<usize> = None;
    loop {
        let mut line = String::new();
        let bytes_read = reader
            .read_line(&mut line)
            .await
            .context("reading LSP header line")?;
        if bytes_read == 0 {
            return Ok(None);
        }
        let trimmed = line.trim();
        if trimmed.is_empty() {
            break;
        }
        if let Some(value) = trimmed.strip_prefix("Content-Length:") {
            content_length = Some(
                value
                    .trim()
                    .parse::<usize>()
                    .context("parsing Content-Length")?,
            );
        }
    }

    let content_length = content_length.context("LSP message missing Content-Length header")?;
    let mut body = vec![0u8; content_length];
    reader
        .read_exact(&mut body)
        .await
        .context("reading LSP message body")?;

    let value: Value = serde_json::from_slice(&body).context("parsing LSP message JSON")?;
    Ok(Some(value))
}

/// Read a framed message with a deadline; `Ok(None)` means a clean EOF,
/// and the timeout is surfaced to the caller as an error so it can be
/// mapped to `CliError::LspTransport`.
pub async fn read_message_timeout<R>(
    reader: &mut R,
    timeout: std::time::Duration,
) -> Result<Option<Value>>
where
    R: AsyncBufRead + Unpin,
{
    tokio::time::timeout(timeout, read_message(reader))
        .await
        .context("timed out waiting for LSP message")?
}

/// Serialize `value` and write it with a `Content-Length` header.
pub async fn write_message<W>(writer: &mut W, value: &Value) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let body = serde_json::to_vec(value).context("serializing LSP message")?;
    let header = format!("Content-Length: {}\r\n\r\n", body.len());
    writer
        .write_all(header.as_bytes())
        .await
        .context("writing LSP header")?;
    writer
        .write_all(&body)
        .await
        .context("writing LSP body")?;
    writer.flush().await.context("flushing LSP writer")?;
    Ok(())
}

/// Drain an async reader's stderr lines, tagging clangd's own `I/W/E/F`
/// leveled log lines (e.g. `I[11:01:38.638] clangd version 21.1.0`) to the
/// matching `log` level.
pub async fn pipe_clangd_stderr<R>(stderr: R)
where
    R: AsyncRead + Unpin,
{
    let mut lines = tokio::io::BufReader::new(stderr).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let trimmed = line.trim();
        match parse_clangd_log_line(trimmed) {
            Some(('I', rest)) => log::info!("[clangd] {rest}"),
            Some(('W', rest)) => log::warn!("[clangd] {rest}"),
            Some(('E', rest)) => log::error!("[clangd] {rest}"),
            Some(('F', rest)) => log::error!("[clangd] FATAL: {rest}"),
            _ => log::debug!("[clangd] {trimmed}"),
        }
    }
}

fn parse_clangd_log_line(line: &str) -> Option<(char, &str)> {
    if line.len() >= 15 {
        let level = line.chars().next()?;
        Some((level, line[15..].trim()))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn write_then_read_roundtrips() {
        let value = json!({"jsonrpc": "2.0", "id": 1, "method": "initialize"});
        let mut buf: Vec<u8> = Vec::new();
        write_message(&mut buf, &value).await.unwrap();

        let mut reader = tokio::io::BufReader::new(std::io::Cursor::new(buf));
        let read_back = read_message(&mut reader).await.unwrap().unwrap();
        assert_eq!(read_back, value);
    }

    #[tokio::test]
    async fn clean_eof_before_header_returns_none() {
        let mut reader = tokio::io::BufReader::new(std::io::Cursor::new(Vec::<u8>::new()));
        let result = read_message(&mut reader).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn missing_content_length_errors() {
        let mut reader =
            tokio::io::BufReader::new(std::io::Cursor::new(b"X-Custom: 1\r\n\r\n".to_vec()));
        assert!(read_message(&mut reader).await.is_err());
    }

    #[test]
    fn parses_clangd_log_line() {
        let line = "I[11:01:38.638] clangd version 21.1.0";
        assert_eq!(
            parse_clangd_log_line(line),
            Some(('I', "clangd version 21.1.0"))
        );
    }
}
