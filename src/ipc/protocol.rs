//! Wire format between the client and the daemon: one JSON object per line
//! over a Unix socket, one request per connection.

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

/// A single client command, sent once per connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    pub command: String,
    pub arguments: Vec<String>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub timeout: Option<u64>,
    #[serde(default)]
    pub verbose: bool,
}

/// The daemon's reply, after which it closes the connection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Response {
    pub stdout: String,
    pub stderr: String,
    #[serde(rename = "exitCode")]
    pub exit_code: i32,
}

impl Response {
    pub fn ok(stdout: String) -> Self {
        Self {
            stdout,
            stderr: String::new(),
            exit_code: 0,
        }
    }

    pub fn error(stderr: String, exit_code: i32) -> Self {
        Self {
            stdout: String::new(),
            stderr,
            exit_code,
        }
    }
}

/// Write one newline-terminated JSON frame.
pub async fn write_frame<W, T>(writer: &mut W, value: &T) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let mut bytes = serde_json::to_vec(value)?;
    bytes.push(b'\n');
    writer.write_all(&bytes).await?;
    writer.flush().await
}

/// Read one newline-terminated JSON frame. `Ok(None)` on clean EOF before
/// any bytes arrive.
pub async fn read_frame<R, T>(reader: &mut R) -> std::io::Result<Option<T>>
where
    R: AsyncBufRead + Unpin,
    T: serde::de::DeserializeOwned,
{
    let mut line = String::new();
    let n = reader.read_line(&mut line).await?;
    if n == 0 {
        return Ok(None);
    }
    let value = serde_json::from_str(line.trim_end())
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    Ok(Some(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn request_roundtrips_through_a_frame() {
        let request = Request {
            command: "search".to_string(),
            arguments: vec!["GameObject".to_string()],
            limit: Some(20),
            timeout: None,
            verbose: false,
        };
        let mut buf: Vec<u8> = Vec::new();
        write_frame(&mut buf, &request).await.unwrap();

        let mut reader = tokio::io::BufReader::new(std::io::Cursor::new(buf));
        let read_back: Request = read_frame(&mut reader).await.unwrap().unwrap();
        assert_eq!(read_back.command, "search");
        assert_eq!(read_back.arguments, vec!["GameObject".to_string()]);
    }

    #[tokio::test]
    async fn empty_stream_reads_as_none() {
        let mut reader = tokio::io::BufReader::new(std::io::Cursor::new(Vec::<u8>::new()));
        let frame: Option<Request> = read_frame(&mut reader).await.unwrap();
        assert!(frame.is_none());
    }
}
