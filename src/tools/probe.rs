//! Local manifest-resolution helper over TCP
//!
//! One connection per request: a 1-byte length, the raw id bytes, then one
//! newline-terminated answer line. An empty answer means "nothing known".

use super::traits::ManifestProbe;
use crate::error::{Error, Result};
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::debug;

/// Probe that talks to a helper listening on a TCP address
pub struct TcpManifestProbe {
    address: String,
}

impl TcpManifestProbe {
    /// Create a probe for `address` (e.g. "127.0.0.1:20020")
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
        }
    }
}

#[async_trait]
impl ManifestProbe for TcpManifestProbe {
    async fn resolve(&self, track_id: &str) -> Result<Option<String>> {
        let len = u8::try_from(track_id.len())
            .map_err(|_| Error::Other(format!("track id too long for probe: {track_id}")))?;

        let mut stream = TcpStream::connect(&self.address).await?;
        stream.write_all(&[len]).await?;
        stream.write_all(track_id.as_bytes()).await?;
        stream.flush().await?;

        let mut line = String::new();
        BufReader::new(stream).read_line(&mut line).await?;
        let answer = line.trim();
        debug!(track_id, answer, "manifest probe answered");

        Ok((!answer.is_empty()).then(|| answer.to_string()))
    }
}
