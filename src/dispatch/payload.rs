//! Wire contract of the workload function
//!
//! The emulator on the other end busy-spins for the requested duration and
//! reports what it achieved. Messages are JSON frames prefixed with a 4-byte
//! little-endian length:
//!
//! ```text
//! [4 bytes: payload length][N bytes: JSON payload]
//! ```
//!
//! Field names are part of the emulator contract and must not change.

use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::generator::RuntimeSpecification;
use crate::Result;

/// Upper bound on a single frame; anything larger indicates a corrupt stream
const MAX_FRAME_LEN: u32 = 1024 * 1024;

/// Request fired at the workload function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationRequest {
    #[serde(rename = "RuntimeInMilliSec")]
    pub runtime_in_milli_sec: u32,
    #[serde(rename = "MemoryInMebiBytes")]
    pub memory_in_mebi_bytes: u32,
}

impl From<RuntimeSpecification> for InvocationRequest {
    fn from(spec: RuntimeSpecification) -> Self {
        Self {
            runtime_in_milli_sec: spec.runtime_ms,
            memory_in_mebi_bytes: spec.memory_mib,
        }
    }
}

/// Response reported by the workload function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationResponse {
    #[serde(rename = "DurationInMicroSec")]
    pub duration_in_micro_sec: u32,
    #[serde(rename = "MemoryUsageInKb")]
    pub memory_usage_in_kb: u32,
}

/// Serialize a message into a length-prefixed frame
pub fn serialize_frame<T: Serialize>(message: &T) -> Result<Vec<u8>> {
    let payload = serde_json::to_vec(message).context("Failed to serialize frame")?;

    let len = payload.len() as u32;
    let mut framed = Vec::with_capacity(4 + payload.len());
    framed.extend_from_slice(&len.to_le_bytes());
    framed.extend_from_slice(&payload);
    Ok(framed)
}

/// Deserialize one message from a complete frame body
pub fn deserialize_frame<T: DeserializeOwned>(payload: &[u8]) -> Result<T> {
    serde_json::from_slice(payload).context("Failed to deserialize frame")
}

/// Write one frame to the stream
pub async fn write_frame<T: Serialize>(stream: &mut TcpStream, message: &T) -> Result<()> {
    let framed = serialize_frame(message)?;
    stream
        .write_all(&framed)
        .await
        .context("Failed to write frame")?;
    stream.flush().await.context("Failed to flush frame")?;
    Ok(())
}

/// Read one frame from the stream
pub async fn read_frame<T: DeserializeOwned>(stream: &mut TcpStream) -> Result<T> {
    let mut len_bytes = [0u8; 4];
    stream
        .read_exact(&mut len_bytes)
        .await
        .context("Failed to read frame length")?;
    let len = u32::from_le_bytes(len_bytes);
    if len > MAX_FRAME_LEN {
        anyhow::bail!("frame length {} exceeds maximum {}", len, MAX_FRAME_LEN);
    }

    let mut payload = vec![0u8; len as usize];
    stream
        .read_exact(&mut payload)
        .await
        .context("Failed to read frame body")?;
    deserialize_frame(&payload)
}
