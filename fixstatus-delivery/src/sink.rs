/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 15/10/26
******************************************************************************/

//! Delivery targets.
//!
//! Sinks receive already-serialized payloads. A sink either preserves the
//! order it is called in ([`Sink::ordered`]) and is driven inline by the pump,
//! or it does not and may be called concurrently.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use fixstatus_core::error::DeliveryError;
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::debug;

/// Default connect and write deadline for [`TcpSink`].
pub const DEFAULT_NETWORK_TIMEOUT: Duration = Duration::from_secs(5);

/// Destination for serialized canonical messages.
#[async_trait]
pub trait Sink: Send + Sync + 'static {
    /// Forwards one payload.
    ///
    /// # Errors
    /// Returns `DeliveryError` if the payload could not be written.
    async fn deliver(&self, payload: Bytes) -> Result<(), DeliveryError>;

    /// Returns true if deliveries must happen one at a time in submission order.
    fn ordered(&self) -> bool {
        true
    }

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

/// Append-only file of length-prefixed records.
///
/// Each record is a big-endian `u32` payload length followed by the payload.
#[derive(Debug)]
pub struct FileSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl FileSink {
    /// Opens (creating if needed) the file for appending.
    ///
    /// # Errors
    /// Returns `DeliveryError::Io` if the file cannot be opened.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, DeliveryError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    /// Returns the file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl Sink for FileSink {
    async fn deliver(&self, payload: Bytes) -> Result<(), DeliveryError> {
        let len = u32::try_from(payload.len())
            .map_err(|_| DeliveryError::Io(format!("payload of {} bytes", payload.len())))?;
        let mut record = Vec::with_capacity(4 + payload.len());
        record.extend_from_slice(&len.to_be_bytes());
        record.extend_from_slice(&payload);

        let mut file = self.file.lock().await;
        file.write_all(&record).await?;
        file.flush().await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "file"
    }
}

/// Opens one TCP connection per payload, writes it, and closes.
#[derive(Debug, Clone)]
pub struct TcpSink {
    addr: String,
    connect_timeout: Duration,
    write_timeout: Duration,
}

impl TcpSink {
    /// Creates a sink for the given `host:port`.
    #[must_use]
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            connect_timeout: DEFAULT_NETWORK_TIMEOUT,
            write_timeout: DEFAULT_NETWORK_TIMEOUT,
        }
    }

    /// Sets the connect deadline.
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the write deadline.
    #[must_use]
    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    /// Returns the target address.
    #[must_use]
    pub fn addr(&self) -> &str {
        &self.addr
    }

    fn timed_out(&self, operation: &'static str, limit: Duration) -> DeliveryError {
        DeliveryError::Timeout {
            addr: self.addr.clone(),
            operation,
            elapsed_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

#[async_trait]
impl Sink for TcpSink {
    async fn deliver(&self, payload: Bytes) -> Result<(), DeliveryError> {
        let mut stream = timeout(self.connect_timeout, TcpStream::connect(&self.addr))
            .await
            .map_err(|_| self.timed_out("connect", self.connect_timeout))?
            .map_err(|e| DeliveryError::Connect {
                addr: self.addr.clone(),
                reason: e.to_string(),
            })?;

        timeout(self.write_timeout, async {
            stream.write_all(&payload).await?;
            stream.shutdown().await
        })
        .await
        .map_err(|_| self.timed_out("write", self.write_timeout))??;

        debug!(addr = %self.addr, bytes = payload.len(), "payload streamed");
        Ok(())
    }

    fn ordered(&self) -> bool {
        false
    }

    fn name(&self) -> &'static str {
        "tcp"
    }
}

/// The most recently delivered payload and when it arrived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedMessage {
    /// Serialized canonical message.
    pub payload: Bytes,
    /// Arrival time at the cache.
    pub captured_at: DateTime<Utc>,
}

/// In-process cache holding the latest payload.
#[derive(Debug, Default)]
pub struct LatestMessageCache {
    latest: RwLock<Option<CachedMessage>>,
}

impl LatestMessageCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the latest payload, if any.
    #[must_use]
    pub fn latest(&self) -> Option<CachedMessage> {
        self.latest.read().clone()
    }

    /// Replaces the cached payload.
    pub fn store(&self, payload: Bytes) {
        *self.latest.write() = Some(CachedMessage {
            payload,
            captured_at: Utc::now(),
        });
    }
}

#[async_trait]
impl Sink for LatestMessageCache {
    async fn deliver(&self, payload: Bytes) -> Result<(), DeliveryError> {
        self.store(payload);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "cache"
    }
}
