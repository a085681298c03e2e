/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 15/10/26
******************************************************************************/

//! Append-only log of raw FIX traffic and session events.
//!
//! One line per entry: `<UTC timestamp> <direction> <text>`. Frames are
//! written with SOH rendered as `|`.

use chrono::Utc;
use fixstatus_core::error::DeliveryError;
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

const SOH: u8 = 0x01;

/// Kind of log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogDirection {
    /// Frame received from the counterparty.
    Incoming,
    /// Frame sent to the counterparty.
    Outgoing,
    /// Session lifecycle event.
    Event,
}

impl fmt::Display for LogDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Incoming => "<==",
            Self::Outgoing => "==>",
            Self::Event => "===",
        })
    }
}

/// Shared append-only message log.
#[derive(Debug)]
pub struct MessageLog {
    path: PathBuf,
    file: Mutex<File>,
}

impl MessageLog {
    /// Opens (creating if needed) the log for appending.
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

    /// Records a frame read from the counterparty.
    ///
    /// # Errors
    /// Returns `DeliveryError::Io` if the entry could not be written.
    pub async fn incoming(&self, frame: &[u8]) -> Result<(), DeliveryError> {
        self.append(LogDirection::Incoming, &render_frame(frame)).await
    }

    /// Records a frame written to the counterparty.
    ///
    /// # Errors
    /// Returns `DeliveryError::Io` if the entry could not be written.
    pub async fn outgoing(&self, frame: &[u8]) -> Result<(), DeliveryError> {
        self.append(LogDirection::Outgoing, &render_frame(frame)).await
    }

    /// Records a session event.
    ///
    /// # Errors
    /// Returns `DeliveryError::Io` if the entry could not be written.
    pub async fn event(&self, text: &str) -> Result<(), DeliveryError> {
        self.append(LogDirection::Event, text).await
    }

    async fn append(&self, direction: LogDirection, text: &str) -> Result<(), DeliveryError> {
        let line = format!(
            "{} {direction} {}\n",
            Utc::now().format("%Y%m%d-%H:%M:%S%.3f"),
            text.trim_end_matches(['\r', '\n'])
        );
        let mut file = self.file.lock().await;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

fn render_frame(frame: &[u8]) -> String {
    frame
        .iter()
        .map(|&b| if b == SOH { '|' } else { char::from(b) })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(contents: &str) -> Vec<(String, String)> {
        contents
            .lines()
            .map(|line| {
                let mut parts = line.splitn(3, ' ');
                let stamp = parts.next().unwrap();
                assert_eq!(stamp.len(), 21, "{line}");
                (
                    parts.next().unwrap().to_string(),
                    parts.next().unwrap_or_default().to_string(),
                )
            })
            .collect()
    }

    #[tokio::test]
    async fn test_entries_in_call_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logfile.log");

        let log = MessageLog::open(&path).await.unwrap();
        log.event("connected to 127.0.0.1:9876").await.unwrap();
        log.outgoing(b"8=FIX.4.4\x019=5\x0135=A\x0110=000\x01")
            .await
            .unwrap();
        log.incoming(b"8=FIX.4.4\x019=5\x0135=0\x0110=000\x01")
            .await
            .unwrap();
        assert_eq!(log.path(), path.as_path());

        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(
            entries(&contents),
            vec![
                ("===".to_string(), "connected to 127.0.0.1:9876".to_string()),
                ("==>".to_string(), "8=FIX.4.4|9=5|35=A|10=000|".to_string()),
                ("<==".to_string(), "8=FIX.4.4|9=5|35=0|10=000|".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_reopen_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logfile.log");

        MessageLog::open(&path).await.unwrap().event("logon").await.unwrap();
        MessageLog::open(&path).await.unwrap().event("logout\n").await.unwrap();

        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        let events: Vec<_> = entries(&contents).into_iter().map(|(_, text)| text).collect();
        assert_eq!(events, vec!["logon", "logout"]);
    }

    #[tokio::test]
    async fn test_open_fails_for_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let err = MessageLog::open(dir.path().join("absent").join("logfile.log"))
            .await
            .unwrap_err();
        assert!(matches!(err, DeliveryError::Io(_)));
    }
}
