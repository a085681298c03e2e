/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 15/10/26
******************************************************************************/

//! Active session coordinator.
//!
//! The coordinator is a single sequential control flow:
//!
//! ```text
//! WaitingForLogon -> Driving -> KeptAlive -> Terminated
//! ```
//!
//! It waits until some session is logged on, sends every import record to it
//! once, then watches that session until it drops. Every wait also observes a
//! [`CancellationToken`], which moves it straight to `Terminated`.

use crate::application::SessionSender;
use fixstatus_core::error::ConfigurationError;
use fixstatus_core::types::SessionIdentity;
use fixstatus_import::{ImportRecord, OutboundBuilder, read_import};
use fixstatus_session::SessionRegistry;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Coordinator timing and input.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    import_path: PathBuf,
    logon_poll_interval: Duration,
    keepalive_interval: Duration,
}

impl CoordinatorConfig {
    /// Creates a configuration reading the import from `import_path`.
    ///
    /// Logons are polled every 500ms and the driven session every 30s.
    #[must_use]
    pub fn new(import_path: impl Into<PathBuf>) -> Self {
        Self {
            import_path: import_path.into(),
            logon_poll_interval: Duration::from_millis(500),
            keepalive_interval: Duration::from_secs(30),
        }
    }

    /// Sets how often the registry is checked for a logged-on session.
    #[must_use]
    pub fn with_logon_poll_interval(mut self, interval: Duration) -> Self {
        self.logon_poll_interval = interval;
        self
    }

    /// Sets how often the driven session is re-checked after the batch.
    #[must_use]
    pub fn with_keepalive_interval(mut self, interval: Duration) -> Self {
        self.keepalive_interval = interval;
        self
    }

    /// Returns the import path.
    #[must_use]
    pub fn import_path(&self) -> &Path {
        &self.import_path
    }

    /// Returns the logon poll interval.
    #[must_use]
    pub const fn logon_poll_interval(&self) -> Duration {
        self.logon_poll_interval
    }

    /// Returns the keep-alive interval.
    #[must_use]
    pub const fn keepalive_interval(&self) -> Duration {
        self.keepalive_interval
    }
}

/// Coordinator states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorState {
    /// No session logged on yet.
    WaitingForLogon,
    /// Sending the import.
    Driving,
    /// Batch done, watching the session.
    KeptAlive,
    /// Control loop finished.
    Terminated,
}

impl fmt::Display for CoordinatorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::WaitingForLogon => "waiting-for-logon",
            Self::Driving => "driving",
            Self::KeptAlive => "kept-alive",
            Self::Terminated => "terminated",
        };
        f.write_str(name)
    }
}

/// Per-record outcome counts of one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Records built and accepted by the session.
    pub sent: usize,
    /// Records that failed validation.
    pub rejected: usize,
    /// Records built but refused by the session.
    pub send_failures: usize,
}

impl BatchReport {
    /// Returns the number of records processed.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.sent + self.rejected + self.send_failures
    }
}

/// Why the coordinator stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    /// The driven session logged out.
    SessionLost,
    /// The cancellation token fired.
    Cancelled,
}

/// Result of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorOutcome {
    /// The session that was driven, if a logon was ever seen.
    pub session: Option<SessionIdentity>,
    /// Batch counts; all zero if the batch never ran.
    pub report: BatchReport,
    /// Why the run ended.
    pub reason: TerminationReason,
}

/// Drives the outbound import against the first logged-on session.
pub struct ActiveSessionCoordinator<S: SessionSender> {
    registry: Arc<SessionRegistry>,
    sender: Arc<S>,
    builder: OutboundBuilder,
    config: CoordinatorConfig,
    state: CoordinatorState,
}

impl<S: SessionSender> ActiveSessionCoordinator<S> {
    /// Creates a coordinator in `WaitingForLogon`.
    #[must_use]
    pub fn new(registry: Arc<SessionRegistry>, sender: Arc<S>, config: CoordinatorConfig) -> Self {
        Self {
            registry,
            sender,
            builder: OutboundBuilder::new(),
            config,
            state: CoordinatorState::WaitingForLogon,
        }
    }

    /// Returns the current state.
    #[must_use]
    pub const fn state(&self) -> CoordinatorState {
        self.state
    }

    /// Runs the control loop to completion.
    ///
    /// # Errors
    /// Returns `ConfigurationError` if the active session key cannot be parsed
    /// back into an identity or the import cannot be read. Only this
    /// coordinator stops; sessions and the status service are unaffected.
    pub async fn run(
        mut self,
        token: CancellationToken,
    ) -> Result<CoordinatorOutcome, ConfigurationError> {
        info!(state = %self.state, "coordinator started");

        let Some(session) = self.wait_for_logon(&token).await? else {
            return Ok(self.terminate(None, BatchReport::default(), TerminationReason::Cancelled));
        };

        self.transition(CoordinatorState::Driving);
        let report = match self.drive(&session, &token).await {
            Ok(report) => report,
            Err(error) => {
                self.transition(CoordinatorState::Terminated);
                return Err(error);
            }
        };
        info!(
            %session,
            sent = report.sent,
            rejected = report.rejected,
            send_failures = report.send_failures,
            "batch complete"
        );
        if token.is_cancelled() {
            return Ok(self.terminate(Some(session), report, TerminationReason::Cancelled));
        }

        self.transition(CoordinatorState::KeptAlive);
        let reason = self.keep_alive(&session, &token).await;
        Ok(self.terminate(Some(session), report, reason))
    }

    async fn wait_for_logon(
        &self,
        token: &CancellationToken,
    ) -> Result<Option<SessionIdentity>, ConfigurationError> {
        loop {
            if let Some(key) = self.registry.snapshot().first_active() {
                let session = key.parse::<SessionIdentity>()?;
                info!(%session, "active session found");
                return Ok(Some(session));
            }
            tokio::select! {
                () = token.cancelled() => return Ok(None),
                () = sleep(self.config.logon_poll_interval) => {}
            }
        }
    }

    async fn drive(
        &self,
        session: &SessionIdentity,
        token: &CancellationToken,
    ) -> Result<BatchReport, ConfigurationError> {
        let records = load_import(&self.config.import_path).await?;
        let mut report = BatchReport::default();

        for record in &records {
            if token.is_cancelled() {
                warn!(
                    remaining = records.len() - report.total(),
                    "batch cancelled"
                );
                break;
            }

            let message = match self.builder.build(record) {
                Ok(message) => message,
                Err(error) => {
                    warn!(%error, "record skipped");
                    report.rejected += 1;
                    continue;
                }
            };

            info!(%session, row = record.row(), "attempting to send");
            let rendered = message.to_string();
            match self.sender.send_to_session(message, session).await {
                Ok(()) => {
                    info!(%session, message = %rendered, "message sent");
                    report.sent += 1;
                }
                Err(error) => {
                    warn!(%session, row = record.row(), %error, "send failed");
                    report.send_failures += 1;
                }
            }
        }

        Ok(report)
    }

    async fn keep_alive(
        &self,
        session: &SessionIdentity,
        token: &CancellationToken,
    ) -> TerminationReason {
        loop {
            if !self.registry.is_active(session) {
                info!(%session, "driven session lost");
                return TerminationReason::SessionLost;
            }
            tokio::select! {
                () = token.cancelled() => return TerminationReason::Cancelled,
                () = sleep(self.config.keepalive_interval) => {}
            }
        }
    }

    fn transition(&mut self, next: CoordinatorState) {
        info!(from = %self.state, to = %next, "coordinator state changed");
        self.state = next;
    }

    fn terminate(
        &mut self,
        session: Option<SessionIdentity>,
        report: BatchReport,
        reason: TerminationReason,
    ) -> CoordinatorOutcome {
        self.transition(CoordinatorState::Terminated);
        info!(?reason, "coordinator stopped");
        CoordinatorOutcome {
            session,
            report,
            reason,
        }
    }
}

/// Reads the import file on the blocking pool.
async fn load_import(path: &Path) -> Result<Vec<ImportRecord>, ConfigurationError> {
    let owned = path.to_path_buf();
    match tokio::task::spawn_blocking(move || read_import(owned)).await {
        Ok(result) => result,
        Err(e) => Err(ConfigurationError::ImportUnreadable {
            path: path.display().to_string(),
            reason: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use fixstatus_core::error::SendRejectedError;
    use fixstatus_core::field::tags;
    use fixstatus_core::message::Message;
    use parking_lot::Mutex;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const TICK: Duration = Duration::from_millis(10);

    #[derive(Default)]
    struct RecordingSender {
        sent: Mutex<Vec<(String, Message)>>,
        refuse_symbol: Option<&'static str>,
    }

    impl RecordingSender {
        fn sent(&self) -> Vec<(String, Message)> {
            self.sent.lock().clone()
        }
    }

    #[async_trait]
    impl SessionSender for RecordingSender {
        async fn send_to_session(
            &self,
            message: Message,
            session: &SessionIdentity,
        ) -> Result<(), SendRejectedError> {
            if let Some(symbol) = self.refuse_symbol
                && message.body.get_str(tags::SYMBOL).ok() == Some(symbol)
            {
                return Err(SendRejectedError::SessionInactive {
                    session: session.key(),
                });
            }
            self.sent.lock().push((session.key(), message));
            Ok(())
        }
    }

    fn import(rows: &[&str]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        for row in rows {
            writeln!(file, "{row}").unwrap();
        }
        file.flush().unwrap();
        file
    }

    fn config(path: &Path) -> CoordinatorConfig {
        CoordinatorConfig::new(path)
            .with_logon_poll_interval(TICK)
            .with_keepalive_interval(TICK)
    }

    fn id(sender: &str, target: &str) -> SessionIdentity {
        SessionIdentity::new("FIX.4.4", sender, target)
    }

    async fn wait_until(condition: impl Fn() -> bool) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while !condition() {
                sleep(TICK).await;
            }
        })
        .await
        .unwrap();
    }

    #[test]
    fn test_config_defaults() {
        let config = CoordinatorConfig::new("orders.csv");
        assert_eq!(config.import_path(), Path::new("orders.csv"));
        assert_eq!(config.logon_poll_interval(), Duration::from_millis(500));
        assert_eq!(config.keepalive_interval(), Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_batch_with_rejected_row_then_session_lost() {
        let file = import(&[
            "MsgType,SenderCompID,TargetCompID,55,54,38,44",
            "D,A,B,AAPL,1,100,150.25",
            ",A,B,MSFT,2,10,1",
        ]);
        let registry = Arc::new(SessionRegistry::new());
        let sender = Arc::new(RecordingSender::default());
        let session = id("A", "B");
        registry.set_connected(&session, true);

        let coordinator =
            ActiveSessionCoordinator::new(Arc::clone(&registry), Arc::clone(&sender), config(file.path()));
        assert_eq!(coordinator.state(), CoordinatorState::WaitingForLogon);
        let run = tokio::spawn(coordinator.run(CancellationToken::new()));

        wait_until(|| !sender.sent().is_empty()).await;
        registry.set_connected(&session, false);
        let outcome = run.await.unwrap().unwrap();

        assert_eq!(outcome.session, Some(session));
        assert_eq!(outcome.reason, TerminationReason::SessionLost);
        assert_eq!(
            outcome.report,
            BatchReport {
                sent: 1,
                rejected: 1,
                send_failures: 0
            }
        );

        let sent = sender.sent();
        assert_eq!(sent.len(), 1);
        let (key, message) = &sent[0];
        assert_eq!(key, "FIX.4.4:A->B");
        assert_eq!(message.msg_type(), Some("D"));
        assert_eq!(message.header.get_str(tags::SENDER_COMP_ID).unwrap(), "A");
        assert_eq!(message.body.get_str(tags::SYMBOL).unwrap(), "AAPL");
        assert_eq!(message.body.get_str(tags::SIDE).unwrap(), "1");
        assert_eq!(message.body.get_str(tags::ORDER_QTY).unwrap(), "100");
        assert_eq!(message.body.get_str(tags::PRICE).unwrap(), "150.25");
    }

    #[tokio::test]
    async fn test_waits_for_logon_and_picks_smallest_key() {
        let file = import(&["MsgType,SenderCompID,TargetCompID,55", "D,A,B,IBM"]);
        let registry = Arc::new(SessionRegistry::new());
        let sender = Arc::new(RecordingSender::default());
        let token = CancellationToken::new();

        registry.create(&id("A", "X"));
        let run = tokio::spawn(
            ActiveSessionCoordinator::new(Arc::clone(&registry), Arc::clone(&sender), config(file.path()))
                .run(token.clone()),
        );
        sleep(TICK * 3).await;
        assert!(sender.sent().is_empty());

        registry.set_connected(&id("C", "X"), true);
        registry.set_connected(&id("B", "X"), true);
        wait_until(|| !sender.sent().is_empty()).await;
        token.cancel();

        let outcome = run.await.unwrap().unwrap();
        assert_eq!(outcome.reason, TerminationReason::Cancelled);
        assert_eq!(outcome.report.sent, 1);
        let driven = outcome.session.unwrap();
        assert!(driven == id("B", "X") || driven == id("C", "X"));
        assert_eq!(sender.sent()[0].0, driven.key());
    }

    #[tokio::test]
    async fn test_tie_break_between_simultaneous_logons() {
        let file = import(&["MsgType,SenderCompID,TargetCompID", "0,A,B"]);
        let registry = Arc::new(SessionRegistry::new());
        let sender = Arc::new(RecordingSender::default());
        for sender_id in ["Z", "M", "K"] {
            registry.set_connected(&id(sender_id, "X"), true);
        }

        let token = CancellationToken::new();
        let run = tokio::spawn(
            ActiveSessionCoordinator::new(Arc::clone(&registry), Arc::clone(&sender), config(file.path()))
                .run(token.clone()),
        );
        wait_until(|| !sender.sent().is_empty()).await;
        token.cancel();

        let outcome = run.await.unwrap().unwrap();
        assert_eq!(outcome.session, Some(id("K", "X")));
        assert_eq!(sender.sent()[0].0, "FIX.4.4:K->X");
    }

    #[tokio::test]
    async fn test_cancel_while_waiting_for_logon() {
        let registry = Arc::new(SessionRegistry::new());
        let token = CancellationToken::new();
        let run = tokio::spawn(
            ActiveSessionCoordinator::new(
                registry,
                Arc::new(RecordingSender::default()),
                config(Path::new("unused.csv")),
            )
            .run(token.clone()),
        );
        sleep(TICK * 2).await;
        token.cancel();

        let outcome = run.await.unwrap().unwrap();
        assert_eq!(outcome.session, None);
        assert_eq!(outcome.report, BatchReport::default());
        assert_eq!(outcome.reason, TerminationReason::Cancelled);
    }

    #[tokio::test]
    async fn test_send_failures_do_not_stop_batch() {
        let file = import(&[
            "MsgType,SenderCompID,TargetCompID,55",
            "D,A,B,AAPL",
            "D,A,B,MSFT",
            "D,A,B,IBM",
        ]);
        let registry = Arc::new(SessionRegistry::new());
        let sender = Arc::new(RecordingSender {
            refuse_symbol: Some("MSFT"),
            ..RecordingSender::default()
        });
        let session = id("A", "B");
        registry.set_connected(&session, true);

        let run = tokio::spawn(
            ActiveSessionCoordinator::new(Arc::clone(&registry), Arc::clone(&sender), config(file.path()))
                .run(CancellationToken::new()),
        );
        wait_until(|| sender.sent().len() == 2).await;
        registry.set_connected(&session, false);

        let outcome = run.await.unwrap().unwrap();
        assert_eq!(outcome.report.sent, 2);
        assert_eq!(outcome.report.send_failures, 1);
        assert_eq!(outcome.report.total(), 3);
        let symbols: Vec<_> = sender
            .sent()
            .iter()
            .map(|(_, m)| m.body.get_str(tags::SYMBOL).unwrap().to_string())
            .collect();
        assert_eq!(symbols, ["AAPL", "IBM"]);
    }

    #[tokio::test]
    async fn test_malformed_identity_is_fatal() {
        let registry = Arc::new(SessionRegistry::new());
        registry.set_connected(&id("A:B", "C"), true);

        let err = ActiveSessionCoordinator::new(
            registry,
            Arc::new(RecordingSender::default()),
            config(Path::new("unused.csv")),
        )
        .run(CancellationToken::new())
        .await
        .unwrap_err();
        assert!(matches!(err, ConfigurationError::MalformedIdentity { .. }));
    }

    #[tokio::test]
    async fn test_unreadable_import_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let registry = Arc::new(SessionRegistry::new());
        registry.set_connected(&id("A", "B"), true);

        let err = ActiveSessionCoordinator::new(
            registry,
            Arc::new(RecordingSender::default()),
            config(&dir.path().join("missing.csv")),
        )
        .run(CancellationToken::new())
        .await
        .unwrap_err();
        assert!(matches!(err, ConfigurationError::ImportUnreadable { .. }));
    }

    #[tokio::test]
    async fn test_load_import_reads_off_runtime() {
        let file = import(&["MsgType,SenderCompID,TargetCompID,55", "D,A,B,AAPL", "D,A,B,MSFT"]);
        let records = load_import(file.path()).await.unwrap();
        assert_eq!(records.len(), 2);

        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.csv");
        match load_import(&missing).await {
            Err(ConfigurationError::ImportUnreadable { path, .. }) => {
                assert!(path.ends_with("missing.csv"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_state_display() {
        assert_eq!(CoordinatorState::WaitingForLogon.to_string(), "waiting-for-logon");
        assert_eq!(CoordinatorState::Terminated.to_string(), "terminated");
    }
}
