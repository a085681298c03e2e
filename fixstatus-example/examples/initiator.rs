//! FIX initiator wired to the fixstatus bridge.
//!
//! Connects to `FIXSTATUS_FIX_HOST:FIXSTATUS_FIX_PORT`, logs on, answers
//! heartbeats and test requests, and hands every inbound message to a
//! [`BridgeApplication`]. Once logged on, the coordinator sends the import
//! file to the session. The status service runs alongside until Ctrl-C.
//! Raw frames and session events go to `FIXSTATUS_MESSAGE_LOG`.

use anyhow::Context;
use async_trait::async_trait;
use bytes::BytesMut;
use fixstatus::core::{Message, SendRejectedError, SessionIdentity, tags};
use fixstatus::delivery::{FileSink, LatestMessageCache, MessageLog, Sink, TcpSink, spawn};
use fixstatus::engine::{
    ActiveSessionCoordinator, Application, BridgeApplication, BridgeConfig, RejectReason,
    SessionSender,
};
use fixstatus::session::SessionRegistry;
use fixstatus::status::{StatusState, serve};
use fixstatus::tagvalue::Encoder;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio::time::interval;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

mod common;
use common::{format_timestamp, init_logging, read_message};

/// Write side of the one session this initiator runs.
struct Session {
    identity: SessionIdentity,
    seq: AtomicU64,
    writer: Mutex<OwnedWriteHalf>,
    app: Arc<BridgeApplication>,
    log: Option<MessageLog>,
    validate_checksum: bool,
}

impl Session {
    /// Stamps the standard header, runs interception, and writes the frame.
    async fn send(&self, mut message: Message) -> std::io::Result<()> {
        message.header.set_str(tags::SENDER_COMP_ID, &self.identity.sender_comp_id);
        message.header.set_str(tags::TARGET_COMP_ID, &self.identity.target_comp_id);
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        message.header.set_str(tags::MSG_SEQ_NUM, &seq.to_string());
        message.header.set_str(tags::SENDING_TIME, &format_timestamp());

        if message.is_admin() {
            self.app.to_admin(&mut message, &self.identity).await;
        } else {
            self.app.to_app(&mut message, &self.identity).await;
        }

        let frame = Encoder::new(self.identity.begin_string.as_str()).encode(&message);
        self.writer.lock().await.write_all(&frame).await?;
        if let Some(log) = &self.log
            && let Err(e) = log.outgoing(&frame).await
        {
            warn!(error = %e, "message log write failed");
        }
        Ok(())
    }

    async fn record_incoming(&self, frame: &[u8]) {
        if let Some(log) = &self.log
            && let Err(e) = log.incoming(frame).await
        {
            warn!(error = %e, "message log write failed");
        }
    }

    async fn record_event(&self, text: &str) {
        if let Some(log) = &self.log
            && let Err(e) = log.event(text).await
        {
            warn!(error = %e, "message log write failed");
        }
    }
}

#[async_trait]
impl SessionSender for Session {
    async fn send_to_session(
        &self,
        message: Message,
        session: &SessionIdentity,
    ) -> Result<(), SendRejectedError> {
        if *session != self.identity {
            return Err(SendRejectedError::SessionNotFound {
                session: session.key(),
            });
        }
        if !self.app.registry().is_active(session) {
            return Err(SendRejectedError::SessionInactive {
                session: session.key(),
            });
        }
        self.send(message)
            .await
            .map_err(|e| SendRejectedError::Transport {
                session: session.key(),
                reason: e.to_string(),
            })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let config = BridgeConfig::from_env();
    let identity = config.session_identity();
    let registry = Arc::new(SessionRegistry::new());

    let cache = Arc::new(LatestMessageCache::new());
    let mut sinks: Vec<Arc<dyn Sink>> = vec![Arc::clone(&cache) as Arc<dyn Sink>];
    if let Some(path) = &config.sink_file {
        sinks.push(Arc::new(FileSink::open(path).await?));
    }
    if let Some(addr) = &config.sink_addr {
        sinks.push(Arc::new(TcpSink::new(addr.as_str())));
    }
    let (delivery, pump) = spawn(sinks, config.delivery.clone());
    let app = Arc::new(BridgeApplication::new(Arc::clone(&registry)).with_delivery(delivery));

    let token = CancellationToken::new();
    let listener = TcpListener::bind(&config.status_addr)
        .await
        .with_context(|| format!("binding status service to {}", config.status_addr))?;
    let status = tokio::spawn(serve(
        listener,
        StatusState::new(Arc::clone(&registry)).with_cache(cache),
        token.clone(),
    ));

    let log = match &config.message_log {
        Some(path) => Some(
            MessageLog::open(path)
                .await
                .with_context(|| format!("opening message log {}", path.display()))?,
        ),
        None => None,
    };

    app.on_create(&identity).await;
    info!(addr = %config.fix_addr(), session = %identity, "connecting");
    let stream = TcpStream::connect(config.fix_addr())
        .await
        .with_context(|| format!("connecting to {}", config.fix_addr()))?;
    let (reader, writer) = stream.into_split();
    let session = Arc::new(Session {
        identity: identity.clone(),
        seq: AtomicU64::new(1),
        writer: Mutex::new(writer),
        app: Arc::clone(&app),
        log,
        validate_checksum: config.validate_checksum,
    });
    session
        .record_event(&format!("connected to {} as {identity}", config.fix_addr()))
        .await;

    let mut logon = Message::with_msg_type("A");
    logon.body.set_str(tags::ENCRYPT_METHOD, "0");
    logon.body.set_str(tags::HEART_BT_INT, &config.heartbeat_interval.to_string());
    session.send(logon).await?;

    let coordinator = tokio::spawn(
        ActiveSessionCoordinator::new(
            Arc::clone(&registry),
            Arc::clone(&session),
            config.coordinator(),
        )
        .run(token.clone()),
    );

    let heartbeat = Duration::from_secs(config.heartbeat_interval.max(1));
    tokio::select! {
        result = read_loop(reader, &session) => {
            if let Err(e) = result {
                error!(error = %e, "session read failed");
            }
        }
        () = heartbeats(&session, heartbeat) => {}
        _ = tokio::signal::ctrl_c() => {
            info!("interrupted, logging out");
            if let Err(e) = session.send(Message::with_msg_type("5")).await {
                warn!(error = %e, "logout not sent");
            }
        }
    }
    app.on_logout(&identity).await;
    session.record_event("session closed").await;

    token.cancel();
    match coordinator.await? {
        Ok(outcome) => info!(
            session = ?outcome.session.map(|s| s.key()),
            sent = outcome.report.sent,
            rejected = outcome.report.rejected,
            send_failures = outcome.report.send_failures,
            reason = ?outcome.reason,
            "coordinator finished"
        ),
        Err(e) => error!(error = %e, "coordinator aborted"),
    }
    status.await??;

    drop(session);
    drop(app);
    pump.await?;
    info!("Done");
    Ok(())
}

async fn read_loop(mut reader: OwnedReadHalf, session: &Session) -> anyhow::Result<()> {
    let mut buf = BytesMut::with_capacity(4096);
    while let Some((frame, message)) =
        read_message(&mut reader, &mut buf, session.validate_checksum).await?
    {
        session.record_incoming(&frame).await;
        let seq = message.header.get_str(tags::MSG_SEQ_NUM).unwrap_or("0").to_string();

        let verdict = if message.is_admin() {
            session.app.from_admin(&message, &session.identity).await
        } else {
            session.app.from_app(&message, &session.identity).await
        };
        if let Err(reason) = verdict {
            session.send(reject(&seq, &reason)).await?;
            continue;
        }

        match message.msg_type() {
            Some("A") => {
                session.record_event("logon accepted").await;
                session.app.on_logon(&session.identity).await;
            }
            Some("1") => {
                let mut reply = Message::with_msg_type("0");
                if let Ok(id) = message.body.get_str(tags::TEST_REQ_ID) {
                    reply.body.set_str(tags::TEST_REQ_ID, id);
                }
                session.send(reply).await?;
            }
            Some("5") => {
                info!("logout received");
                session.record_event("logout received").await;
                session.send(Message::with_msg_type("5")).await?;
                return Ok(());
            }
            _ => {}
        }
    }
    info!("connection closed by peer");
    Ok(())
}

async fn heartbeats(session: &Session, period: Duration) {
    let mut ticker = interval(period);
    ticker.tick().await;
    loop {
        ticker.tick().await;
        if let Err(e) = session.send(Message::with_msg_type("0")).await {
            warn!(error = %e, "heartbeat not sent");
            return;
        }
    }
}

fn reject(ref_seq: &str, reason: &RejectReason) -> Message {
    let mut message = Message::with_msg_type("3");
    message.body.set_str(tags::REF_SEQ_NUM, ref_seq);
    if let Some(tag) = reason.ref_tag {
        message.body.set_str(tags::REF_TAG_ID, &tag.to_string());
    }
    message.body.set_str(tags::SESSION_REJECT_REASON, &reason.code.to_string());
    message.body.set_str(tags::TEXT, &reason.text);
    message
}
