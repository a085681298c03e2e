/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 15/10/26
******************************************************************************/

//! The bridge application.
//!
//! [`BridgeApplication`] keeps the [`SessionRegistry`] in step with the
//! engine's lifecycle callbacks and turns every inbound application message
//! into a canonical payload for the delivery dispatcher. Nothing in the
//! inbound path can reject a message: conversion and delivery failures are
//! logged and the callback still accepts.

use crate::application::{Application, RejectReason};
use async_trait::async_trait;
use fixstatus_canonical::{convert, encode};
use fixstatus_core::field::tags;
use fixstatus_core::message::Message;
use fixstatus_core::types::SessionIdentity;
use fixstatus_delivery::DeliveryHandle;
use fixstatus_session::SessionRegistry;
use std::sync::Arc;
use tracing::{debug, info, warn};

const LOGON: &str = "A";

/// [`Application`] implementation backing fixstatus.
#[derive(Debug, Clone)]
pub struct BridgeApplication {
    registry: Arc<SessionRegistry>,
    delivery: Option<DeliveryHandle>,
}

impl BridgeApplication {
    /// Creates a bridge that tracks sessions but forwards nothing.
    #[must_use]
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        Self {
            registry,
            delivery: None,
        }
    }

    /// Forwards inbound application messages to the given dispatcher.
    #[must_use]
    pub fn with_delivery(mut self, delivery: DeliveryHandle) -> Self {
        self.delivery = Some(delivery);
        self
    }

    /// Returns the shared registry.
    #[must_use]
    pub fn registry(&self) -> Arc<SessionRegistry> {
        Arc::clone(&self.registry)
    }
}

#[async_trait]
impl Application for BridgeApplication {
    async fn on_create(&self, session: &SessionIdentity) {
        self.registry.create(session);
        info!(%session, "session created");
    }

    async fn on_logon(&self, session: &SessionIdentity) {
        self.registry.set_connected(session, true);
        info!(%session, "session logged on");
    }

    async fn on_logout(&self, session: &SessionIdentity) {
        self.registry.set_connected(session, false);
        info!(%session, "session logged out");
    }

    async fn to_admin(&self, message: &mut Message, session: &SessionIdentity) {
        if message.msg_type() == Some(LOGON) {
            info!(%session, "sending logon");
        }
    }

    async fn from_admin(
        &self,
        _message: &Message,
        _session: &SessionIdentity,
    ) -> Result<(), RejectReason> {
        Ok(())
    }

    async fn to_app(&self, message: &mut Message, session: &SessionIdentity) {
        debug!(%session, %message, "sending application message");
    }

    async fn from_app(
        &self,
        message: &Message,
        session: &SessionIdentity,
    ) -> Result<(), RejectReason> {
        let canonical = convert(message);
        let payload = encode(&canonical);
        debug!(
            %session,
            msg_type = message.msg_type().unwrap_or_default(),
            seq = message.header.get_str(tags::MSG_SEQ_NUM).unwrap_or_default(),
            bytes = payload.len(),
            "inbound message converted"
        );

        if let Some(delivery) = &self.delivery
            && let Err(error) = delivery.submit(payload).await
        {
            warn!(%session, %error, "canonical message not forwarded");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fixstatus_canonical::{SideKind, decode};
    use fixstatus_delivery::{DeliveryConfig, LatestMessageCache, Sink, spawn};

    fn session() -> SessionIdentity {
        SessionIdentity::new("FIX.4.4", "CLIENT", "BROKER")
    }

    fn order() -> Message {
        let mut message = Message::with_msg_type("D");
        message.header.set_str(tags::SENDER_COMP_ID, "BROKER");
        message.header.set_str(tags::MSG_SEQ_NUM, "7");
        message.body.set_str(tags::SYMBOL, "AAPL");
        message.body.set_str(tags::SIDE, "1");
        message.body.set_str(tags::PRICE, "150.25");
        message
    }

    #[tokio::test]
    async fn test_lifecycle_updates_registry() {
        let registry = Arc::new(SessionRegistry::new());
        let app = BridgeApplication::new(Arc::clone(&registry));
        let id = session();

        app.on_create(&id).await;
        assert!(!registry.is_active(&id));
        app.on_logon(&id).await;
        assert!(registry.is_active(&id));
        app.on_logout(&id).await;
        assert!(!registry.is_active(&id));
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_from_app_forwards_canonical_payload() {
        let cache = Arc::new(LatestMessageCache::new());
        let (handle, pump) = spawn(
            vec![Arc::clone(&cache) as Arc<dyn Sink>],
            DeliveryConfig::default(),
        );
        let app = BridgeApplication::new(Arc::new(SessionRegistry::new())).with_delivery(handle);

        assert!(app.from_app(&order(), &session()).await.is_ok());
        drop(app);
        pump.await.unwrap();

        let cached = cache.latest().unwrap();
        let canonical = decode(&cached.payload).unwrap();
        assert_eq!(canonical.header.msg_seq_num, 7);
        assert_eq!(canonical.body.symbol, "AAPL");
        assert_eq!(canonical.body.side, SideKind::Buy);
        assert_eq!(canonical.body.price, 150.25);
    }

    #[tokio::test]
    async fn test_from_app_accepts_garbage() {
        let app = BridgeApplication::new(Arc::new(SessionRegistry::new()));
        let mut message = Message::with_msg_type("D");
        message.body.push(tags::PRICE, &b"\xFF\xFE"[..]);
        message.body.push(tags::NO_CONTRA_BROKERS, "x");
        message.body.push(tags::CONTRA_TRADER, "orphan");
        assert!(app.from_app(&message, &session()).await.is_ok());
        assert!(app.from_app(&Message::new(), &session()).await.is_ok());
    }

    #[tokio::test]
    async fn test_from_app_survives_closed_dispatcher() {
        let (handle, pump) = spawn(Vec::new(), DeliveryConfig::default().with_queue_capacity(1));
        let stats = handle.stats();
        pump.abort();
        let _ = pump.await;

        let app = BridgeApplication::new(Arc::new(SessionRegistry::new())).with_delivery(handle);
        assert!(app.from_app(&order(), &session()).await.is_ok());
        assert_eq!(stats.dropped(), 1);
    }

    #[tokio::test]
    async fn test_admin_callbacks_accept() {
        let app = BridgeApplication::new(Arc::new(SessionRegistry::new()));
        let mut logon = Message::with_msg_type("A");
        logon.body.set_str(tags::HEART_BT_INT, "30");
        app.to_admin(&mut logon, &session()).await;
        assert!(app.from_admin(&logon, &session()).await.is_ok());

        let mut outbound = Message::with_msg_type("D");
        outbound.body.push(tags::SYMBOL, "IBM");
        app.to_app(&mut outbound, &session()).await;
        assert_eq!(outbound.body.len(), 1);
    }
}
