/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 15/10/26
******************************************************************************/

//! Engine-facing capability traits.
//!
//! An engine drives an [`Application`] for every session event and message,
//! and exposes a [`SessionSender`] so outbound messages can be routed to a
//! session by identity.

use async_trait::async_trait;
use fixstatus_core::error::SendRejectedError;
use fixstatus_core::message::Message;
use fixstatus_core::types::SessionIdentity;
use thiserror::Error;

/// Reason for rejecting an inbound message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("rejected with code {code}: {text}")]
pub struct RejectReason {
    /// Rejection reason code (SessionRejectReason, tag 373).
    pub code: u32,
    /// Human-readable rejection text.
    pub text: String,
    /// Reference tag that caused the rejection.
    pub ref_tag: Option<u32>,
}

impl RejectReason {
    /// Creates a new rejection reason.
    #[must_use]
    pub fn new(code: u32, text: impl Into<String>) -> Self {
        Self {
            code,
            text: text.into(),
            ref_tag: None,
        }
    }

    /// Sets the reference tag.
    #[must_use]
    pub const fn with_ref_tag(mut self, tag: u32) -> Self {
        self.ref_tag = Some(tag);
        self
    }
}

/// Callback interface an engine invokes for session events and messages.
///
/// Callbacks for different sessions may run concurrently.
#[async_trait]
pub trait Application: Send + Sync {
    /// Called when a session is created.
    async fn on_create(&self, session: &SessionIdentity);

    /// Called on successful logon.
    async fn on_logon(&self, session: &SessionIdentity);

    /// Called on logout or disconnect.
    async fn on_logout(&self, session: &SessionIdentity);

    /// Called before an admin message (Logon, Heartbeat, ...) is sent.
    ///
    /// # Arguments
    /// * `message` - The message to be sent (mutable)
    /// * `session` - The session identity
    async fn to_admin(&self, message: &mut Message, session: &SessionIdentity);

    /// Called when an admin message is received.
    ///
    /// # Returns
    /// `Ok(())` to accept, `Err(RejectReason)` to reject.
    #[allow(clippy::wrong_self_convention)]
    async fn from_admin(
        &self,
        message: &Message,
        session: &SessionIdentity,
    ) -> Result<(), RejectReason>;

    /// Called before an application message is sent.
    async fn to_app(&self, message: &mut Message, session: &SessionIdentity);

    /// Called when an application message is received.
    ///
    /// # Returns
    /// `Ok(())` to accept, `Err(RejectReason)` to reject.
    #[allow(clippy::wrong_self_convention)]
    async fn from_app(
        &self,
        message: &Message,
        session: &SessionIdentity,
    ) -> Result<(), RejectReason>;
}

/// Sends a message on an established session.
#[async_trait]
pub trait SessionSender: Send + Sync {
    /// Sends `message` on the session named by `session`.
    ///
    /// # Errors
    /// Returns `SendRejectedError` if the session is unknown, not logged on,
    /// or the transport failed.
    async fn send_to_session(
        &self,
        message: Message,
        session: &SessionIdentity,
    ) -> Result<(), SendRejectedError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reject_reason() {
        let reason = RejectReason::new(5, "Value is incorrect").with_ref_tag(54);
        assert_eq!(reason.code, 5);
        assert_eq!(reason.ref_tag, Some(54));
        assert_eq!(reason.to_string(), "rejected with code 5: Value is incorrect");
    }
}
