/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 15/10/26
******************************************************************************/

//! # fixstatus
//!
//! A bridge between a FIX engine and downstream consumers.
//!
//! fixstatus tracks which FIX sessions are logged on, converts every inbound
//! application message into a canonical structured record, forwards those
//! records to one or more delivery targets, sends a tabular import of
//! outbound messages to the first active session, and answers status queries
//! over HTTP.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use fixstatus::prelude::*;
//! use std::sync::Arc;
//!
//! let registry = Arc::new(SessionRegistry::new());
//! let cache = Arc::new(LatestMessageCache::new());
//! let (delivery, _pump) = spawn(vec![cache.clone() as Arc<dyn Sink>], DeliveryConfig::default());
//! let app = BridgeApplication::new(registry.clone()).with_delivery(delivery);
//! // hand `app` to the engine, then:
//! let outcome = ActiveSessionCoordinator::new(registry, sender, CoordinatorConfig::new("orders.csv"))
//!     .run(token)
//!     .await?;
//! ```
//!
//! ## Crate Organization
//!
//! - [`core`]: Fields, messages, session identity, and error definitions
//! - [`tagvalue`]: tag=value framing, encoding, and decoding
//! - [`canonical`]: Canonical schema, converter, and binary codec
//! - [`session`]: Session connectivity registry
//! - [`delivery`]: Bounded asynchronous delivery to sinks
//! - [`import`]: Tabular import and outbound message construction
//! - [`engine`]: Engine callbacks, coordinator, and configuration
//! - [`status`]: Read-only HTTP status service

pub mod core {
    //! Fields, messages, session identity, and error definitions.
    pub use fixstatus_core::*;
}

pub mod tagvalue {
    //! tag=value framing, encoding, and decoding.
    pub use fixstatus_tagvalue::*;
}

pub mod canonical {
    //! Canonical schema, converter, and binary codec.
    pub use fixstatus_canonical::*;
}

pub mod session {
    //! Session connectivity registry.
    pub use fixstatus_session::*;
}

pub mod delivery {
    //! Bounded asynchronous delivery to sinks.
    pub use fixstatus_delivery::*;
}

pub mod import {
    //! Tabular import and outbound message construction.
    pub use fixstatus_import::*;
}

pub mod engine {
    //! Engine callbacks, coordinator, and configuration.
    pub use fixstatus_engine::*;
}

pub mod status {
    //! Read-only HTTP status service.
    pub use fixstatus_status::*;
}

/// Prelude module for convenient imports.
pub mod prelude {
    // Core types
    pub use fixstatus_core::{
        BridgeError, ConfigurationError, ConnectionStatus, DeliveryError, Field, FieldMap,
        FieldRef, FieldTag, Message, RecordValidationError, Result, SendRejectedError,
        SessionIdentity,
    };

    // Tag-value encoding
    pub use fixstatus_tagvalue::{Decoder, Encoder, try_frame};

    // Canonical
    pub use fixstatus_canonical::{CanonicalMessage, convert, decode, encode};

    // Session
    pub use fixstatus_session::{RegistrySnapshot, SessionRegistry};

    // Delivery
    pub use fixstatus_delivery::{
        DeliveryConfig, DeliveryHandle, FileSink, LatestMessageCache, MessageLog, OverflowPolicy,
        Sink, TcpSink, spawn,
    };

    // Import
    pub use fixstatus_import::{ImportRecord, OutboundBuilder, read_import};

    // Engine
    pub use fixstatus_engine::{
        ActiveSessionCoordinator, Application, BridgeApplication, BridgeConfig,
        CoordinatorConfig, CoordinatorOutcome, SessionSender,
    };

    // Status
    pub use fixstatus_status::{StatusState, serve};
}

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use std::sync::Arc;

    #[test]
    fn test_prelude_imports() {
        let registry = Arc::new(SessionRegistry::new());
        let id: SessionIdentity = "FIX.4.4:A->B".parse().unwrap();
        registry.set_connected(&id, true);
        assert_eq!(registry.snapshot().first_active(), Some("FIX.4.4:A->B"));

        let canonical = convert(&Message::with_msg_type("D"));
        assert_eq!(decode(&encode(&canonical)).unwrap(), canonical);
    }

    #[test]
    fn test_defaults() {
        assert_eq!(DeliveryConfig::default().overflow, OverflowPolicy::DropNewest);
        assert_eq!(BridgeConfig::default().fix_addr(), "127.0.0.1:9876");
    }
}
