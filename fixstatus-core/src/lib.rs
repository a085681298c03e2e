/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 15/10/26
******************************************************************************/

//! # fixstatus Core
//!
//! Core types, wire message model, and error definitions shared by every
//! fixstatus crate.
//!
//! This crate provides:
//! - **Error types**: the bridge error taxonomy built with `thiserror`
//! - **Field types**: `FieldTag`, the owned `Field`, and the borrowed `FieldRef`
//! - **Message types**: `FieldMap`, `GroupTemplate`, and the engine-native `Message`
//! - **Session types**: `SessionIdentity` and `ConnectionStatus`
//!
//! ## Raw Values
//!
//! Field values are kept as raw bytes exactly as the engine delivered them.
//! Interpretation (UTF-8, numbers, enumerations) happens at the point of use,
//! so a single malformed value never prevents reading its neighbours.

pub mod error;
pub mod field;
pub mod message;
pub mod types;

pub use error::{
    BridgeError, ConfigurationError, DecodeError, DeliveryError, FieldExtractionError,
    RecordValidationError, Result, SendRejectedError,
};
pub use field::{Field, FieldRef, FieldTag, tags};
pub use message::{FieldMap, Group, GroupTemplate, Message};
pub use types::{ConnectionStatus, SessionIdentity};
