/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 15/10/26
******************************************************************************/

//! # fixstatus Canonical
//!
//! Canonical structured representation of inbound application messages.
//!
//! This crate provides:
//! - **Schema**: [`CanonicalMessage`] and its enumerations
//! - **Converter**: [`convert`], a total function from an engine-native
//!   [`Message`](fixstatus_core::Message) to a [`CanonicalMessage`]
//! - **Codec**: a compact field-numbered binary encoding ([`encode`], [`decode`])
//!
//! ## Partial Results
//!
//! Conversion never fails. Fields that are absent or malformed on the wire stay
//! at their defaults and are reported through `tracing`.

pub mod codec;
pub mod converter;
pub mod schema;

pub use codec::{CodecError, decode, encode};
pub use converter::{CONTRA_BROKERS, FieldRule, Section, convert};
pub use schema::{CanonicalBody, CanonicalHeader, CanonicalMessage, ContraBroker, MessageKind, SideKind};
