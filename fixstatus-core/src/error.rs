/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 15/10/26
******************************************************************************/

//! Error types for the fixstatus bridge.
//!
//! Every failure the bridge can observe is localized to the smallest unit it
//! affects: a single field, a single import record, a single delivery, a single
//! send, or (at most) one control flow. The enums below mirror those scopes.

use thiserror::Error;

/// Result type alias using [`BridgeError`] as the error type.
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Top-level error type for all fixstatus operations.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// A single field could not be extracted.
    #[error("field extraction error: {0}")]
    Field(#[from] FieldExtractionError),

    /// An import record failed validation.
    #[error("record validation error: {0}")]
    Record(#[from] RecordValidationError),

    /// A serialized message could not be delivered.
    #[error("delivery error: {0}")]
    Delivery(#[from] DeliveryError),

    /// Invalid configuration or unreadable input.
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// The engine refused to send a message.
    #[error("send rejected: {0}")]
    SendRejected(#[from] SendRejectedError),

    /// A tag=value frame could not be decoded.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// I/O error from an underlying resource.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure to read one field of a wire message.
///
/// Always non-fatal: the caller omits the field and carries on.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FieldExtractionError {
    /// The field is not present.
    #[error("missing field: tag {tag}")]
    Missing {
        /// The tag number of the missing field.
        tag: u32,
    },

    /// The field value is not valid UTF-8.
    #[error("invalid utf-8 in field: tag {tag}")]
    InvalidUtf8 {
        /// The tag number of the field.
        tag: u32,
    },

    /// The field value cannot be interpreted as the expected type.
    #[error("invalid value for tag {tag}: '{value}' ({reason})")]
    InvalidValue {
        /// The tag number of the field.
        tag: u32,
        /// The offending value, lossily decoded.
        value: String,
        /// Description of why the value is invalid.
        reason: String,
    },
}

/// Failure to turn one import record into an outbound message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecordValidationError {
    /// A required column is not present in the record.
    #[error("row {row}: missing required column '{column}'")]
    MissingColumn {
        /// 1-based data row number.
        row: usize,
        /// Name of the missing column.
        column: String,
    },

    /// A required column is present but empty.
    #[error("row {row}: required column '{column}' is empty")]
    EmptyColumn {
        /// 1-based data row number.
        row: usize,
        /// Name of the empty column.
        column: String,
    },
}

/// Failure to forward a serialized message to its sink.
///
/// Logged and dropped by the dispatcher; never retried.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    /// I/O failure while writing to the sink.
    #[error("sink i/o error: {0}")]
    Io(String),

    /// The network target could not be reached.
    #[error("failed to connect to {addr}: {reason}")]
    Connect {
        /// Target address.
        addr: String,
        /// Underlying reason.
        reason: String,
    },

    /// A network operation exceeded its deadline.
    #[error("{operation} to {addr} timed out after {elapsed_ms} milliseconds")]
    Timeout {
        /// Target address.
        addr: String,
        /// The operation that timed out (connect, write).
        operation: &'static str,
        /// Configured deadline in milliseconds.
        elapsed_ms: u64,
    },

    /// The delivery queue is full and the overflow policy drops messages.
    #[error("delivery queue full (capacity {capacity})")]
    QueueFull {
        /// Configured queue capacity.
        capacity: usize,
    },

    /// The delivery pipeline has shut down.
    #[error("delivery pipeline closed")]
    Closed,
}

impl From<std::io::Error> for DeliveryError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Fatal error for the control flow that hit it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// A session identity string does not match `version:sender->target`.
    #[error("malformed session identity '{value}': {reason}")]
    MalformedIdentity {
        /// The offending string.
        value: String,
        /// Which part of the grammar failed.
        reason: String,
    },

    /// The tabular import could not be read.
    #[error("unable to read import '{path}': {reason}")]
    ImportUnreadable {
        /// Path of the import file.
        path: String,
        /// Underlying reason.
        reason: String,
    },
}

/// The engine refused a send-to-session request.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SendRejectedError {
    /// The engine knows no session with this identity.
    #[error("session not found: {session}")]
    SessionNotFound {
        /// Canonical session key.
        session: String,
    },

    /// The session exists but is not logged on.
    #[error("session not active: {session}")]
    SessionInactive {
        /// Canonical session key.
        session: String,
    },

    /// The engine accepted the request but failed to hand it to the transport.
    #[error("transport failure on {session}: {reason}")]
    Transport {
        /// Canonical session key.
        session: String,
        /// Underlying reason.
        reason: String,
    },
}

/// Errors that occur while decoding a tag=value frame.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Message buffer is incomplete, need more data.
    #[error("incomplete message, need more data")]
    Incomplete,

    /// Invalid BeginString field (tag 8).
    #[error("invalid begin string: expected 8=FIX.x.y")]
    InvalidBeginString,

    /// Missing BodyLength field (tag 9).
    #[error("missing body length field (tag 9)")]
    MissingBodyLength,

    /// Invalid BodyLength value.
    #[error("invalid body length value")]
    InvalidBodyLength,

    /// Missing MsgType field (tag 35).
    #[error("missing msg type field (tag 35)")]
    MissingMsgType,

    /// Checksum mismatch between calculated and declared values.
    #[error("checksum mismatch: calculated {calculated}, declared {declared}")]
    ChecksumMismatch {
        /// Calculated checksum value.
        calculated: u8,
        /// Declared checksum value in message.
        declared: u8,
    },

    /// CheckSum (tag 10) is not three ASCII digits.
    #[error("invalid checksum format")]
    InvalidChecksum,
}
