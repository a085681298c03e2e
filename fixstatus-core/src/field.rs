/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 15/10/26
******************************************************************************/

//! Field types for engine-native FIX messages.
//!
//! This module provides:
//! - [`FieldTag`]: Type-safe wrapper for FIX field tag numbers
//! - [`Field`]: Owned tag/value pair stored inside a [`FieldMap`](crate::FieldMap)
//! - [`FieldRef`]: Borrowed view of a stored field with typed accessors
//! - [`tags`]: Tag numbers the bridge reads or writes

use crate::error::FieldExtractionError;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Tag numbers used by the bridge.
pub mod tags {
    /// BeginString.
    pub const BEGIN_STRING: u32 = 8;
    /// BodyLength.
    pub const BODY_LENGTH: u32 = 9;
    /// CheckSum.
    pub const CHECK_SUM: u32 = 10;
    /// ClOrdID.
    pub const CL_ORD_ID: u32 = 11;
    /// MsgSeqNum.
    pub const MSG_SEQ_NUM: u32 = 34;
    /// MsgType.
    pub const MSG_TYPE: u32 = 35;
    /// OrderQty.
    pub const ORDER_QTY: u32 = 38;
    /// Price.
    pub const PRICE: u32 = 44;
    /// RefSeqNum.
    pub const REF_SEQ_NUM: u32 = 45;
    /// SenderCompID.
    pub const SENDER_COMP_ID: u32 = 49;
    /// SendingTime.
    pub const SENDING_TIME: u32 = 52;
    /// Side.
    pub const SIDE: u32 = 54;
    /// Symbol.
    pub const SYMBOL: u32 = 55;
    /// TargetCompID.
    pub const TARGET_COMP_ID: u32 = 56;
    /// Text.
    pub const TEXT: u32 = 58;
    /// TransactTime.
    pub const TRANSACT_TIME: u32 = 60;
    /// EncryptMethod.
    pub const ENCRYPT_METHOD: u32 = 98;
    /// HeartBtInt.
    pub const HEART_BT_INT: u32 = 108;
    /// TestReqID.
    pub const TEST_REQ_ID: u32 = 112;
    /// ContraTrader.
    pub const CONTRA_TRADER: u32 = 337;
    /// RefTagID.
    pub const REF_TAG_ID: u32 = 371;
    /// SessionRejectReason.
    pub const SESSION_REJECT_REASON: u32 = 373;
    /// ContraBroker.
    pub const CONTRA_BROKER: u32 = 375;
    /// NoContraBrokers.
    pub const NO_CONTRA_BROKERS: u32 = 382;

    /// Standard header tags, used to split a flat frame into sections.
    pub const HEADER: &[u32] = &[
        8, 9, 35, 49, 56, 115, 128, 90, 91, 34, 50, 142, 57, 143, 116, 144, 129, 145, 43, 97, 52,
        122, 212, 213, 347, 369, 627, 628, 629, 630, 1128, 1129,
    ];

    /// Standard trailer tags.
    pub const TRAILER: &[u32] = &[93, 89, 10];

    /// Returns true if the tag belongs to the standard header.
    #[must_use]
    pub fn is_header(tag: u32) -> bool {
        HEADER.contains(&tag)
    }

    /// Returns true if the tag belongs to the standard trailer.
    #[must_use]
    pub fn is_trailer(tag: u32) -> bool {
        TRAILER.contains(&tag)
    }
}

/// FIX field tag number.
///
/// Tags are positive integers that identify fields within a FIX message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
#[serde(transparent)]
pub struct FieldTag(u32);

impl FieldTag {
    /// Creates a new field tag.
    #[inline]
    #[must_use]
    pub const fn new(tag: u32) -> Self {
        Self(tag)
    }

    /// Returns the raw tag number.
    #[inline]
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }

    /// Returns true if this is a usable tag number (> 0).
    #[inline]
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 > 0
    }
}

impl FromStr for FieldTag {
    type Err = std::num::ParseIntError;

    /// Parses a tag from its decimal representation, e.g. an import column name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u32>().map(Self)
    }
}

impl From<u32> for FieldTag {
    fn from(tag: u32) -> Self {
        Self(tag)
    }
}

impl From<FieldTag> for u32 {
    fn from(tag: FieldTag) -> Self {
        tag.0
    }
}

impl fmt::Display for FieldTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Owned field: a tag and its raw value bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// The field tag number.
    pub tag: u32,
    /// Raw value bytes, without delimiters.
    pub value: Bytes,
}

impl Field {
    /// Creates a new owned field.
    #[must_use]
    pub fn new(tag: u32, value: impl Into<Bytes>) -> Self {
        Self {
            tag,
            value: value.into(),
        }
    }

    /// Returns a borrowed view of this field.
    #[inline]
    #[must_use]
    pub fn view(&self) -> FieldRef<'_> {
        FieldRef::new(self.tag, &self.value)
    }
}

/// Borrowed reference to a field value.
///
/// All accessors report failures as [`FieldExtractionError`] so callers can
/// decide to omit the field instead of aborting.
#[derive(Debug, Clone, Copy)]
pub struct FieldRef<'a> {
    /// The field tag number.
    pub tag: u32,
    /// Reference to the value bytes.
    pub value: &'a [u8],
}

impl<'a> FieldRef<'a> {
    /// Creates a new field reference.
    #[inline]
    #[must_use]
    pub const fn new(tag: u32, value: &'a [u8]) -> Self {
        Self { tag, value }
    }

    /// Returns the value as a string slice.
    ///
    /// # Errors
    /// Returns `FieldExtractionError::InvalidUtf8` if the value is not valid UTF-8.
    pub fn as_str(&self) -> Result<&'a str, FieldExtractionError> {
        std::str::from_utf8(self.value)
            .map_err(|_| FieldExtractionError::InvalidUtf8 { tag: self.tag })
    }

    /// Parses the value as the specified type.
    ///
    /// # Errors
    /// Returns `FieldExtractionError` if the value is not UTF-8 or fails to parse.
    pub fn parse<T: FromStr>(&self) -> Result<T, FieldExtractionError> {
        let s = self.as_str()?;
        s.trim().parse().map_err(|_| FieldExtractionError::InvalidValue {
            tag: self.tag,
            value: s.to_string(),
            reason: format!("expected {}", std::any::type_name::<T>()),
        })
    }

    /// Returns the value as a u64.
    ///
    /// # Errors
    /// Returns `FieldExtractionError::InvalidValue` if the value is not a valid integer.
    pub fn as_u64(&self) -> Result<u64, FieldExtractionError> {
        self.parse()
    }

    /// Returns the value as a finite f64.
    ///
    /// `NaN` and infinities parse successfully in Rust but are never valid FIX
    /// quantities or prices, so they are rejected here.
    ///
    /// # Errors
    /// Returns `FieldExtractionError::InvalidValue` if the value is not a finite number.
    pub fn as_f64(&self) -> Result<f64, FieldExtractionError> {
        let value: f64 = self.parse()?;
        if value.is_finite() {
            Ok(value)
        } else {
            Err(FieldExtractionError::InvalidValue {
                tag: self.tag,
                value: String::from_utf8_lossy(self.value).into_owned(),
                reason: "non-finite number".to_string(),
            })
        }
    }

    /// Returns the raw bytes of the value.
    #[inline]
    #[must_use]
    pub const fn as_bytes(&self) -> &'a [u8] {
        self.value
    }

    /// Returns true if the value is empty.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}
