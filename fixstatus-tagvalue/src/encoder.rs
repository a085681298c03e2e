/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 15/10/26
******************************************************************************/

//! FIX message encoder.
//!
//! Builds tag=value frames. BeginString, BodyLength, and CheckSum are always
//! computed here; any values for those tags already present in a [`Message`]
//! are ignored in favour of the computed ones.

use crate::SOH;
use crate::checksum::{calculate_checksum, format_checksum};
use bytes::{BufMut, BytesMut};
use fixstatus_core::field::tags;
use fixstatus_core::message::Message;

/// FIX message encoder.
#[derive(Debug)]
pub struct Encoder {
    /// Fields between BodyLength and CheckSum.
    body: BytesMut,
    /// The BeginString value (e.g., "FIX.4.4").
    begin_string: String,
}

impl Encoder {
    /// Creates a new encoder with the specified BeginString.
    #[must_use]
    pub fn new(begin_string: impl Into<String>) -> Self {
        Self {
            body: BytesMut::with_capacity(256),
            begin_string: begin_string.into(),
        }
    }

    /// Appends a field with a string value.
    #[inline]
    pub fn put_str(&mut self, tag: u32, value: &str) {
        self.put_raw(tag, value.as_bytes());
    }

    /// Appends a field with an unsigned integer value.
    #[inline]
    pub fn put_uint(&mut self, tag: u32, value: u64) {
        let mut buf = itoa::Buffer::new();
        self.put_raw(tag, buf.format(value).as_bytes());
    }

    /// Appends a field with raw bytes.
    #[inline]
    pub fn put_raw(&mut self, tag: u32, value: &[u8]) {
        let mut tag_buf = itoa::Buffer::new();
        self.body.put_slice(tag_buf.format(tag).as_bytes());
        self.body.put_u8(b'=');
        self.body.put_slice(value);
        self.body.put_u8(SOH);
    }

    /// Encodes a complete message.
    ///
    /// MsgType is written first, followed by the remaining header fields, the
    /// body, and the trailer, each in stored order.
    #[must_use]
    pub fn encode(mut self, message: &Message) -> BytesMut {
        if let Some(msg_type) = message.header.get(tags::MSG_TYPE) {
            self.put_raw(tags::MSG_TYPE, msg_type.value);
        }
        for field in message.header.iter() {
            if !matches!(
                field.tag,
                tags::BEGIN_STRING | tags::BODY_LENGTH | tags::MSG_TYPE
            ) {
                self.put_raw(field.tag, field.value);
            }
        }
        for field in message.body.iter() {
            self.put_raw(field.tag, field.value);
        }
        for field in message.trailer.iter() {
            if field.tag != tags::CHECK_SUM {
                self.put_raw(field.tag, field.value);
            }
        }
        self.finish()
    }

    /// Finalizes the frame: prepends BeginString and BodyLength, appends CheckSum.
    #[must_use]
    pub fn finish(self) -> BytesMut {
        let mut len_buf = itoa::Buffer::new();
        let len_str = len_buf.format(self.body.len());

        let mut frame =
            BytesMut::with_capacity(self.begin_string.len() + len_str.len() + self.body.len() + 16);
        frame.put_slice(b"8=");
        frame.put_slice(self.begin_string.as_bytes());
        frame.put_u8(SOH);
        frame.put_slice(b"9=");
        frame.put_slice(len_str.as_bytes());
        frame.put_u8(SOH);
        frame.put_slice(&self.body);

        let checksum = format_checksum(calculate_checksum(&frame));
        frame.put_slice(b"10=");
        frame.put_slice(&checksum);
        frame.put_u8(SOH);
        frame
    }

    /// Returns the current body length.
    #[inline]
    #[must_use]
    pub fn body_len(&self) -> usize {
        self.body.len()
    }
}
