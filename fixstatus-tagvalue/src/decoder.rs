/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 15/10/26
******************************************************************************/

//! FIX message framing and decoding.
//!
//! [`try_frame`] answers "is there a whole message at the front of this buffer,
//! and how long is it", which is all a socket reader needs. [`Decoder`] then
//! turns one frame into a [`Message`], sorting fields into header, body, and
//! trailer by the standard header and trailer tag sets.

use crate::SOH;
use crate::checksum::{calculate_checksum, parse_checksum};
use bytes::Bytes;
use fixstatus_core::error::DecodeError;
use fixstatus_core::field::{FieldRef, tags};
use fixstatus_core::message::Message;
use memchr::memchr;

/// Length of the trailing `10=NNN<SOH>` field.
const CHECKSUM_FIELD_LEN: usize = 7;

/// Locates the first complete message at the front of `buf`.
///
/// # Returns
/// `Ok(Some(len))` with the frame length, or `Ok(None)` if more bytes are needed.
///
/// # Errors
/// Returns `DecodeError` if the buffer does not start with a valid frame header.
pub fn try_frame(buf: &[u8]) -> Result<Option<usize>, DecodeError> {
    let mut decoder = Decoder::new(buf);

    let Some(begin) = decoder.next_field() else {
        return if buf.len() >= 2 && !buf.starts_with(b"8=") {
            Err(DecodeError::InvalidBeginString)
        } else {
            Ok(None)
        };
    };
    if begin.tag != tags::BEGIN_STRING {
        return Err(DecodeError::InvalidBeginString);
    }

    let Some(length) = decoder.next_field() else {
        return Ok(None);
    };
    if length.tag != tags::BODY_LENGTH {
        return Err(DecodeError::MissingBodyLength);
    }
    let body_length: usize = length.parse().map_err(|_| DecodeError::InvalidBodyLength)?;

    let Some((body_end, total)) = decoder
        .offset()
        .checked_add(body_length)
        .and_then(|end| Some((end, end.checked_add(CHECKSUM_FIELD_LEN)?)))
    else {
        return Err(DecodeError::InvalidBodyLength);
    };
    if buf.len() < total {
        return Ok(None);
    }
    if !buf[body_end..].starts_with(b"10=") || buf[total - 1] != SOH {
        return Err(DecodeError::InvalidBodyLength);
    }
    Ok(Some(total))
}

/// FIX tag=value decoder.
///
/// Reads fields sequentially from a borrowed buffer. Decoded messages own
/// copies of their values so they can outlive the read buffer.
#[derive(Debug)]
pub struct Decoder<'a> {
    input: &'a [u8],
    offset: usize,
    validate_checksum: bool,
}

impl<'a> Decoder<'a> {
    /// Creates a new decoder for the given input buffer.
    #[inline]
    #[must_use]
    pub const fn new(input: &'a [u8]) -> Self {
        Self {
            input,
            offset: 0,
            validate_checksum: true,
        }
    }

    /// Sets whether to validate checksums during decoding.
    #[inline]
    #[must_use]
    pub const fn with_checksum_validation(mut self, validate: bool) -> Self {
        self.validate_checksum = validate;
        self
    }

    /// Decodes one complete message starting at the current offset.
    ///
    /// BeginString, BodyLength, and CheckSum are kept in the header and trailer
    /// so the decoded message renders back to the same fields.
    ///
    /// # Errors
    /// Returns `DecodeError` if the message is malformed or incomplete.
    pub fn decode(&mut self) -> Result<Message, DecodeError> {
        let start = self.offset;
        let mut message = Message::new();

        let begin = self.next_field().ok_or(DecodeError::Incomplete)?;
        if begin.tag != tags::BEGIN_STRING {
            return Err(DecodeError::InvalidBeginString);
        }
        message.header.push(begin.tag, copy(begin));

        let length = self.next_field().ok_or(DecodeError::MissingBodyLength)?;
        if length.tag != tags::BODY_LENGTH {
            return Err(DecodeError::MissingBodyLength);
        }
        length
            .parse::<usize>()
            .map_err(|_| DecodeError::InvalidBodyLength)?;
        message.header.push(length.tag, copy(length));

        let msg_type = self.next_field().ok_or(DecodeError::MissingMsgType)?;
        if msg_type.tag != tags::MSG_TYPE {
            return Err(DecodeError::MissingMsgType);
        }
        message.header.push(msg_type.tag, copy(msg_type));

        loop {
            let field_start = self.offset;
            let field = self.next_field().ok_or(DecodeError::Incomplete)?;
            if field.tag == tags::CHECK_SUM {
                message.trailer.push(field.tag, copy(field));
                if self.validate_checksum {
                    let declared =
                        parse_checksum(field.value).ok_or(DecodeError::InvalidChecksum)?;
                    let calculated = calculate_checksum(&self.input[start..field_start]);
                    if calculated != declared {
                        return Err(DecodeError::ChecksumMismatch {
                            calculated,
                            declared,
                        });
                    }
                }
                break;
            }
            let section = if tags::is_header(field.tag) {
                &mut message.header
            } else if tags::is_trailer(field.tag) {
                &mut message.trailer
            } else {
                &mut message.body
            };
            section.push(field.tag, copy(field));
        }

        Ok(message)
    }

    /// Parses the next field from the buffer.
    ///
    /// # Returns
    /// The next field, or `None` if the buffer is exhausted or the field is incomplete.
    #[inline]
    pub fn next_field(&mut self) -> Option<FieldRef<'a>> {
        let remaining = self.input.get(self.offset..)?;
        let eq = memchr(b'=', remaining)?;
        let tag = parse_tag(&remaining[..eq])?;
        let value_start = eq + 1;
        let soh = memchr(SOH, &remaining[value_start..])?;
        let value = &remaining[value_start..value_start + soh];
        self.offset += value_start + soh + 1;
        Some(FieldRef::new(tag, value))
    }

    /// Returns the current offset in the buffer.
    #[inline]
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Returns true if the buffer has been fully consumed.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.offset >= self.input.len()
    }
}

fn copy(field: FieldRef<'_>) -> Bytes {
    Bytes::copy_from_slice(field.value)
}

/// Parses a tag number from ASCII digits.
#[inline]
fn parse_tag(bytes: &[u8]) -> Option<u32> {
    if bytes.is_empty() || bytes.len() > 10 {
        return None;
    }
    bytes.iter().try_fold(0u32, |acc, &b| {
        if !b.is_ascii_digit() {
            return None;
        }
        acc.checked_mul(10)?.checked_add(u32::from(b - b'0'))
    })
}
