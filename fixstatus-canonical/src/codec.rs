/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 15/10/26
******************************************************************************/

//! Canonical binary codec.
//!
//! Field-numbered tag/length/value encoding, wire compatible with protocol
//! buffers:
//!
//! | # | Field | Wire type |
//! |---|-------|-----------|
//! | 1 | sender_comp_id | length-delimited |
//! | 2 | target_comp_id | length-delimited |
//! | 3 | msg_seq_num | varint |
//! | 4 | msg_type | varint |
//! | 5 | sending_time | length-delimited |
//! | 6 | cl_ord_id | length-delimited |
//! | 7 | symbol | length-delimited |
//! | 8 | side | varint |
//! | 9 | order_qty | fixed64 |
//! | 10 | price | fixed64 |
//! | 11 | transact_time | length-delimited |
//! | 12 | contra_brokers (repeated, nested 1: broker, 2: trader) | length-delimited |
//!
//! Default values are not written. Unknown fields are skipped on decode.

use crate::schema::{CanonicalMessage, ContraBroker, MessageKind, SideKind};
use bytes::{BufMut, Bytes, BytesMut};
use num_traits::{FromPrimitive, ToPrimitive};
use thiserror::Error;

const WIRE_VARINT: u8 = 0;
const WIRE_FIXED64: u8 = 1;
const WIRE_LEN: u8 = 2;
const WIRE_FIXED32: u8 = 5;

/// Errors that occur while decoding a canonical payload.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Input ended in the middle of a value.
    #[error("unexpected end of input at offset {0}")]
    Truncated(usize),

    /// A varint ran past ten bytes.
    #[error("varint overflow at offset {0}")]
    VarintOverflow(usize),

    /// The key names field 0 or an unsupported wire type.
    #[error("invalid key for field {field}: wire type {wire_type}")]
    InvalidKey {
        /// Field number from the key.
        field: u64,
        /// Wire type from the key.
        wire_type: u8,
    },

    /// A known field arrived with the wrong wire type.
    #[error("field {field} has wire type {actual}, expected {expected}")]
    WireTypeMismatch {
        /// Field number.
        field: u64,
        /// Wire type the schema requires.
        expected: u8,
        /// Wire type found.
        actual: u8,
    },

    /// A string field is not valid UTF-8.
    #[error("invalid utf-8 in field {0}")]
    InvalidUtf8(u64),
}

/// Encodes a canonical message.
///
/// Deterministic: equal messages produce identical bytes.
#[must_use]
pub fn encode(message: &CanonicalMessage) -> Bytes {
    let mut buf = BytesMut::with_capacity(128);
    let header = &message.header;
    let body = &message.body;

    put_string(&mut buf, 1, &header.sender_comp_id);
    put_string(&mut buf, 2, &header.target_comp_id);
    put_uint(&mut buf, 3, header.msg_seq_num);
    put_uint(&mut buf, 4, header.msg_type.to_u64().unwrap_or(0));
    put_string(&mut buf, 5, &header.sending_time);
    put_string(&mut buf, 6, &body.cl_ord_id);
    put_string(&mut buf, 7, &body.symbol);
    put_uint(&mut buf, 8, body.side.to_u64().unwrap_or(0));
    put_double(&mut buf, 9, body.order_qty);
    put_double(&mut buf, 10, body.price);
    put_string(&mut buf, 11, &body.transact_time);

    for contra in &message.contra_brokers {
        let mut entry = BytesMut::new();
        put_string(&mut entry, 1, &contra.contra_broker);
        put_string(&mut entry, 2, &contra.contra_trader);
        put_key(&mut buf, 12, WIRE_LEN);
        put_varint(&mut buf, entry.len() as u64);
        buf.put_slice(&entry);
    }

    buf.freeze()
}

/// Decodes a canonical message.
///
/// Enumeration numbers this build does not know decode as `Unspecified`.
///
/// # Errors
/// Returns `CodecError` if the input is not a well-formed encoding.
pub fn decode(data: &[u8]) -> Result<CanonicalMessage, CodecError> {
    let mut message = CanonicalMessage::default();
    let mut offset = 0;

    while offset < data.len() {
        let (field, wire_type) = read_key(data, &mut offset)?;
        match field {
            1 => message.header.sender_comp_id = read_string(data, &mut offset, field, wire_type)?,
            2 => message.header.target_comp_id = read_string(data, &mut offset, field, wire_type)?,
            3 => message.header.msg_seq_num = read_uint(data, &mut offset, field, wire_type)?,
            4 => {
                let n = read_uint(data, &mut offset, field, wire_type)?;
                message.header.msg_type = MessageKind::from_u64(n).unwrap_or_default();
            }
            5 => message.header.sending_time = read_string(data, &mut offset, field, wire_type)?,
            6 => message.body.cl_ord_id = read_string(data, &mut offset, field, wire_type)?,
            7 => message.body.symbol = read_string(data, &mut offset, field, wire_type)?,
            8 => {
                let n = read_uint(data, &mut offset, field, wire_type)?;
                message.body.side = SideKind::from_u64(n).unwrap_or_default();
            }
            9 => message.body.order_qty = read_double(data, &mut offset, field, wire_type)?,
            10 => message.body.price = read_double(data, &mut offset, field, wire_type)?,
            11 => message.body.transact_time = read_string(data, &mut offset, field, wire_type)?,
            12 => {
                expect_wire(field, WIRE_LEN, wire_type)?;
                let entry = read_len_delimited(data, &mut offset)?;
                message.contra_brokers.push(decode_contra(entry)?);
            }
            _ => skip(data, &mut offset, wire_type)?,
        }
    }

    Ok(message)
}

fn decode_contra(data: &[u8]) -> Result<ContraBroker, CodecError> {
    let mut contra = ContraBroker::default();
    let mut offset = 0;
    while offset < data.len() {
        let (field, wire_type) = read_key(data, &mut offset)?;
        match field {
            1 => contra.contra_broker = read_string(data, &mut offset, field, wire_type)?,
            2 => contra.contra_trader = read_string(data, &mut offset, field, wire_type)?,
            _ => skip(data, &mut offset, wire_type)?,
        }
    }
    Ok(contra)
}

fn put_key(buf: &mut BytesMut, field: u64, wire_type: u8) {
    put_varint(buf, (field << 3) | u64::from(wire_type));
}

/// Writes a little-endian base-128 varint.
fn put_varint(buf: &mut BytesMut, mut value: u64) {
    while value >= 0x80 {
        buf.put_u8((value as u8 & 0x7F) | 0x80);
        value >>= 7;
    }
    buf.put_u8(value as u8);
}

fn put_uint(buf: &mut BytesMut, field: u64, value: u64) {
    if value != 0 {
        put_key(buf, field, WIRE_VARINT);
        put_varint(buf, value);
    }
}

fn put_double(buf: &mut BytesMut, field: u64, value: f64) {
    // Bit comparison keeps -0.0 on the wire.
    if value.to_bits() != 0 {
        put_key(buf, field, WIRE_FIXED64);
        buf.put_f64_le(value);
    }
}

fn put_string(buf: &mut BytesMut, field: u64, value: &str) {
    if !value.is_empty() {
        put_key(buf, field, WIRE_LEN);
        put_varint(buf, value.len() as u64);
        buf.put_slice(value.as_bytes());
    }
}

fn read_varint(data: &[u8], offset: &mut usize) -> Result<u64, CodecError> {
    let start = *offset;
    let mut value: u64 = 0;
    for shift in (0..64).step_by(7) {
        let byte = *data.get(*offset).ok_or(CodecError::Truncated(*offset))?;
        *offset += 1;
        value |= u64::from(byte & 0x7F) << shift;
        if byte & 0x80 == 0 {
            return Ok(value);
        }
    }
    Err(CodecError::VarintOverflow(start))
}

fn read_key(data: &[u8], offset: &mut usize) -> Result<(u64, u8), CodecError> {
    let key = read_varint(data, offset)?;
    let field = key >> 3;
    let wire_type = (key & 0x07) as u8;
    if field == 0 || !matches!(wire_type, WIRE_VARINT | WIRE_FIXED64 | WIRE_LEN | WIRE_FIXED32) {
        return Err(CodecError::InvalidKey { field, wire_type });
    }
    Ok((field, wire_type))
}

fn expect_wire(field: u64, expected: u8, actual: u8) -> Result<(), CodecError> {
    if expected == actual {
        Ok(())
    } else {
        Err(CodecError::WireTypeMismatch {
            field,
            expected,
            actual,
        })
    }
}

fn take<'a>(data: &'a [u8], offset: &mut usize, len: usize) -> Result<&'a [u8], CodecError> {
    let end = offset
        .checked_add(len)
        .filter(|end| *end <= data.len())
        .ok_or(CodecError::Truncated(data.len()))?;
    let slice = &data[*offset..end];
    *offset = end;
    Ok(slice)
}

fn read_len_delimited<'a>(data: &'a [u8], offset: &mut usize) -> Result<&'a [u8], CodecError> {
    let len = read_varint(data, offset)?;
    let len = usize::try_from(len).map_err(|_| CodecError::Truncated(data.len()))?;
    take(data, offset, len)
}

fn read_uint(data: &[u8], offset: &mut usize, field: u64, wire_type: u8) -> Result<u64, CodecError> {
    expect_wire(field, WIRE_VARINT, wire_type)?;
    read_varint(data, offset)
}

fn read_double(
    data: &[u8],
    offset: &mut usize,
    field: u64,
    wire_type: u8,
) -> Result<f64, CodecError> {
    expect_wire(field, WIRE_FIXED64, wire_type)?;
    let bytes = take(data, offset, 8)?;
    let mut raw = [0u8; 8];
    raw.copy_from_slice(bytes);
    Ok(f64::from_le_bytes(raw))
}

fn read_string(
    data: &[u8],
    offset: &mut usize,
    field: u64,
    wire_type: u8,
) -> Result<String, CodecError> {
    expect_wire(field, WIRE_LEN, wire_type)?;
    let bytes = read_len_delimited(data, offset)?;
    String::from_utf8(bytes.to_vec()).map_err(|_| CodecError::InvalidUtf8(field))
}

fn skip(data: &[u8], offset: &mut usize, wire_type: u8) -> Result<(), CodecError> {
    match wire_type {
        WIRE_VARINT => read_varint(data, offset).map(drop),
        WIRE_FIXED64 => take(data, offset, 8).map(drop),
        WIRE_FIXED32 => take(data, offset, 4).map(drop),
        _ => read_len_delimited(data, offset).map(drop),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CanonicalMessage {
        let mut message = CanonicalMessage::default();
        message.header.sender_comp_id = "A".into();
        message.header.target_comp_id = "B".into();
        message.header.msg_seq_num = 300;
        message.header.msg_type = MessageKind::ExecutionReport;
        message.header.sending_time = "20260115-10:00:00.000".into();
        message.body.cl_ord_id = "ORD-1".into();
        message.body.symbol = "AAPL".into();
        message.body.side = SideKind::Sell;
        message.body.order_qty = 100.0;
        message.body.price = 150.25;
        message.contra_brokers = vec![
            ContraBroker {
                contra_broker: "BRK1".into(),
                contra_trader: "TRD1".into(),
            },
            ContraBroker {
                contra_broker: "BRK2".into(),
                contra_trader: String::new(),
            },
        ];
        message
    }

    #[test]
    fn test_default_encodes_empty() {
        assert!(encode(&CanonicalMessage::default()).is_empty());
        assert_eq!(decode(&[]).unwrap(), CanonicalMessage::default());
    }

    #[test]
    fn test_known_bytes() {
        let mut message = CanonicalMessage::default();
        message.header.sender_comp_id = "A".into();
        message.header.msg_seq_num = 300;
        message.body.side = SideKind::Buy;
        assert_eq!(
            encode(&message).as_ref(),
            &[0x0A, 0x01, b'A', 0x18, 0xAC, 0x02, 0x40, 0x01]
        );
    }

    #[test]
    fn test_round_trip() {
        let message = sample();
        assert_eq!(decode(&encode(&message)).unwrap(), message);
    }

    #[test]
    fn test_unknown_fields_skipped() {
        let mut buf = BytesMut::new();
        put_uint(&mut buf, 99, 7);
        put_string(&mut buf, 7, "MSFT");
        put_key(&mut buf, 50, WIRE_FIXED32);
        buf.put_u32_le(1);
        put_string(&mut buf, 51, "ignored");

        let message = decode(&buf).unwrap();
        assert_eq!(message.body.symbol, "MSFT");
    }

    #[test]
    fn test_unknown_enum_number_is_unspecified() {
        let mut buf = BytesMut::new();
        put_uint(&mut buf, 4, 999);
        put_uint(&mut buf, 8, 999);
        let message = decode(&buf).unwrap();
        assert_eq!(message.header.msg_type, MessageKind::Unspecified);
        assert_eq!(message.body.side, SideKind::Unspecified);
    }

    #[test]
    fn test_decode_errors() {
        let encoded = encode(&sample());
        assert!(matches!(
            decode(&encoded[..encoded.len() - 1]),
            Err(CodecError::Truncated(_))
        ));
        assert_eq!(
            decode(&[0x00]),
            Err(CodecError::InvalidKey {
                field: 0,
                wire_type: 0
            })
        );
        assert_eq!(
            decode(&[0x08, 0x01]),
            Err(CodecError::WireTypeMismatch {
                field: 1,
                expected: WIRE_LEN,
                actual: WIRE_VARINT
            })
        );
        assert_eq!(decode(&[0x0A, 0x01, 0xFF]), Err(CodecError::InvalidUtf8(1)));
        assert!(matches!(
            decode(&[0x18, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]),
            Err(CodecError::VarintOverflow(1))
        ));
    }
}
