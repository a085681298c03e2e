/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 15/10/26
******************************************************************************/

//! # fixstatus Tag-Value
//!
//! FIX tag=value codec for engine-native messages.
//!
//! The bridge itself only ever sees decoded [`Message`](fixstatus_core::Message)
//! values handed over by the engine. This crate is what turns bytes on a socket
//! into those values and back, for the bundled initiator and for tests.
//!
//! ## Features
//!
//! - **Framing**: [`try_frame`] finds complete messages in a stream buffer
//! - **Decoding**: [`Decoder`] splits a frame into header, body, and trailer
//! - **Encoding**: [`Encoder`] renders a message with BodyLength and CheckSum

pub mod checksum;
pub mod decoder;
pub mod encoder;

pub use checksum::{calculate_checksum, format_checksum, parse_checksum};
pub use decoder::{Decoder, try_frame};
pub use encoder::Encoder;

/// SOH (Start of Header) delimiter used in FIX messages.
pub const SOH: u8 = 0x01;
