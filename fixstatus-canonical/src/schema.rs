/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 15/10/26
******************************************************************************/

//! Canonical message schema.
//!
//! Every field has a well-defined default (empty string, zero, or the
//! `Unspecified` enumeration value) so a partially populated message is still
//! a complete value.

use num_derive::{FromPrimitive, ToPrimitive};
use serde::{Deserialize, Serialize};

/// Recognized message types (tag 35).
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    FromPrimitive,
    ToPrimitive,
)]
#[repr(u32)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageKind {
    /// Absent or unrecognized wire code.
    #[default]
    Unspecified = 0,
    /// Heartbeat (0).
    Heartbeat = 1,
    /// Test Request (1).
    TestRequest = 2,
    /// Resend Request (2).
    ResendRequest = 3,
    /// Reject (3).
    Reject = 4,
    /// Sequence Reset (4).
    SequenceReset = 5,
    /// Logout (5).
    Logout = 6,
    /// Execution Report (8).
    ExecutionReport = 7,
    /// Order Cancel Reject (9).
    OrderCancelReject = 8,
    /// Logon (A).
    Logon = 9,
    /// New Order Single (D).
    NewOrderSingle = 10,
    /// Order Cancel Request (F).
    OrderCancelRequest = 11,
    /// Order Cancel/Replace Request (G).
    OrderCancelReplaceRequest = 12,
    /// Order Status Request (H).
    OrderStatusRequest = 13,
    /// Trade Capture Report (AE).
    TradeCaptureReport = 14,
}

/// Wire code to kind, in one place so both directions agree.
const MESSAGE_KINDS: &[(&str, MessageKind)] = &[
    ("0", MessageKind::Heartbeat),
    ("1", MessageKind::TestRequest),
    ("2", MessageKind::ResendRequest),
    ("3", MessageKind::Reject),
    ("4", MessageKind::SequenceReset),
    ("5", MessageKind::Logout),
    ("8", MessageKind::ExecutionReport),
    ("9", MessageKind::OrderCancelReject),
    ("A", MessageKind::Logon),
    ("D", MessageKind::NewOrderSingle),
    ("F", MessageKind::OrderCancelRequest),
    ("G", MessageKind::OrderCancelReplaceRequest),
    ("H", MessageKind::OrderStatusRequest),
    ("AE", MessageKind::TradeCaptureReport),
];

impl MessageKind {
    /// Maps a MsgType wire code, falling back to `Unspecified`.
    #[must_use]
    pub fn from_wire_code(code: &str) -> Self {
        MESSAGE_KINDS
            .iter()
            .find(|(c, _)| *c == code)
            .map_or(Self::Unspecified, |(_, kind)| *kind)
    }
}

/// Order side (tag 54).
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    FromPrimitive,
    ToPrimitive,
)]
#[repr(u32)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SideKind {
    /// Absent or unrecognized wire code.
    #[default]
    Unspecified = 0,
    /// Buy (1).
    Buy = 1,
    /// Sell (2).
    Sell = 2,
    /// Buy minus (3).
    BuyMinus = 3,
    /// Sell plus (4).
    SellPlus = 4,
    /// Sell short (5).
    SellShort = 5,
    /// Sell short exempt (6).
    SellShortExempt = 6,
    /// Undisclosed (7).
    Undisclosed = 7,
    /// Cross (8).
    Cross = 8,
    /// Cross short (9).
    CrossShort = 9,
}

impl SideKind {
    /// Maps a Side wire code, falling back to `Unspecified`.
    ///
    /// Side codes 1 through 9 share their number with the enumeration value.
    #[must_use]
    pub fn from_wire_code(code: &str) -> Self {
        match code.as_bytes() {
            [c @ b'1'..=b'9'] => {
                <Self as num_traits::FromPrimitive>::from_u8(c - b'0').unwrap_or(Self::Unspecified)
            }
            _ => Self::Unspecified,
        }
    }
}

/// Standard header projection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanonicalHeader {
    /// SenderCompID (49).
    pub sender_comp_id: String,
    /// TargetCompID (56).
    pub target_comp_id: String,
    /// MsgSeqNum (34).
    pub msg_seq_num: u64,
    /// MsgType (35).
    pub msg_type: MessageKind,
    /// SendingTime (52), verbatim.
    pub sending_time: String,
}

/// Order body projection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanonicalBody {
    /// ClOrdID (11).
    pub cl_ord_id: String,
    /// Symbol (55).
    pub symbol: String,
    /// Side (54).
    pub side: SideKind,
    /// OrderQty (38).
    pub order_qty: f64,
    /// Price (44).
    pub price: f64,
    /// TransactTime (60), verbatim.
    pub transact_time: String,
}

/// One entry of the NoContraBrokers (382) repeating group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContraBroker {
    /// ContraBroker (375).
    pub contra_broker: String,
    /// ContraTrader (337).
    pub contra_trader: String,
}

/// Canonical projection of an inbound application message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanonicalMessage {
    /// Header part.
    pub header: CanonicalHeader,
    /// Body part.
    pub body: CanonicalBody,
    /// Contra broker entries in wire order.
    pub contra_brokers: Vec<ContraBroker>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_traits::{FromPrimitive, ToPrimitive};

    #[test]
    fn test_message_kind_table() {
        assert_eq!(MessageKind::from_wire_code("D"), MessageKind::NewOrderSingle);
        assert_eq!(MessageKind::from_wire_code("AE"), MessageKind::TradeCaptureReport);
        assert_eq!(MessageKind::from_wire_code("ZZ"), MessageKind::Unspecified);
        assert_eq!(MessageKind::from_wire_code(""), MessageKind::Unspecified);
        assert_eq!(MessageKind::from_wire_code("8"), MessageKind::ExecutionReport);
    }

    #[test]
    fn test_message_kind_numbers() {
        assert_eq!(MessageKind::NewOrderSingle.to_u32(), Some(10));
        assert_eq!(MessageKind::from_u32(7), Some(MessageKind::ExecutionReport));
        assert_eq!(MessageKind::from_u32(99), None);
    }

    #[test]
    fn test_side_kind_table() {
        assert_eq!(SideKind::from_wire_code("1"), SideKind::Buy);
        assert_eq!(SideKind::from_wire_code("9"), SideKind::CrossShort);
        assert_eq!(SideKind::from_wire_code("0"), SideKind::Unspecified);
        assert_eq!(SideKind::from_wire_code("12"), SideKind::Unspecified);
        assert_eq!(SideKind::from_wire_code("2"), SideKind::Sell);
    }

    #[test]
    fn test_canonical_json_shape() {
        let mut message = CanonicalMessage::default();
        message.header.msg_type = MessageKind::NewOrderSingle;
        message.body.side = SideKind::SellShort;

        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["header"]["msg_type"], "NEW_ORDER_SINGLE");
        assert_eq!(json["body"]["side"], "SELL_SHORT");
        assert_eq!(json["contra_brokers"], serde_json::json!([]));
    }
}
