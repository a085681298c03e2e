/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 15/10/26
******************************************************************************/

//! Outbound message construction.

use crate::record::ImportRecord;
use fixstatus_core::error::RecordValidationError;
use fixstatus_core::field::{FieldTag, tags};
use fixstatus_core::message::Message;
use tracing::{debug, warn};

/// Column holding MsgType (35).
pub const MSG_TYPE_COLUMN: &str = "MsgType";
/// Column holding SenderCompID (49).
pub const SENDER_COLUMN: &str = "SenderCompID";
/// Column holding TargetCompID (56).
pub const TARGET_COLUMN: &str = "TargetCompID";

const REQUIRED: [(&str, u32); 3] = [
    (MSG_TYPE_COLUMN, tags::MSG_TYPE),
    (SENDER_COLUMN, tags::SENDER_COMP_ID),
    (TARGET_COLUMN, tags::TARGET_COMP_ID),
];

/// Builds engine-native messages from import records.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutboundBuilder;

impl OutboundBuilder {
    /// Creates a builder.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Builds one outbound message.
    ///
    /// The required columns become header fields 35, 49, and 56. Every other
    /// column must be named by a tag number and is copied verbatim into the
    /// body; other column names, tag 0, and empty cells are skipped.
    ///
    /// # Errors
    /// Returns `RecordValidationError` if a required column is missing or blank.
    pub fn build(&self, record: &ImportRecord) -> Result<Message, RecordValidationError> {
        let mut message = Message::new();

        for (column, tag) in REQUIRED {
            let value = record
                .get(column)
                .ok_or_else(|| RecordValidationError::MissingColumn {
                    row: record.row(),
                    column: column.to_string(),
                })?;
            if value.trim().is_empty() {
                return Err(RecordValidationError::EmptyColumn {
                    row: record.row(),
                    column: column.to_string(),
                });
            }
            message.header.set_str(tag, value);
        }

        for (column, value) in record.iter() {
            if REQUIRED.iter().any(|(name, _)| *name == column) {
                continue;
            }
            let tag = match column.parse::<FieldTag>() {
                Ok(tag) if tag.is_valid() => tag,
                _ => {
                    warn!(row = record.row(), column, "column is not a tag number, skipped");
                    continue;
                }
            };
            if value.is_empty() {
                debug!(row = record.row(), tag = tag.value(), "empty cell skipped");
                continue;
            }
            message.body.set_str(tag.value(), value);
        }

        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(cells: &[(&str, &str)]) -> ImportRecord {
        ImportRecord::new(1, cells.iter().copied())
    }

    #[test]
    fn test_build_new_order() {
        let message = OutboundBuilder::new()
            .build(&record(&[
                ("MsgType", "D"),
                ("SenderCompID", "A"),
                ("TargetCompID", "B"),
                ("55", "AAPL"),
                ("54", "1"),
                ("38", "100"),
                ("44", "150.25"),
            ]))
            .unwrap();

        assert_eq!(message.msg_type(), Some("D"));
        assert_eq!(message.header.get_str(tags::SENDER_COMP_ID).unwrap(), "A");
        assert_eq!(message.header.get_str(tags::TARGET_COMP_ID).unwrap(), "B");
        assert_eq!(message.body.len(), 4);
        assert_eq!(message.body.get_str(tags::PRICE).unwrap(), "150.25");
        assert!(!message.body.contains(tags::MSG_TYPE));
    }

    #[test]
    fn test_build_missing_required_column() {
        let err = OutboundBuilder::new()
            .build(&ImportRecord::new(2, [("SenderCompID", "A"), ("TargetCompID", "B")]))
            .unwrap_err();
        assert_eq!(
            err,
            RecordValidationError::MissingColumn {
                row: 2,
                column: "MsgType".into()
            }
        );
    }

    #[test]
    fn test_build_blank_required_column() {
        let err = OutboundBuilder::new()
            .build(&record(&[
                ("MsgType", "D"),
                ("SenderCompID", " "),
                ("TargetCompID", "B"),
            ]))
            .unwrap_err();
        assert!(matches!(err, RecordValidationError::EmptyColumn { ref column, .. } if column == "SenderCompID"));
    }

    #[test]
    fn test_build_skips_bad_columns_and_empty_cells() {
        let message = OutboundBuilder::new()
            .build(&record(&[
                ("MsgType", "D"),
                ("SenderCompID", "A"),
                ("TargetCompID", "B"),
                ("Symbol", "AAPL"),
                ("0", "zero"),
                ("11", ""),
                (" 55 ", " IBM "),
            ]))
            .unwrap();
        assert_eq!(message.body.len(), 1);
        assert_eq!(message.body.get_str(tags::SYMBOL).unwrap(), " IBM ");
    }
}
