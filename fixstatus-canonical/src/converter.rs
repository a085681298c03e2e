/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 15/10/26
******************************************************************************/

//! Wire to canonical conversion.
//!
//! The scalar mapping is the [`RULES`] table: one row per tag, naming the
//! section the tag lives in and the function that stores it. [`convert`] walks
//! the table once, so adding a mapping means adding a row.
//!
//! Every failure is local to the field (or group entry) that caused it. The
//! field stays at its default, a warning is logged, and conversion carries on.

use crate::schema::{CanonicalMessage, ContraBroker, MessageKind, SideKind};
use fixstatus_core::error::FieldExtractionError;
use fixstatus_core::field::{FieldRef, tags};
use fixstatus_core::message::{FieldMap, GroupTemplate, Message};
use tracing::{debug, warn};

/// Message section a rule reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    /// Standard header.
    Header,
    /// Message body.
    Body,
}

/// Stores one extracted field into the canonical message.
pub type ApplyFn = fn(&mut CanonicalMessage, FieldRef<'_>) -> Result<(), FieldExtractionError>;

/// One tag to canonical field mapping.
#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    /// Source tag.
    pub tag: u32,
    /// Section holding the tag.
    pub section: Section,
    /// Extraction and assignment.
    pub apply: ApplyFn,
}

impl FieldRule {
    const fn new(tag: u32, section: Section, apply: ApplyFn) -> Self {
        Self {
            tag,
            section,
            apply,
        }
    }
}

/// NoContraBrokers (382) group layout.
pub const CONTRA_BROKERS: GroupTemplate = GroupTemplate::new(
    tags::NO_CONTRA_BROKERS,
    tags::CONTRA_BROKER,
    &[tags::CONTRA_BROKER, tags::CONTRA_TRADER],
);

/// Scalar field mappings, in canonical field order.
pub static RULES: &[FieldRule] = &[
    FieldRule::new(tags::SENDER_COMP_ID, Section::Header, |m, f| {
        m.header.sender_comp_id = f.as_str()?.to_owned();
        Ok(())
    }),
    FieldRule::new(tags::TARGET_COMP_ID, Section::Header, |m, f| {
        m.header.target_comp_id = f.as_str()?.to_owned();
        Ok(())
    }),
    FieldRule::new(tags::MSG_SEQ_NUM, Section::Header, |m, f| {
        m.header.msg_seq_num = f.as_u64()?;
        Ok(())
    }),
    FieldRule::new(tags::MSG_TYPE, Section::Header, |m, f| {
        m.header.msg_type = MessageKind::from_wire_code(f.as_str()?);
        Ok(())
    }),
    FieldRule::new(tags::SENDING_TIME, Section::Header, |m, f| {
        m.header.sending_time = f.as_str()?.to_owned();
        Ok(())
    }),
    FieldRule::new(tags::CL_ORD_ID, Section::Body, |m, f| {
        m.body.cl_ord_id = f.as_str()?.to_owned();
        Ok(())
    }),
    FieldRule::new(tags::SYMBOL, Section::Body, |m, f| {
        m.body.symbol = f.as_str()?.to_owned();
        Ok(())
    }),
    FieldRule::new(tags::SIDE, Section::Body, |m, f| {
        m.body.side = SideKind::from_wire_code(f.as_str()?.trim());
        Ok(())
    }),
    FieldRule::new(tags::ORDER_QTY, Section::Body, |m, f| {
        m.body.order_qty = f.as_f64()?;
        Ok(())
    }),
    FieldRule::new(tags::PRICE, Section::Body, |m, f| {
        m.body.price = f.as_f64()?;
        Ok(())
    }),
    FieldRule::new(tags::TRANSACT_TIME, Section::Body, |m, f| {
        m.body.transact_time = f.as_str()?.to_owned();
        Ok(())
    }),
];

/// Converts an engine-native message to its canonical form.
///
/// Total and pure: the same input always yields the same output, and no input
/// makes it fail.
#[must_use]
pub fn convert(message: &Message) -> CanonicalMessage {
    let mut canonical = CanonicalMessage::default();

    for rule in RULES {
        let section = match rule.section {
            Section::Header => &message.header,
            Section::Body => &message.body,
        };
        let Some(field) = section.get(rule.tag) else {
            continue;
        };
        if let Err(error) = (rule.apply)(&mut canonical, field) {
            warn!(tag = rule.tag, %error, "field left at default");
        }
    }

    canonical.contra_brokers = contra_brokers(&message.body);
    canonical
}

fn contra_brokers(body: &FieldMap) -> Vec<ContraBroker> {
    let Some(group) = body.group(&CONTRA_BROKERS) else {
        return Vec::new();
    };

    match &group.declared {
        Err(error) => warn!(%error, "malformed group count, collecting entries present"),
        Ok(declared) if *declared != group.entries.len() => warn!(
            declared = *declared,
            found = group.entries.len(),
            "group count mismatch"
        ),
        Ok(_) => {}
    }

    group
        .entries
        .iter()
        .enumerate()
        .filter_map(|(index, entry)| {
            if !group.is_well_formed(entry) {
                warn!(index, "group entry without ContraBroker skipped");
                return None;
            }
            let mut contra = ContraBroker::default();
            match entry.get_str(tags::CONTRA_BROKER) {
                Ok(broker) => contra.contra_broker = broker.to_owned(),
                Err(error) => warn!(index, %error, "contra broker left empty"),
            }
            match entry.get_str(tags::CONTRA_TRADER) {
                Ok(trader) => contra.contra_trader = trader.to_owned(),
                Err(FieldExtractionError::Missing { .. }) => {
                    debug!(index, "entry has no contra trader")
                }
                Err(error) => warn!(index, %error, "contra trader left empty"),
            }
            Some(contra)
        })
        .collect()
}
