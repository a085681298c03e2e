/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 15/10/26
******************************************************************************/

//! Engine-native message model.
//!
//! This module provides:
//! - [`FieldMap`]: Ordered tag/value storage for one message section
//! - [`GroupTemplate`] and [`Group`]: Repeating group extraction from a flat section
//! - [`Message`]: Header, body, and trailer sections of a FIX message
//!
//! A `Message` is what the external engine hands to the application callbacks
//! and what the application hands back to the engine's send operation.

use crate::error::FieldExtractionError;
use crate::field::{Field, FieldRef, tags};
use bytes::Bytes;
use smallvec::SmallVec;
use std::fmt;
use std::str::FromStr;

/// Message types handled by the session layer rather than the application.
pub const ADMIN_MSG_TYPES: [&str; 7] = ["0", "1", "2", "3", "4", "5", "A"];

/// Ordered collection of fields for one message section.
///
/// Fields keep their arrival order, which is what makes repeating groups
/// recoverable from a flat section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMap {
    fields: SmallVec<[Field; 16]>,
}

impl FieldMap {
    /// Creates an empty field map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a field, replacing the first existing occurrence of the tag.
    ///
    /// # Arguments
    /// * `tag` - The field tag number
    /// * `value` - The raw field value
    pub fn set(&mut self, tag: u32, value: impl Into<Bytes>) {
        let value = value.into();
        match self.fields.iter_mut().find(|f| f.tag == tag) {
            Some(existing) => existing.value = value,
            None => self.fields.push(Field { tag, value }),
        }
    }

    /// Sets a field from a string slice, copying the value.
    pub fn set_str(&mut self, tag: u32, value: &str) {
        self.set(tag, Bytes::copy_from_slice(value.as_bytes()));
    }

    /// Appends a field without replacing earlier occurrences.
    ///
    /// Repeating group members share tags, so decoders must use this instead of [`set`](Self::set).
    pub fn push(&mut self, tag: u32, value: impl Into<Bytes>) {
        self.fields.push(Field::new(tag, value));
    }

    /// Gets the first field with the given tag.
    #[must_use]
    pub fn get(&self, tag: u32) -> Option<FieldRef<'_>> {
        self.fields.iter().find(|f| f.tag == tag).map(Field::view)
    }

    /// Gets a field value as a string.
    ///
    /// # Errors
    /// Returns `FieldExtractionError::Missing` if absent, or `InvalidUtf8` if malformed.
    pub fn get_str(&self, tag: u32) -> Result<&str, FieldExtractionError> {
        self.get(tag)
            .ok_or(FieldExtractionError::Missing { tag })?
            .as_str()
    }

    /// Gets a field value parsed as the specified type.
    ///
    /// # Errors
    /// Returns `FieldExtractionError` if the field is absent or cannot be parsed.
    pub fn get_as<T: FromStr>(&self, tag: u32) -> Result<T, FieldExtractionError> {
        self.get(tag)
            .ok_or(FieldExtractionError::Missing { tag })?
            .parse()
    }

    /// Returns true if the tag is present.
    #[must_use]
    pub fn contains(&self, tag: u32) -> bool {
        self.fields.iter().any(|f| f.tag == tag)
    }

    /// Removes the first occurrence of a tag and returns its value.
    pub fn remove(&mut self, tag: u32) -> Option<Bytes> {
        let pos = self.fields.iter().position(|f| f.tag == tag)?;
        Some(self.fields.remove(pos).value)
    }

    /// Returns an iterator over all fields in order.
    pub fn iter(&self) -> impl Iterator<Item = FieldRef<'_>> {
        self.fields.iter().map(Field::view)
    }

    /// Returns the number of fields.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if there are no fields.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Extracts a repeating group.
    ///
    /// Walks the fields that follow the count tag for as long as they are members
    /// of the template. A new entry starts at the delimiter tag, or when a member
    /// repeats within the current entry. Fields seen before any delimiter form an
    /// entry of their own, which [`Group::is_well_formed`] reports as malformed.
    ///
    /// # Returns
    /// `None` if the count tag is absent.
    #[must_use]
    pub fn group(&self, template: &GroupTemplate) -> Option<Group> {
        let pos = self.fields.iter().position(|f| f.tag == template.count_tag)?;
        let declared = self.fields[pos].view().parse::<usize>();

        let mut entries: Vec<FieldMap> = Vec::new();
        for field in &self.fields[pos + 1..] {
            if !template.is_member(field.tag) {
                break;
            }
            let starts_entry = field.tag == template.delimiter
                || entries.last().is_none_or(|e| e.contains(field.tag));
            if starts_entry {
                entries.push(FieldMap::new());
            }
            if let Some(entry) = entries.last_mut() {
                entry.fields.push(field.clone());
            }
        }

        Some(Group {
            template: *template,
            declared,
            entries,
        })
    }
}

impl FromIterator<Field> for FieldMap {
    fn from_iter<I: IntoIterator<Item = Field>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

/// Layout of a repeating group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupTemplate {
    /// Tag carrying the number of entries (e.g. NoContraBrokers 382).
    pub count_tag: u32,
    /// First tag of every entry (e.g. ContraBroker 375).
    pub delimiter: u32,
    /// Every tag that may appear inside an entry, delimiter included.
    pub members: &'static [u32],
}

impl GroupTemplate {
    /// Creates a new group template.
    #[must_use]
    pub const fn new(count_tag: u32, delimiter: u32, members: &'static [u32]) -> Self {
        Self {
            count_tag,
            delimiter,
            members,
        }
    }

    /// Returns true if the tag can appear inside an entry.
    #[must_use]
    pub fn is_member(&self, tag: u32) -> bool {
        tag == self.delimiter || self.members.contains(&tag)
    }
}

/// A repeating group extracted from a [`FieldMap`].
#[derive(Debug, Clone)]
pub struct Group {
    template: GroupTemplate,
    /// Entry count declared by the count tag, if it parsed.
    pub declared: Result<usize, FieldExtractionError>,
    /// Entries in wire order.
    pub entries: Vec<FieldMap>,
}

impl Group {
    /// Returns true if the entry starts with the template's delimiter tag.
    #[must_use]
    pub fn is_well_formed(&self, entry: &FieldMap) -> bool {
        entry
            .fields
            .first()
            .is_some_and(|f| f.tag == self.template.delimiter)
    }

    /// Returns true if the declared count matches the entries found.
    #[must_use]
    pub fn count_matches(&self) -> bool {
        matches!(self.declared, Ok(n) if n == self.entries.len())
    }
}

/// Engine-native FIX message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    /// Standard header fields.
    pub header: FieldMap,
    /// Body fields, repeating groups included.
    pub body: FieldMap,
    /// Standard trailer fields.
    pub trailer: FieldMap,
}

impl Message {
    /// Creates an empty message.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty message with MsgType (35) already set.
    #[must_use]
    pub fn with_msg_type(msg_type: &str) -> Self {
        let mut message = Self::new();
        message.header.set_str(tags::MSG_TYPE, msg_type);
        message
    }

    /// Returns the MsgType (35) value, if present and valid UTF-8.
    #[must_use]
    pub fn msg_type(&self) -> Option<&str> {
        self.header.get_str(tags::MSG_TYPE).ok()
    }

    /// Returns true if this is a session-level message.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.msg_type()
            .is_some_and(|t| ADMIN_MSG_TYPES.contains(&t))
    }

    /// Returns an iterator over header, body, and trailer fields in order.
    pub fn fields(&self) -> impl Iterator<Item = FieldRef<'_>> {
        self.header
            .iter()
            .chain(self.body.iter())
            .chain(self.trailer.iter())
    }
}

impl fmt::Display for Message {
    /// Renders the message as `tag=value` pairs separated by `|`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, field) in self.fields().enumerate() {
            if i > 0 {
                f.write_str("|")?;
            }
            write!(f, "{}={}", field.tag, String::from_utf8_lossy(field.value))?;
        }
        Ok(())
    }
}
