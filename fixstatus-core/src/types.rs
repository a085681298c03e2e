/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 15/10/26
******************************************************************************/

//! Session-level types.
//!
//! This module provides:
//! - [`SessionIdentity`]: The (version, sender, target) triple naming a session
//! - [`ConnectionStatus`]: Connected or disconnected, as reported by the status service

use crate::error::ConfigurationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unique identifier for a FIX session.
///
/// Renders as `version:sender->target`, e.g. `FIX.4.4:CLIENT->BROKER`. The
/// rendered string is also the registry key, so two identities are equal
/// exactly when their keys are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionIdentity {
    /// BeginString (e.g., "FIX.4.4").
    pub begin_string: String,
    /// SenderCompID.
    pub sender_comp_id: String,
    /// TargetCompID.
    pub target_comp_id: String,
}

impl SessionIdentity {
    /// Creates a new session identity.
    #[must_use]
    pub fn new(
        begin_string: impl Into<String>,
        sender_comp_id: impl Into<String>,
        target_comp_id: impl Into<String>,
    ) -> Self {
        Self {
            begin_string: begin_string.into(),
            sender_comp_id: sender_comp_id.into(),
            target_comp_id: target_comp_id.into(),
        }
    }

    /// Returns the canonical string key.
    #[must_use]
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for SessionIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}->{}",
            self.begin_string, self.sender_comp_id, self.target_comp_id
        )
    }
}

impl FromStr for SessionIdentity {
    type Err = ConfigurationError;

    /// Parses `version:sender->target`.
    ///
    /// Exactly one `:` and one `->` are allowed and every part must be non-empty.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = |reason: &str| ConfigurationError::MalformedIdentity {
            value: s.to_string(),
            reason: reason.to_string(),
        };

        let (version, route) = s
            .split_once(':')
            .ok_or_else(|| malformed("missing ':' separator"))?;
        if route.contains(':') {
            return Err(malformed("more than one ':' separator"));
        }
        let (sender, target) = route
            .split_once("->")
            .ok_or_else(|| malformed("missing '->' separator"))?;
        if target.contains("->") {
            return Err(malformed("more than one '->' separator"));
        }
        if version.is_empty() {
            return Err(malformed("empty version"));
        }
        if sender.is_empty() {
            return Err(malformed("empty sender"));
        }
        if target.is_empty() {
            return Err(malformed("empty target"));
        }

        Ok(Self::new(version, sender, target))
    }
}

impl Serialize for SessionIdentity {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SessionIdentity {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Whether a session is currently logged on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectionStatus {
    /// Logged on.
    Connected,
    /// Created but not logged on, or logged out.
    Disconnected,
}

impl ConnectionStatus {
    /// Maps the registry's boolean to a status.
    #[inline]
    #[must_use]
    pub const fn from_connected(connected: bool) -> Self {
        if connected {
            Self::Connected
        } else {
            Self::Disconnected
        }
    }

    /// Returns true for `Connected`.
    #[inline]
    #[must_use]
    pub const fn is_connected(self) -> bool {
        matches!(self, Self::Connected)
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connected => write!(f, "Connected"),
            Self::Disconnected => write!(f, "Disconnected"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_identity_display() {
        let id = SessionIdentity::new("FIX.4.4", "CLIENT", "BROKER");
        assert_eq!(id.to_string(), "FIX.4.4:CLIENT->BROKER");
        assert_eq!(id.key(), "FIX.4.4:CLIENT->BROKER");
    }

    #[test]
    fn test_session_identity_parse_round_trip() {
        let id: SessionIdentity = "FIXT.1.1:A->B".parse().unwrap();
        assert_eq!(id, SessionIdentity::new("FIXT.1.1", "A", "B"));
    }

    #[test]
    fn test_session_identity_parse_malformed() {
        for input in [
            "FIX.4.4",
            "FIX.4.4:AB",
            ":A->B",
            "FIX.4.4:->B",
            "FIX.4.4:A->",
            "FIX.4.4:A->B->C",
            "FIX:4.4:A->B",
        ] {
            let err = input.parse::<SessionIdentity>().unwrap_err();
            assert!(
                matches!(err, ConfigurationError::MalformedIdentity { ref value, .. } if value == input),
                "{input} should be rejected"
            );
        }
    }

    #[test]
    fn test_session_identity_serde() {
        let id = SessionIdentity::new("FIX.4.2", "S", "T");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"FIX.4.2:S->T\"");
        let back: SessionIdentity = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
        assert!(serde_json::from_str::<SessionIdentity>("\"bogus\"").is_err());
    }

    #[test]
    fn test_connection_status() {
        assert_eq!(ConnectionStatus::from_connected(true).to_string(), "Connected");
        assert_eq!(
            serde_json::to_string(&ConnectionStatus::Disconnected).unwrap(),
            "\"Disconnected\""
        );
        assert!(!ConnectionStatus::Disconnected.is_connected());
    }
}
