/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 15/10/26
******************************************************************************/

//! Process configuration from `FIXSTATUS_*` environment variables.
//!
//! | Variable | Default |
//! |---|---|
//! | `FIXSTATUS_FIX_HOST` | `127.0.0.1` |
//! | `FIXSTATUS_FIX_PORT` | `9876` |
//! | `FIXSTATUS_BEGIN_STRING` | `FIX.4.4` |
//! | `FIXSTATUS_SENDER` | `CLIENT` |
//! | `FIXSTATUS_TARGET` | `SERVER` |
//! | `FIXSTATUS_HEARTBEAT` | `30` |
//! | `FIXSTATUS_IMPORT` | `messages.csv` |
//! | `FIXSTATUS_STATUS_ADDR` | `127.0.0.1:8080` |
//! | `FIXSTATUS_SINK_ADDR` | unset (no network sink) |
//! | `FIXSTATUS_SINK_FILE` | unset (no file sink) |
//! | `FIXSTATUS_MESSAGE_LOG` | `logfile.log` (`off` disables) |
//! | `FIXSTATUS_VALIDATE_CHECKSUM` | `true` |
//! | `FIXSTATUS_QUEUE_CAPACITY` | `1024` |
//! | `FIXSTATUS_OVERFLOW` | `drop` (`block` to wait) |

use crate::coordinator::CoordinatorConfig;
use fixstatus_core::types::SessionIdentity;
use fixstatus_delivery::{DeliveryConfig, OverflowPolicy};
use std::path::PathBuf;

/// Bridge process configuration.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// FIX counterparty host.
    pub fix_host: String,
    /// FIX counterparty port.
    pub fix_port: u16,
    /// BeginString of the initiated session.
    pub begin_string: String,
    /// Our CompID.
    pub sender_comp_id: String,
    /// Counterparty CompID.
    pub target_comp_id: String,
    /// Heartbeat interval in seconds.
    pub heartbeat_interval: u64,
    /// Outbound import file.
    pub import_path: PathBuf,
    /// Status service bind address.
    pub status_addr: String,
    /// Network sink `host:port`, if any.
    pub sink_addr: Option<String>,
    /// Append-only file sink, if any.
    pub sink_file: Option<PathBuf>,
    /// Raw FIX message log, if any.
    pub message_log: Option<PathBuf>,
    /// Whether inbound frames must carry a correct CheckSum(10).
    pub validate_checksum: bool,
    /// Delivery queue settings.
    pub delivery: DeliveryConfig,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            fix_host: "127.0.0.1".to_string(),
            fix_port: 9876,
            begin_string: "FIX.4.4".to_string(),
            sender_comp_id: "CLIENT".to_string(),
            target_comp_id: "SERVER".to_string(),
            heartbeat_interval: 30,
            import_path: PathBuf::from("messages.csv"),
            status_addr: "127.0.0.1:8080".to_string(),
            sink_addr: None,
            sink_file: None,
            message_log: Some(PathBuf::from("logfile.log")),
            validate_checksum: true,
            delivery: DeliveryConfig::default(),
        }
    }
}

impl BridgeConfig {
    /// Reads the configuration from the process environment.
    ///
    /// Unset or unparsable variables keep their defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the configuration through an arbitrary variable lookup.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let mut delivery = defaults.delivery.clone();
        if let Some(capacity) = var("FIXSTATUS_QUEUE_CAPACITY").and_then(|v| v.parse().ok()) {
            delivery = delivery.with_queue_capacity(capacity);
        }
        if let Some(overflow) = var("FIXSTATUS_OVERFLOW") {
            delivery = delivery.with_overflow(match overflow.to_ascii_lowercase().as_str() {
                "block" => OverflowPolicy::Block,
                _ => OverflowPolicy::DropNewest,
            });
        }

        Self {
            fix_host: var("FIXSTATUS_FIX_HOST").unwrap_or(defaults.fix_host),
            fix_port: var("FIXSTATUS_FIX_PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.fix_port),
            begin_string: var("FIXSTATUS_BEGIN_STRING").unwrap_or(defaults.begin_string),
            sender_comp_id: var("FIXSTATUS_SENDER").unwrap_or(defaults.sender_comp_id),
            target_comp_id: var("FIXSTATUS_TARGET").unwrap_or(defaults.target_comp_id),
            heartbeat_interval: var("FIXSTATUS_HEARTBEAT")
                .and_then(|h| h.parse().ok())
                .unwrap_or(defaults.heartbeat_interval),
            import_path: var("FIXSTATUS_IMPORT").map_or(defaults.import_path, PathBuf::from),
            status_addr: var("FIXSTATUS_STATUS_ADDR").unwrap_or(defaults.status_addr),
            sink_addr: var("FIXSTATUS_SINK_ADDR"),
            sink_file: var("FIXSTATUS_SINK_FILE").map(PathBuf::from),
            message_log: match var("FIXSTATUS_MESSAGE_LOG") {
                Some(v) if v.eq_ignore_ascii_case("off") => None,
                Some(v) => Some(PathBuf::from(v)),
                None => defaults.message_log,
            },
            validate_checksum: var("FIXSTATUS_VALIDATE_CHECKSUM")
                .and_then(|v| parse_flag(&v))
                .unwrap_or(defaults.validate_checksum),
            delivery,
        }
    }

    /// Returns the FIX counterparty address.
    #[must_use]
    pub fn fix_addr(&self) -> String {
        format!("{}:{}", self.fix_host, self.fix_port)
    }

    /// Returns the identity of the initiated session.
    #[must_use]
    pub fn session_identity(&self) -> SessionIdentity {
        SessionIdentity::new(
            &self.begin_string,
            &self.sender_comp_id,
            &self.target_comp_id,
        )
    }

    /// Returns a coordinator configuration for the import file.
    #[must_use]
    pub fn coordinator(&self) -> CoordinatorConfig {
        CoordinatorConfig::new(&self.import_path)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = BridgeConfig::from_lookup(|_| None);
        assert_eq!(config.fix_addr(), "127.0.0.1:9876");
        assert_eq!(config.session_identity().key(), "FIX.4.4:CLIENT->SERVER");
        assert_eq!(config.heartbeat_interval, 30);
        assert!(config.sink_addr.is_none());
        assert!(config.sink_file.is_none());
        assert_eq!(config.message_log, Some(PathBuf::from("logfile.log")));
        assert!(config.validate_checksum);
        assert_eq!(config.delivery.overflow, OverflowPolicy::DropNewest);
    }

    #[test]
    fn test_overrides() {
        let config = BridgeConfig::from_lookup(lookup(&[
            ("FIXSTATUS_FIX_HOST", "fix.example.net"),
            ("FIXSTATUS_FIX_PORT", "9880"),
            ("FIXSTATUS_SENDER", "BRIDGE"),
            ("FIXSTATUS_TARGET", "EXCH"),
            ("FIXSTATUS_IMPORT", "/tmp/orders.csv"),
            ("FIXSTATUS_SINK_ADDR", "127.0.0.1:9090"),
            ("FIXSTATUS_SINK_FILE", "/tmp/canonical.bin"),
            ("FIXSTATUS_QUEUE_CAPACITY", "8"),
            ("FIXSTATUS_OVERFLOW", "BLOCK"),
            ("FIXSTATUS_MESSAGE_LOG", "/tmp/fix.log"),
            ("FIXSTATUS_VALIDATE_CHECKSUM", "false"),
        ]));
        assert_eq!(config.fix_addr(), "fix.example.net:9880");
        assert_eq!(config.session_identity().to_string(), "FIX.4.4:BRIDGE->EXCH");
        assert_eq!(config.coordinator().import_path(), PathBuf::from("/tmp/orders.csv"));
        assert_eq!(config.sink_addr.as_deref(), Some("127.0.0.1:9090"));
        assert_eq!(config.sink_file, Some(PathBuf::from("/tmp/canonical.bin")));
        assert_eq!(config.delivery.queue_capacity, 8);
        assert_eq!(config.delivery.overflow, OverflowPolicy::Block);
        assert_eq!(config.message_log, Some(PathBuf::from("/tmp/fix.log")));
        assert!(!config.validate_checksum);
    }

    #[test]
    fn test_message_log_disabled() {
        let config = BridgeConfig::from_lookup(lookup(&[("FIXSTATUS_MESSAGE_LOG", "OFF")]));
        assert!(config.message_log.is_none());
    }

    #[test]
    fn test_checksum_flag_values() {
        for (value, expected) in [("0", false), ("no", false), ("1", true), ("On", true)] {
            let config =
                BridgeConfig::from_lookup(lookup(&[("FIXSTATUS_VALIDATE_CHECKSUM", value)]));
            assert_eq!(config.validate_checksum, expected, "{value}");
        }
    }

    #[test]
    fn test_unparsable_and_blank_values_keep_defaults() {
        let config = BridgeConfig::from_lookup(lookup(&[
            ("FIXSTATUS_FIX_PORT", "not-a-port"),
            ("FIXSTATUS_HEARTBEAT", "-1"),
            ("FIXSTATUS_SINK_ADDR", "  "),
            ("FIXSTATUS_VALIDATE_CHECKSUM", "maybe"),
        ]));
        assert_eq!(config.fix_port, 9876);
        assert_eq!(config.heartbeat_interval, 30);
        assert!(config.sink_addr.is_none());
        assert!(config.validate_checksum);
    }
}
