/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 15/10/26
******************************************************************************/

//! # fixstatus engine
//!
//! Glue between a FIX engine and the rest of fixstatus.
//!
//! This crate provides:
//! - **Application trait**: Lifecycle and interception callbacks an engine drives
//! - **SessionSender trait**: Send-to-session capability used for outbound batches
//! - **BridgeApplication**: Tracks connectivity and forwards inbound messages for delivery
//! - **ActiveSessionCoordinator**: Waits for a logon, sends the import, then watches the session
//! - **BridgeConfig**: Environment-driven configuration

pub mod application;
pub mod bridge;
pub mod config;
pub mod coordinator;

pub use application::{Application, RejectReason, SessionSender};
pub use bridge::BridgeApplication;
pub use config::BridgeConfig;
pub use coordinator::{
    ActiveSessionCoordinator, BatchReport, CoordinatorConfig, CoordinatorOutcome,
    CoordinatorState, TerminationReason,
};
