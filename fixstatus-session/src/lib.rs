/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 15/10/26
******************************************************************************/

//! # fixstatus Session
//!
//! Session connectivity tracking for the fixstatus bridge.
//!
//! The external engine owns the FIX session state machine. This crate only
//! records what the engine reports through its lifecycle callbacks: which
//! sessions exist and whether each is currently logged on.
//!
//! ## Readers and Writers
//!
//! Lifecycle callbacks write; the coordinator and the status service read
//! through immutable [`RegistrySnapshot`]s, so no reader ever holds the lock
//! while doing its own work.

pub mod registry;

pub use registry::{RegistrySnapshot, SessionRegistry, SessionState};
