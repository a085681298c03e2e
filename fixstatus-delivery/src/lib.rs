/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 15/10/26
******************************************************************************/

//! # fixstatus Delivery
//!
//! Best-effort forwarding of serialized canonical messages.
//!
//! This crate provides:
//! - **Sinks**: append-only file, one-shot TCP, and an in-process latest-value cache
//! - **Dispatcher**: a bounded queue and pump task decoupling producers from sinks
//! - **Message log**: append-only record of raw FIX frames and session events
//!
//! ## Overflow
//!
//! Producers never wait on a sink. When the queue is full the configured
//! [`OverflowPolicy`] either drops the new message or makes the producer wait
//! for queue space; sink latency only ever affects the pump.

pub mod dispatcher;
pub mod message_log;
pub mod sink;

pub use dispatcher::{DeliveryConfig, DeliveryHandle, DeliveryStats, OverflowPolicy, spawn};
pub use message_log::{LogDirection, MessageLog};
pub use sink::{CachedMessage, FileSink, LatestMessageCache, Sink, TcpSink};
