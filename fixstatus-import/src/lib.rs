/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 15/10/26
******************************************************************************/

//! # fixstatus Import
//!
//! Outbound messages from a tabular import.
//!
//! The first row of the import names the columns. `MsgType`, `SenderCompID`,
//! and `TargetCompID` are required; every other column is named by the FIX tag
//! number its cells are written to.
//!
//! ```text
//! MsgType,SenderCompID,TargetCompID,11,55,54,38,44
//! D,CLIENT,BROKER,ORD-1,AAPL,1,100,150.25
//! ```

pub mod builder;
pub mod record;

pub use builder::{MSG_TYPE_COLUMN, OutboundBuilder, SENDER_COLUMN, TARGET_COLUMN};
pub use record::{ImportRecord, read_import, read_import_from};
