/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 15/10/26
******************************************************************************/

//! # fixstatus status service
//!
//! Read-only HTTP view of the bridge.
//!
//! | Route | Body |
//! |---|---|
//! | `GET /sessions` | `[{"identity": "...", "status": "Connected"}]`, ordered by identity |
//! | `GET /messages/latest` | Latest canonical message and `captured_at`, or 404 |
//! | `GET /health` | `{"status": "ok"}` |

pub mod server;

pub use server::{LatestMessageView, SessionView, StatusState, router, serve};
