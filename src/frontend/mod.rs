// SPDX-License-Identifier: MPL-2.0
//! Process boundary for graphical front-ends.
//!
//! - [`relay`]: run the command-line tool as a child and stream its output

pub mod relay;

pub use relay::{spawn, ExitOutcome, RelayEvent, RunRequest};
