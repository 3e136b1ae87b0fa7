// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Test doubles for the fetch task's collaborators.

mod engine;
mod reporter;
mod sink;
pub mod util;

use cdcfetch_core::{ChangeEvent, ChangeOp, Position};
pub use engine::{ScriptedEngine, Step};
pub use reporter::RecordingReporter;
pub use sink::RecordingSink;
pub use util::wait::{wait_for, wait_for_condition};

/// Redo log position with only a system change number.
pub fn scn(value: u64) -> Position {
	Position::new().with("scn", value.to_string())
}

/// Insert into `table` observed at `scn`.
pub fn insert(table: &str, at: u64) -> ChangeEvent {
	ChangeEvent::new(table, ChangeOp::Insert, scn(at), at.to_be_bytes().to_vec())
}
