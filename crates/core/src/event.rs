// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::{Position, SplitId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeOp {
	Insert,
	Update,
	Delete,
	/// Row emitted by a snapshot read rather than the log.
	Read,
}

/// A decoded change produced by the log engine.
///
/// The payload is whatever the engine decoded the log record into; this
/// crate never looks inside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
	pub table: String,
	pub op: ChangeOp,
	pub position: Position,
	pub payload: Vec<u8>,
}

impl ChangeEvent {
	pub fn new(table: impl Into<String>, op: ChangeOp, position: Position, payload: Vec<u8>) -> Self {
		Self {
			table: table.into(),
			op,
			position,
			payload,
		}
	}
}

/// Kind of split boundary a watermark marks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WatermarkKind {
	/// Start of a snapshot chunk read.
	Low,
	/// End of a snapshot chunk read.
	High,
	/// End of a bounded log read.
	End,
}

impl Display for WatermarkKind {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			WatermarkKind::Low => f.write_str("LOW"),
			WatermarkKind::High => f.write_str("HIGH"),
			WatermarkKind::End => f.write_str("END"),
		}
	}
}

/// Control marker delimiting a split boundary in the event stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatermarkEvent {
	pub split_id: SplitId,
	pub position: Position,
	pub kind: WatermarkKind,
}

/// Unit queued by sinks that buffer records for a downstream reader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceRecord {
	Change {
		split_id: SplitId,
		event: ChangeEvent,
	},
	Watermark(WatermarkEvent),
}

impl SourceRecord {
	pub fn split_id(&self) -> &SplitId {
		match self {
			SourceRecord::Change {
				split_id,
				..
			} => split_id,
			SourceRecord::Watermark(watermark) => &watermark.split_id,
		}
	}

	pub fn position(&self) -> &Position {
		match self {
			SourceRecord::Change {
				event,
				..
			} => &event.position,
			SourceRecord::Watermark(watermark) => &watermark.position,
		}
	}

	pub fn is_watermark(&self) -> bool {
		matches!(self, SourceRecord::Watermark(_))
	}

	pub fn as_watermark(&self) -> Option<&WatermarkEvent> {
		match self {
			SourceRecord::Watermark(watermark) => Some(watermark),
			SourceRecord::Change {
				..
			} => None,
		}
	}
}
