// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::sync::atomic::{AtomicUsize, Ordering};

use cdcfetch_core::{
	ChangeEvent, EventSink, Position, SourceRecord, SplitId, WatermarkEvent, WatermarkKind, error::DispatchError,
};
use parking_lot::Mutex;

/// Event sink recording everything it accepts.
#[derive(Default)]
pub struct RecordingSink {
	records: Mutex<Vec<SourceRecord>>,
	failing_watermarks: AtomicUsize,
	watermark_attempts: AtomicUsize,
}

impl RecordingSink {
	pub fn new() -> Self {
		Self::default()
	}

	/// Sink whose next `count` watermark dispatches fail as interrupted.
	pub fn failing_watermarks(count: usize) -> Self {
		Self {
			failing_watermarks: AtomicUsize::new(count),
			..Self::default()
		}
	}

	pub fn records(&self) -> Vec<SourceRecord> {
		self.records.lock().clone()
	}

	pub fn watermarks(&self) -> Vec<WatermarkEvent> {
		self.records.lock().iter().filter_map(|record| record.as_watermark().cloned()).collect()
	}

	pub fn change_events(&self) -> Vec<ChangeEvent> {
		self.records
			.lock()
			.iter()
			.filter_map(|record| match record {
				SourceRecord::Change {
					event,
					..
				} => Some(event.clone()),
				SourceRecord::Watermark(_) => None,
			})
			.collect()
	}

	/// Watermark dispatches attempted, including failed ones.
	pub fn watermark_attempts(&self) -> usize {
		self.watermark_attempts.load(Ordering::SeqCst)
	}
}

impl EventSink for RecordingSink {
	fn dispatch_change_event(&self, split: &SplitId, event: ChangeEvent) -> Result<(), DispatchError> {
		self.records.lock().push(SourceRecord::Change {
			split_id: split.clone(),
			event,
		});
		Ok(())
	}

	fn dispatch_watermark_event(
		&self,
		split: &SplitId,
		position: &Position,
		kind: WatermarkKind,
	) -> Result<(), DispatchError> {
		self.watermark_attempts.fetch_add(1, Ordering::SeqCst);

		let fail = self
			.failing_watermarks
			.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
			.is_ok();
		if fail {
			return Err(DispatchError::Interrupted);
		}

		self.records.lock().push(SourceRecord::Watermark(WatermarkEvent {
			split_id: split.clone(),
			position: position.clone(),
			kind,
		}));
		Ok(())
	}
}
