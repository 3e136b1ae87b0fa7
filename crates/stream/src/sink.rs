// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use cdcfetch_core::{
	ChangeEvent, EventSink, Position, SourceRecord, SplitId, WatermarkEvent, WatermarkKind, error::DispatchError,
};
use crossbeam_channel::{Receiver, Sender, bounded, unbounded};

/// Event sink that queues records on a channel for a downstream reader.
///
/// Clones share the same channel, so several tasks can dispatch into one
/// queue concurrently.
#[derive(Clone)]
pub struct ChannelEventSink {
	sender: Sender<SourceRecord>,
}

impl ChannelEventSink {
	/// Sink with an unbounded backlog. Dispatch never blocks.
	pub fn unbounded() -> (Self, Receiver<SourceRecord>) {
		let (sender, receiver) = unbounded();
		(
			Self {
				sender,
			},
			receiver,
		)
	}

	/// Sink that blocks dispatch while `capacity` records are queued.
	pub fn bounded(capacity: usize) -> (Self, Receiver<SourceRecord>) {
		let (sender, receiver) = bounded(capacity);
		(
			Self {
				sender,
			},
			receiver,
		)
	}

	fn send(&self, record: SourceRecord) -> Result<(), DispatchError> {
		self.sender.send(record).map_err(|_| DispatchError::Disconnected)
	}
}

impl EventSink for ChannelEventSink {
	fn dispatch_change_event(&self, split: &SplitId, event: ChangeEvent) -> Result<(), DispatchError> {
		self.send(SourceRecord::Change {
			split_id: split.clone(),
			event,
		})
	}

	fn dispatch_watermark_event(
		&self,
		split: &SplitId,
		position: &Position,
		kind: WatermarkKind,
	) -> Result<(), DispatchError> {
		self.send(SourceRecord::Watermark(WatermarkEvent {
			split_id: split.clone(),
			position: position.clone(),
			kind,
		}))
	}
}

#[cfg(test)]
mod tests {
	use cdcfetch_core::ChangeOp;
	use cdcfetch_testing::scn;

	use super::*;

	#[test]
	fn test_records_in_dispatch_order() {
		let (sink, receiver) = ChannelEventSink::unbounded();
		let split = SplitId::from("split-0");

		sink.dispatch_change_event(&split, ChangeEvent::new("DEBEZIUM.ORDERS", ChangeOp::Insert, scn(10), vec![]))
			.unwrap();
		sink.dispatch_watermark_event(&split, &scn(20), WatermarkKind::End).unwrap();

		let records: Vec<_> = receiver.try_iter().collect();
		assert_eq!(records.len(), 2);
		assert_eq!(records[0].position(), &scn(10));
		assert_eq!(
			records[1].as_watermark(),
			Some(&WatermarkEvent {
				split_id: split,
				position: scn(20),
				kind: WatermarkKind::End,
			})
		);
	}

	#[test]
	fn test_disconnected_receiver() {
		let (sink, receiver) = ChannelEventSink::bounded(1);
		drop(receiver);

		let err = sink.dispatch_watermark_event(&SplitId::from("split-0"), &scn(1), WatermarkKind::End).unwrap_err();
		assert_eq!(err, DispatchError::Disconnected);
	}
}
