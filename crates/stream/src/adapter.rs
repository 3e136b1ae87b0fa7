// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::sync::Arc;

use cdcfetch_core::{
	ChangeEvent, ErrorReporter, EventSink, FetchError, LogEngine, Position, PositionObserver, RunContext,
	SourceIdentity, StreamRange, WatermarkKind, error::EngineError,
};
use tracing::{debug, error, info, trace};

/// Runs the log engine for one stream range.
///
/// The adapter registers itself with the engine as the position observer:
/// change events are forwarded to the sink while the run context is
/// running, and after every position advance a bounded range is checked
/// against its end position. Reaching it emits the END watermark and
/// finishes the run context, which makes the engine return.
pub struct LogEngineAdapter {
	range: StreamRange,
	engine: Arc<dyn LogEngine>,
	sink: Arc<dyn EventSink>,
	reporter: Arc<dyn ErrorReporter>,
	source: SourceIdentity,
}

impl LogEngineAdapter {
	pub fn new(
		range: StreamRange,
		engine: Arc<dyn LogEngine>,
		sink: Arc<dyn EventSink>,
		reporter: Arc<dyn ErrorReporter>,
		source: SourceIdentity,
	) -> Self {
		Self {
			range,
			engine,
			sink,
			reporter,
			source,
		}
	}

	pub fn range(&self) -> &StreamRange {
		&self.range
	}

	/// Blocks in the engine until `run` stops or the engine fails.
	pub fn execute(&self, run: &RunContext) -> Result<(), EngineError> {
		debug!(split = %self.range.id(), start = %self.range.start(), end = %self.range.end(), "starting log read");

		let observer = SplitObserver {
			adapter: self,
			run,
		};
		let result = self.engine.execute(run, &self.source, self.range.start(), &observer);

		match &result {
			Ok(()) => debug!(split = %self.range.id(), reason = ?run.stop_reason(), "log read stopped"),
			Err(err) => error!(split = %self.range.id(), "log engine failed: {}", err),
		}
		result
	}

	/// Checks whether a bounded read is done after the engine advanced.
	pub fn after_position_advance(&self, run: &RunContext, position: &Position) {
		let Some(end) = self.range.end_position() else {
			return;
		};

		// already completed, closed or failed
		if !run.is_running() {
			return;
		}

		if !position.is_at_or_after(end) {
			return;
		}

		info!(split = %self.range.id(), %position, %end, "log read reached high watermark");

		let split = self.range.id();
		match self.sink.dispatch_watermark_event(split, position, WatermarkKind::End) {
			Ok(()) => {
				run.finish();
			}
			Err(err) => {
				error!(split = %split, "sending log end watermark failed: {}", err);
				self.reporter.report_fatal(FetchError::watermark_dispatch(split.clone(), err));
				run.fail();
			}
		}
	}

	/// Forwards a decoded change event unless the read already stopped.
	pub fn on_change_event(&self, run: &RunContext, event: ChangeEvent) {
		if !run.is_running() {
			trace!(split = %self.range.id(), position = %event.position, "dropping change event after stop");
			return;
		}

		let split = self.range.id();
		if let Err(err) = self.sink.dispatch_change_event(split, event) {
			error!(split = %split, "dispatching change event failed: {}", err);
			self.reporter.report_fatal(FetchError::change_dispatch(split.clone(), err));
			run.fail();
		}
	}
}

struct SplitObserver<'a> {
	adapter: &'a LogEngineAdapter,
	run: &'a RunContext,
}

impl PositionObserver for SplitObserver<'_> {
	fn on_change_event(&self, event: ChangeEvent) {
		self.adapter.on_change_event(self.run, event);
	}

	fn after_position_advance(&self, position: &Position) {
		self.adapter.after_position_advance(self.run, position);
	}
}

#[cfg(test)]
mod tests {
	use std::{
		sync::atomic::{AtomicBool, Ordering},
		time::Duration,
	};

	use cdcfetch_core::{ChangeOp, SourceRecord, StopReason};
	use cdcfetch_testing::{RecordingReporter, RecordingSink, ScriptedEngine, scn};

	use super::*;

	const INTERVAL: Duration = Duration::from_millis(1);

	fn adapter(range: StreamRange, sink: Arc<RecordingSink>, reporter: Arc<RecordingReporter>) -> LogEngineAdapter {
		LogEngineAdapter::new(range, Arc::new(ScriptedEngine::new()), sink, reporter, SourceIdentity::new("ORCLCDB"))
	}

	fn bounded_context() -> RunContext {
		RunContext::completion_driven(Arc::new(AtomicBool::new(true)), INTERVAL)
	}

	#[test]
	fn test_no_watermark_before_end() {
		let sink = Arc::new(RecordingSink::new());
		let reporter = Arc::new(RecordingReporter::new());
		let range = StreamRange::bounded("split-0", scn(100), scn(200)).unwrap();
		let adapter = adapter(range, sink.clone(), reporter);
		let run = bounded_context();

		adapter.after_position_advance(&run, &scn(100));
		adapter.after_position_advance(&run, &scn(199));

		assert!(sink.watermarks().is_empty());
		assert!(run.is_running());
	}

	#[test]
	fn test_watermark_at_exact_end() {
		let sink = Arc::new(RecordingSink::new());
		let reporter = Arc::new(RecordingReporter::new());
		let range = StreamRange::bounded("split-0", scn(100), scn(200)).unwrap();
		let adapter = adapter(range, sink.clone(), reporter);
		let run = bounded_context();

		adapter.after_position_advance(&run, &scn(200));

		let watermarks = sink.watermarks();
		assert_eq!(watermarks.len(), 1);
		assert_eq!(watermarks[0].kind, WatermarkKind::End);
		assert_eq!(watermarks[0].position, scn(200));
		assert_eq!(run.stop_reason(), Some(StopReason::Completed));
	}

	#[test]
	fn test_watermark_emitted_once() {
		let sink = Arc::new(RecordingSink::new());
		let reporter = Arc::new(RecordingReporter::new());
		let range = StreamRange::bounded("split-0", scn(100), scn(200)).unwrap();
		let adapter = adapter(range, sink.clone(), reporter);
		let run = bounded_context();

		adapter.after_position_advance(&run, &scn(250));
		adapter.after_position_advance(&run, &scn(300));

		assert_eq!(sink.watermarks().len(), 1);
		assert_eq!(sink.watermarks()[0].position, scn(250));
	}

	#[test]
	fn test_unbounded_never_checks() {
		let sink = Arc::new(RecordingSink::new());
		let reporter = Arc::new(RecordingReporter::new());
		let adapter = adapter(StreamRange::unbounded("stream", scn(100)), sink.clone(), reporter);
		let run = RunContext::outer_driven(Arc::new(AtomicBool::new(true)), INTERVAL);

		for value in [100, 200, u64::MAX] {
			adapter.after_position_advance(&run, &scn(value));
		}

		assert!(sink.watermarks().is_empty());
		assert!(run.is_running());
	}

	#[test]
	fn test_watermark_failure_reported_once() {
		let sink = Arc::new(RecordingSink::failing_watermarks(1));
		let reporter = Arc::new(RecordingReporter::new());
		let range = StreamRange::bounded("split-0", scn(100), scn(200)).unwrap();
		let adapter = adapter(range, sink.clone(), reporter.clone());
		let run = bounded_context();

		adapter.after_position_advance(&run, &scn(200));
		adapter.after_position_advance(&run, &scn(201));

		assert_eq!(sink.watermark_attempts(), 1);
		assert!(sink.watermarks().is_empty());
		let errors = reporter.take_errors();
		assert_eq!(errors.len(), 1);
		assert!(matches!(
			errors[0],
			FetchError::Dispatch {
				event: "watermark",
				..
			}
		));
		assert_eq!(run.stop_reason(), Some(StopReason::Failed));
	}

	#[test]
	fn test_change_events_dropped_after_completion() {
		let sink = Arc::new(RecordingSink::new());
		let reporter = Arc::new(RecordingReporter::new());
		let range = StreamRange::bounded("split-0", scn(100), scn(200)).unwrap();
		let adapter = adapter(range, sink.clone(), reporter);
		let run = bounded_context();

		adapter.on_change_event(&run, ChangeEvent::new("DEBEZIUM.ORDERS", ChangeOp::Insert, scn(150), vec![1]));
		adapter.after_position_advance(&run, &scn(200));
		adapter.on_change_event(&run, ChangeEvent::new("DEBEZIUM.ORDERS", ChangeOp::Update, scn(210), vec![2]));

		let records = sink.records();
		assert_eq!(records.len(), 2);
		assert!(matches!(records[0], SourceRecord::Change { .. }));
		assert!(records[1].is_watermark());
	}

	#[test]
	fn test_change_events_dropped_after_close() {
		let sink = Arc::new(RecordingSink::new());
		let reporter = Arc::new(RecordingReporter::new());
		let running = Arc::new(AtomicBool::new(true));
		let adapter = adapter(StreamRange::unbounded("stream", scn(100)), sink.clone(), reporter);
		let run = RunContext::outer_driven(running.clone(), INTERVAL);

		running.store(false, Ordering::Release);
		adapter.on_change_event(&run, ChangeEvent::new("DEBEZIUM.ORDERS", ChangeOp::Delete, scn(150), vec![]));

		assert!(sink.records().is_empty());
	}
}
