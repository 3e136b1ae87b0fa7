// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::sync::{
	Arc,
	atomic::{AtomicBool, Ordering},
};

use cdcfetch_core::{
	ErrorReporter, EventSink, FetchError, LogEngine, Result, RunContext, SourceIdentity, StopReason, StreamRange,
};
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::{FetchConfig, LogEngineAdapter};

/// Collaborators shared by the fetch tasks of one reader.
#[derive(Clone)]
pub struct FetchTaskContext {
	engine: Arc<dyn LogEngine>,
	sink: Arc<dyn EventSink>,
	reporter: Arc<dyn ErrorReporter>,
	source: SourceIdentity,
	config: FetchConfig,
}

impl FetchTaskContext {
	pub fn new(
		engine: Arc<dyn LogEngine>,
		sink: Arc<dyn EventSink>,
		reporter: Arc<dyn ErrorReporter>,
		source: SourceIdentity,
	) -> Self {
		Self {
			engine,
			sink,
			reporter,
			source,
			config: FetchConfig::default(),
		}
	}

	pub fn with_config(mut self, config: FetchConfig) -> Self {
		self.config = config;
		self
	}

	pub fn engine(&self) -> &Arc<dyn LogEngine> {
		&self.engine
	}

	pub fn sink(&self) -> &Arc<dyn EventSink> {
		&self.sink
	}

	pub fn reporter(&self) -> &Arc<dyn ErrorReporter> {
		&self.reporter
	}

	pub fn source(&self) -> &SourceIdentity {
		&self.source
	}

	pub fn config(&self) -> &FetchConfig {
		&self.config
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
	Created,
	Running,
	/// Close requested while running; settles once `execute` returns.
	Closing,
	Completed,
	Closed,
	Failed,
}

impl TaskState {
	pub fn is_terminal(&self) -> bool {
		matches!(self, TaskState::Completed | TaskState::Closed | TaskState::Failed)
	}
}

/// Reads one stream range of the change log.
///
/// A task is single use. `execute` blocks on the calling thread until the
/// read stops; `close` may be called from any other thread and only
/// clears the running flag, which the engine observes at its next poll.
pub struct FetchTask {
	split: StreamRange,
	running: Arc<AtomicBool>,
	state: Mutex<TaskState>,
}

impl FetchTask {
	pub fn new(split: StreamRange) -> Self {
		Self {
			split,
			running: Arc::new(AtomicBool::new(false)),
			state: Mutex::new(TaskState::Created),
		}
	}

	pub fn execute(&self, ctx: &FetchTaskContext) -> Result<()> {
		{
			let mut state = self.state.lock();
			match *state {
				TaskState::Created => {
					*state = TaskState::Running;
					self.running.store(true, Ordering::Release);
				}
				TaskState::Closed => {
					debug!(split = %self.split.id(), "task closed before execution");
					return Ok(());
				}
				_ => return Err(FetchError::AlreadyExecuted(self.split.id().clone())),
			}
		}

		let adapter = LogEngineAdapter::new(
			self.split.clone(),
			Arc::clone(&ctx.engine),
			Arc::clone(&ctx.sink),
			Arc::clone(&ctx.reporter),
			ctx.source.clone(),
		);

		let poll_interval = ctx.config.poll_interval;
		let run = if self.split.is_bounded() {
			RunContext::completion_driven(Arc::clone(&self.running), poll_interval)
		} else {
			RunContext::outer_driven(Arc::clone(&self.running), poll_interval)
		};

		let guard = ExecutionGuard {
			task: self,
		};
		let result = adapter.execute(&run);

		let mut state = self.state.lock();
		let next = match (&result, run.stop_reason()) {
			(Err(_), _) | (Ok(()), Some(StopReason::Failed)) => TaskState::Failed,
			(Ok(()), Some(StopReason::Completed)) => TaskState::Completed,
			(Ok(()), Some(StopReason::Closed)) => TaskState::Closed,
			(Ok(()), None) => {
				warn!(split = %self.split.id(), "log engine returned while the task was still running");
				if *state == TaskState::Closing {
					TaskState::Closed
				} else {
					TaskState::Completed
				}
			}
		};
		*state = next;
		self.running.store(false, Ordering::Release);
		drop(state);
		drop(guard);

		debug!(split = %self.split.id(), state = ?next, "fetch task finished");
		result.map_err(FetchError::from)
	}

	pub fn is_running(&self) -> bool {
		self.running.load(Ordering::Acquire)
	}

	pub fn split(&self) -> &StreamRange {
		&self.split
	}

	pub fn state(&self) -> TaskState {
		*self.state.lock()
	}

	/// Requests cooperative shutdown. Never blocks on the running read.
	///
	/// A running task only moves to `Closing`; its final state is decided
	/// when `execute` returns.
	pub fn close(&self) {
		let mut state = self.state.lock();
		match *state {
			TaskState::Created => *state = TaskState::Closed,
			TaskState::Running => *state = TaskState::Closing,
			_ => {}
		}
		self.running.store(false, Ordering::Release);
	}
}

/// Clears the running flag when `execute` leaves, including by unwinding.
///
/// A task still `Running` or `Closing` at that point never reached its
/// final state and is marked `Failed`.
struct ExecutionGuard<'a> {
	task: &'a FetchTask,
}

impl Drop for ExecutionGuard<'_> {
	fn drop(&mut self) {
		let mut state = self.task.state.lock();
		if matches!(*state, TaskState::Running | TaskState::Closing) {
			warn!(split = %self.task.split.id(), "fetch task unwound before settling");
			*state = TaskState::Failed;
		}
		self.task.running.store(false, Ordering::Release);
	}
}

#[cfg(test)]
mod tests {
	use std::{thread, time::Duration};

	use cdcfetch_core::EngineError;
	use cdcfetch_testing::{RecordingReporter, RecordingSink, ScriptedEngine, Step, scn, wait_for};

	use super::*;

	fn context(engine: Arc<ScriptedEngine>, sink: Arc<RecordingSink>) -> FetchTaskContext {
		FetchTaskContext::new(engine, sink, Arc::new(RecordingReporter::new()), SourceIdentity::new("ORCLCDB"))
			.with_config(FetchConfig::default().with_poll_interval(std::time::Duration::from_millis(1)))
	}

	#[test]
	fn test_new_task_is_idle() {
		let task = FetchTask::new(StreamRange::unbounded("stream", scn(1)));
		assert!(!task.is_running());
		assert_eq!(task.state(), TaskState::Created);
		assert_eq!(task.split().id().as_str(), "stream");
	}

	#[test]
	fn test_close_before_execute() {
		let engine = Arc::new(ScriptedEngine::new());
		let sink = Arc::new(RecordingSink::new());
		let task = FetchTask::new(StreamRange::unbounded("stream", scn(1)));

		task.close();
		task.execute(&context(engine.clone(), sink.clone())).unwrap();

		assert_eq!(engine.executions(), 0);
		assert!(sink.records().is_empty());
		assert!(!task.is_running());
		assert_eq!(task.state(), TaskState::Closed);
	}

	#[test]
	fn test_close_is_idempotent() {
		let task = FetchTask::new(StreamRange::unbounded("stream", scn(1)));
		task.close();
		task.close();
		assert_eq!(task.state(), TaskState::Closed);
		assert!(!task.is_running());
	}

	#[test]
	fn test_bounded_task_completes() {
		let engine = Arc::new(ScriptedEngine::with_steps([
			Step::Advance(scn(100)),
			Step::Advance(scn(150)),
			Step::Advance(scn(200)),
		]));
		let sink = Arc::new(RecordingSink::new());
		let task = FetchTask::new(StreamRange::bounded("split-0", scn(100), scn(200)).unwrap());

		task.execute(&context(engine, sink.clone())).unwrap();

		assert_eq!(task.state(), TaskState::Completed);
		assert!(!task.is_running());
		assert_eq!(sink.watermarks().len(), 1);
	}

	#[test]
	fn test_single_use() {
		let engine = Arc::new(ScriptedEngine::with_steps([Step::Advance(scn(200))]));
		let sink = Arc::new(RecordingSink::new());
		let ctx = context(engine, sink);
		let task = FetchTask::new(StreamRange::bounded("split-0", scn(100), scn(200)).unwrap());

		task.execute(&ctx).unwrap();
		let err = task.execute(&ctx).unwrap_err();
		assert!(matches!(err, FetchError::AlreadyExecuted(_)));
		assert_eq!(task.state(), TaskState::Completed);
	}

	#[test]
	fn test_engine_error_propagates() {
		let engine = Arc::new(ScriptedEngine::with_steps([
			Step::Advance(scn(100)),
			Step::Fail("ORA-00310: archived log contains sequence 42".to_string()),
		]));
		let sink = Arc::new(RecordingSink::new());
		let task = FetchTask::new(StreamRange::unbounded("stream", scn(100)));

		let err = task.execute(&context(engine, sink)).unwrap_err();

		assert!(matches!(err, FetchError::Engine(EngineError::Failed(_))));
		assert_eq!(task.state(), TaskState::Failed);
		assert!(!task.is_running());
	}

	#[test]
	fn test_engine_panic_clears_running_flag() {
		let engine = Arc::new(ScriptedEngine::with_steps([
			Step::Advance(scn(100)),
			Step::Panic("redo log decoder crashed".to_string()),
		]));
		let sink = Arc::new(RecordingSink::new());
		let task = Arc::new(FetchTask::new(StreamRange::unbounded("stream", scn(100))));
		let ctx = context(engine, sink);

		let worker = thread::spawn({
			let task = task.clone();
			move || task.execute(&ctx)
		});

		assert!(worker.join().is_err());
		assert!(!task.is_running());
		assert_eq!(task.state(), TaskState::Failed);
	}

	#[test]
	fn test_close_while_running_is_not_terminal() {
		let engine = Arc::new(ScriptedEngine::with_steps([
			Step::Advance(scn(100)),
			Step::Stall(Duration::from_millis(100)),
			Step::Fail("ORA-03113: end-of-file on communication channel".to_string()),
		]));
		let sink = Arc::new(RecordingSink::new());
		let task = Arc::new(FetchTask::new(StreamRange::unbounded("stream", scn(100))));
		let ctx = context(engine.clone(), sink);

		let worker = thread::spawn({
			let task = task.clone();
			move || task.execute(&ctx)
		});

		wait_for(|| engine.stalls() == 1, "engine stalls in a read");
		task.close();
		assert_eq!(task.state(), TaskState::Closing);
		assert!(!task.state().is_terminal());

		let err = worker.join().unwrap().unwrap_err();
		assert!(matches!(err, FetchError::Engine(EngineError::Failed(_))));
		assert_eq!(task.state(), TaskState::Failed);
		assert!(!task.is_running());
	}
}
