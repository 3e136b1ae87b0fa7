// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Controller side of a stream split read.
//!
//! The fetcher runs one [`FetchTask`] on a dedicated thread and buffers
//! the records the task dispatches, so a reader can drain them in batches.
//! Fatal errors reported by the task or returned from its thread surface
//! on the next poll.

use std::{
	sync::Arc,
	thread::{self, JoinHandle},
	time::{Duration, Instant},
};

use cdcfetch_core::{FetchError, LogEngine, Result, SourceIdentity, SourceRecord, SplitId, StreamRange};
use crossbeam_channel::{Receiver, RecvTimeoutError};
use tracing::{debug, warn};

use crate::{ChannelEventSink, FetchConfig, FetchTask, FetchTaskContext, SharedErrorReporter};

/// How often `close` checks whether the fetch thread exited
const CLOSE_CHECK_INTERVAL: Duration = Duration::from_millis(10);

pub struct StreamFetcher {
	context: FetchTaskContext,
	receiver: Receiver<SourceRecord>,
	reporter: Arc<SharedErrorReporter>,
	task: Option<Arc<FetchTask>>,
	worker: Option<(SplitId, JoinHandle<Result<()>>)>,
}

impl StreamFetcher {
	pub fn new(engine: Arc<dyn LogEngine>, source: SourceIdentity, config: FetchConfig) -> Self {
		let (sink, receiver) = match config.queue_capacity {
			Some(capacity) => ChannelEventSink::bounded(capacity),
			None => ChannelEventSink::unbounded(),
		};
		let reporter = Arc::new(SharedErrorReporter::new());
		let context =
			FetchTaskContext::new(engine, Arc::new(sink), reporter.clone(), source).with_config(config);

		Self {
			context,
			receiver,
			reporter,
			task: None,
			worker: None,
		}
	}

	/// Starts `task` on a new thread.
	///
	/// Fails if the previous task's thread is still running, or with the
	/// previous task's error if it was never collected.
	pub fn submit(&mut self, task: FetchTask) -> Result<()> {
		if let Some((split, worker)) = &self.worker {
			if !worker.is_finished() {
				return Err(FetchError::FetcherBusy(split.clone()));
			}
		}
		self.reap_worker()?;

		let task = Arc::new(task);
		let split = task.split().id().clone();
		let name = thread_name(&self.context.config().thread_name_prefix, &split);

		let handle = thread::Builder::new()
			.name(name)
			.spawn({
				let task = Arc::clone(&task);
				let context = self.context.clone();
				move || task.execute(&context)
			})
			.map_err(FetchError::Spawn)?;

		debug!(split = %split, "submitted fetch task");
		self.task = Some(task);
		self.worker = Some((split, handle));
		Ok(())
	}

	/// Drains the buffered records, waiting up to `timeout` for the first.
	///
	/// Returns an empty batch when nothing arrived in time.
	pub fn poll_records(&mut self, timeout: Duration) -> Result<Vec<SourceRecord>> {
		self.check_error()?;

		let mut records = Vec::new();
		match self.receiver.recv_timeout(timeout) {
			Ok(record) => {
				records.push(record);
				records.extend(self.receiver.try_iter());
			}
			Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {}
		}
		Ok(records)
	}

	/// True once the fetch thread exited and every record drained.
	pub fn is_finished(&self) -> bool {
		self.worker.is_none() && self.receiver.is_empty()
	}

	pub fn current_task(&self) -> Option<&Arc<FetchTask>> {
		self.task.as_ref()
	}

	pub fn current_split(&self) -> Option<&StreamRange> {
		self.task.as_ref().map(|task| task.split())
	}

	/// Closes the current task and waits up to `timeout` for its thread.
	///
	/// A thread that does not stop in time stays owned by the fetcher: it
	/// exits on its own once the engine observes the cleared running flag,
	/// and until then `is_finished` is false and `submit` refuses new work.
	/// Its result surfaces on a later poll or close. Records still queued
	/// are discarded.
	pub fn close(&mut self, timeout: Duration) -> Result<()> {
		let Some(task) = &self.task else {
			return Ok(());
		};
		task.close();

		if let Some((split, worker)) = self.worker.take() {
			let deadline = Instant::now() + timeout;
			while !worker.is_finished() {
				// a bounded queue may hold the task in dispatch
				self.receiver.try_iter().for_each(drop);
				if Instant::now() >= deadline {
					warn!(split = %split, ?timeout, "fetch thread did not stop in time");
					self.worker = Some((split, worker));
					return Ok(());
				}
				thread::sleep(CLOSE_CHECK_INTERVAL);
			}
			join(split, worker)?;
		}

		self.receiver.try_iter().for_each(drop);
		match self.reporter.take_error() {
			Some(err) => Err(err),
			None => Ok(()),
		}
	}

	fn check_error(&mut self) -> Result<()> {
		if let Some(err) = self.reporter.take_error() {
			return Err(err);
		}
		self.reap_worker()
	}

	fn reap_worker(&mut self) -> Result<()> {
		match self.worker.take_if(|(_, worker)| worker.is_finished()) {
			Some((split, worker)) => join(split, worker),
			None => Ok(()),
		}
	}
}

impl Drop for StreamFetcher {
	fn drop(&mut self) {
		if let Some(task) = &self.task {
			task.close();
		}
	}
}

/// Thread names cannot carry NUL bytes.
fn thread_name(prefix: &str, split: &SplitId) -> String {
	format!("{}-{}", prefix, split).replace('\0', "_")
}

fn join(split: SplitId, worker: JoinHandle<Result<()>>) -> Result<()> {
	match worker.join() {
		Ok(result) => result,
		Err(_) => Err(FetchError::TaskPanicked(split)),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_thread_name() {
		assert_eq!(thread_name("cdc-fetch", &SplitId::from("split-0")), "cdc-fetch-split-0");
		assert_eq!(thread_name("cdc-fetch", &SplitId::from("a\0b")), "cdc-fetch-a_b");
	}
}
