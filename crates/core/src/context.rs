// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Cooperative cancellation for the engine's blocking read loop.
//!
//! The engine never gets interrupted; it polls [`RunContext::is_running`]
//! between reads and returns once it observes `false`. A context stops for
//! one of three reasons:
//! - the owning task was closed (its running flag was cleared)
//! - a bounded read reached its end position
//! - a fatal error was reported for the split

use std::{
	sync::{
		Arc,
		atomic::{AtomicBool, AtomicU8, Ordering},
	},
	thread,
	time::Duration,
};

use tracing::debug;

/// Which termination reasons a context honors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunContextKind {
	/// Runs until the owning task is closed. Used for unbounded ranges.
	OuterDriven,
	/// Additionally stops once the read is finished. Used for bounded ranges.
	CompletionDriven,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
	Closed,
	Completed,
	Failed,
}

const NOT_FINISHED: u8 = 0;
const COMPLETED: u8 = 1;
const FAILED: u8 = 2;

pub struct RunContext {
	kind: RunContextKind,
	running: Arc<AtomicBool>,
	finished: AtomicU8,
	poll_interval: Duration,
}

impl RunContext {
	/// Context that only follows the task's running flag.
	pub fn outer_driven(running: Arc<AtomicBool>, poll_interval: Duration) -> Self {
		Self::new(RunContextKind::OuterDriven, running, poll_interval)
	}

	/// Context that also stops when [`RunContext::finish`] is called.
	pub fn completion_driven(running: Arc<AtomicBool>, poll_interval: Duration) -> Self {
		Self::new(RunContextKind::CompletionDriven, running, poll_interval)
	}

	fn new(kind: RunContextKind, running: Arc<AtomicBool>, poll_interval: Duration) -> Self {
		Self {
			kind,
			running,
			finished: AtomicU8::new(NOT_FINISHED),
			poll_interval,
		}
	}

	pub fn kind(&self) -> RunContextKind {
		self.kind
	}

	pub fn poll_interval(&self) -> Duration {
		self.poll_interval
	}

	pub fn is_running(&self) -> bool {
		self.stop_reason().is_none()
	}

	/// Why the context stopped, or `None` while it is still running.
	///
	/// An internal reason wins over a concurrent close.
	pub fn stop_reason(&self) -> Option<StopReason> {
		match self.finished.load(Ordering::Acquire) {
			COMPLETED => Some(StopReason::Completed),
			FAILED => Some(StopReason::Failed),
			_ if !self.running.load(Ordering::Acquire) => Some(StopReason::Closed),
			_ => None,
		}
	}

	/// Marks a bounded read as finished.
	///
	/// Returns true if this call stopped the context. Outer-driven contexts
	/// ignore it, their only way out is the task's running flag.
	pub fn finish(&self) -> bool {
		if self.kind == RunContextKind::OuterDriven {
			debug!("ignoring finish on an outer-driven run context");
			return false;
		}
		self.finished.compare_exchange(NOT_FINISHED, COMPLETED, Ordering::AcqRel, Ordering::Acquire).is_ok()
	}

	/// Stops the context after a fatal error. Honored by both kinds.
	pub fn fail(&self) -> bool {
		self.finished.compare_exchange(NOT_FINISHED, FAILED, Ordering::AcqRel, Ordering::Acquire).is_ok()
	}

	/// Waits at most one poll interval, returning early if already stopped.
	///
	/// Engines call this when there is nothing to read so the running flag
	/// is observed at a bounded cadence.
	pub fn idle(&self) {
		if self.is_running() {
			thread::sleep(self.poll_interval);
		}
	}
}
