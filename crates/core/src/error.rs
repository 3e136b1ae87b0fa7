// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Fetch task error types.
//!
//! Observing a stopped run context is not an error; everything here is a
//! real failure and is surfaced immediately. Nothing is retried.

use crate::{Position, SplitId};

/// Failure raised by the external log-mining engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
	#[error("log engine failed: {0}")]
	Failed(String),

	#[error("log engine i/o error: {0}")]
	Io(#[from] std::io::Error),

	#[error("log engine interrupted")]
	Interrupted,
}

/// Failure to hand an event to the event sink.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
	#[error("event sink disconnected")]
	Disconnected,

	#[error("event sink interrupted")]
	Interrupted,

	#[error("event sink rejected event: {0}")]
	Rejected(String),
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
	#[error(transparent)]
	Engine(#[from] EngineError),

	#[error("error processing log {event} event of split {split}")]
	Dispatch {
		split: SplitId,
		event: &'static str,
		#[source]
		source: DispatchError,
	},

	#[error("split {split} ends at {end} before its start {start}")]
	InvalidRange {
		split: SplitId,
		start: Position,
		end: Position,
	},

	#[error("fetch task for split {0} was already executed")]
	AlreadyExecuted(SplitId),

	#[error("fetcher is still running split {0}")]
	FetcherBusy(SplitId),

	#[error("failed to spawn fetch thread: {0}")]
	Spawn(#[source] std::io::Error),

	#[error("fetch thread of split {0} panicked")]
	TaskPanicked(SplitId),
}

impl FetchError {
	pub fn watermark_dispatch(split: SplitId, source: DispatchError) -> Self {
		FetchError::Dispatch {
			split,
			event: "watermark",
			source,
		}
	}

	pub fn change_dispatch(split: SplitId, source: DispatchError) -> Self {
		FetchError::Dispatch {
			split,
			event: "change",
			source,
		}
	}
}

pub type Result<T> = std::result::Result<T, FetchError>;
