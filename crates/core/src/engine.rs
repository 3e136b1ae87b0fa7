// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{ChangeEvent, Position, RunContext, error::EngineError};

/// Identifies the captured source (database, partition) to the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceIdentity {
	pub name: String,
	pub partition: BTreeMap<String, String>,
}

impl SourceIdentity {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			partition: BTreeMap::new(),
		}
	}

	pub fn with_partition(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.partition.insert(key.into(), value.into());
		self
	}
}

/// Callbacks the engine invokes on its own processing thread.
pub trait PositionObserver {
	/// A change event was decoded from the log.
	fn on_change_event(&self, event: ChangeEvent);

	/// The engine's current position moved to `position`.
	fn after_position_advance(&self, position: &Position);
}

/// External log-mining engine.
///
/// `execute` blocks, reading the log from `start`, and returns once
/// `run.is_running()` is false or the engine fails. Implementations must
/// poll the run context between reads, using [`RunContext::idle`] when
/// there is nothing to read.
pub trait LogEngine: Send + Sync {
	fn execute(
		&self,
		run: &RunContext,
		source: &SourceIdentity,
		start: &Position,
		observer: &dyn PositionObserver,
	) -> Result<(), EngineError>;
}
