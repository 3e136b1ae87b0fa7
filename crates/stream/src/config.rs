// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::time::Duration;

use serde::Deserialize;

/// Configuration for fetch tasks and the stream fetcher
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
	/// Upper bound on how long the engine waits between running-flag checks
	pub poll_interval: Duration,
	/// Capacity of the fetcher's record queue (None = unbounded)
	pub queue_capacity: Option<usize>,
	/// Prefix of the fetch thread name, followed by the split id
	pub thread_name_prefix: String,
}

impl FetchConfig {
	pub fn new(poll_interval: Duration, queue_capacity: Option<usize>) -> Self {
		Self {
			poll_interval,
			queue_capacity,
			..Self::default()
		}
	}

	pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
		self.poll_interval = poll_interval;
		self
	}

	pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
		self.queue_capacity = Some(capacity);
		self
	}

	pub fn with_thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.thread_name_prefix = prefix.into();
		self
	}
}

impl Default for FetchConfig {
	fn default() -> Self {
		Self {
			poll_interval: Duration::from_millis(100),
			queue_capacity: None,
			thread_name_prefix: "cdc-fetch".to_string(),
		}
	}
}
