// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use tracing_subscriber::EnvFilter;

/// Builder for the process-wide tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level.
#[derive(Debug, Clone)]
pub struct TracingBuilder {
	level: String,
	json: bool,
	thread_names: bool,
	target: bool,
	test_writer: bool,
}

impl TracingBuilder {
	pub fn new() -> Self {
		Self {
			level: "info".to_string(),
			json: false,
			thread_names: true,
			target: true,
			test_writer: false,
		}
	}

	/// Builder for tests: debug output captured by the test harness.
	pub fn testing() -> Self {
		Self::new().with_level("debug").with_test_writer()
	}

	pub fn with_level(mut self, level: impl Into<String>) -> Self {
		self.level = level.into();
		self
	}

	pub fn with_json(mut self) -> Self {
		self.json = true;
		self
	}

	pub fn with_thread_names(mut self, enabled: bool) -> Self {
		self.thread_names = enabled;
		self
	}

	pub fn with_target(mut self, enabled: bool) -> Self {
		self.target = enabled;
		self
	}

	pub fn with_test_writer(mut self) -> Self {
		self.test_writer = true;
		self
	}

	fn filter(&self) -> EnvFilter {
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level))
	}

	/// Installs the subscriber as the global default.
	///
	/// Returns false if a subscriber was already installed, which makes it
	/// safe to call from every test.
	pub fn try_init(self) -> bool {
		let builder = tracing_subscriber::fmt()
			.with_env_filter(self.filter())
			.with_thread_names(self.thread_names)
			.with_target(self.target);

		let result = match (self.json, self.test_writer) {
			(false, false) => builder.try_init(),
			(false, true) => builder.with_test_writer().try_init(),
			(true, false) => builder.json().try_init(),
			(true, true) => builder.json().with_test_writer().try_init(),
		};
		result.is_ok()
	}
}

impl Default for TracingBuilder {
	fn default() -> Self {
		Self::new()
	}
}
