// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use cdcfetch_core::{ErrorReporter, FetchError};
use parking_lot::Mutex;

/// Error reporter recording every fatal error.
#[derive(Default)]
pub struct RecordingReporter {
	errors: Mutex<Vec<FetchError>>,
}

impl RecordingReporter {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn count(&self) -> usize {
		self.errors.lock().len()
	}

	pub fn take_errors(&self) -> Vec<FetchError> {
		std::mem::take(&mut *self.errors.lock())
	}
}

impl ErrorReporter for RecordingReporter {
	fn report_fatal(&self, error: FetchError) {
		self.errors.lock().push(error);
	}
}
