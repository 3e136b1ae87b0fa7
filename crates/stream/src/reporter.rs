// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use cdcfetch_core::{ErrorReporter, FetchError};
use parking_lot::Mutex;
use tracing::{error, warn};

/// Keeps the first fatal error until the controller collects it.
///
/// Later errors are usually consequences of the first one and are only
/// logged.
#[derive(Default)]
pub struct SharedErrorReporter {
	error: Mutex<Option<FetchError>>,
}

impl SharedErrorReporter {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn has_error(&self) -> bool {
		self.error.lock().is_some()
	}

	/// Takes the recorded error, leaving the reporter empty.
	pub fn take_error(&self) -> Option<FetchError> {
		self.error.lock().take()
	}
}

impl ErrorReporter for SharedErrorReporter {
	fn report_fatal(&self, err: FetchError) {
		let mut slot = self.error.lock();
		if slot.is_some() {
			warn!("dropping fatal error, another one is pending: {}", err);
			return;
		}
		error!("fatal fetch error: {}", err);
		*slot = Some(err);
	}
}
