// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::sync::Arc;

use crate::FetchError;

/// Receives errors that must abort the owning pipeline.
pub trait ErrorReporter: Send + Sync {
	fn report_fatal(&self, error: FetchError);
}

impl<T: ErrorReporter + ?Sized> ErrorReporter for Arc<T> {
	fn report_fatal(&self, error: FetchError) {
		(**self).report_fatal(error)
	}
}
