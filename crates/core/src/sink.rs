// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::sync::Arc;

use crate::{ChangeEvent, Position, SplitId, WatermarkKind, error::DispatchError};

/// Destination for change events and watermark markers.
///
/// Shared by every fetch task of a reader, so implementations must
/// serialize concurrent dispatches themselves.
pub trait EventSink: Send + Sync {
	fn dispatch_change_event(&self, split: &SplitId, event: ChangeEvent) -> Result<(), DispatchError>;

	fn dispatch_watermark_event(
		&self,
		split: &SplitId,
		position: &Position,
		kind: WatermarkKind,
	) -> Result<(), DispatchError>;
}

impl<T: EventSink + ?Sized> EventSink for Arc<T> {
	fn dispatch_change_event(&self, split: &SplitId, event: ChangeEvent) -> Result<(), DispatchError> {
		(**self).dispatch_change_event(split, event)
	}

	fn dispatch_watermark_event(
		&self,
		split: &SplitId,
		position: &Position,
		kind: WatermarkKind,
	) -> Result<(), DispatchError> {
		(**self).dispatch_watermark_event(split, position, kind)
	}
}
