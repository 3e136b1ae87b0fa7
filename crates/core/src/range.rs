// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::{Position, error::FetchError};

/// Identifier of a split assigned to one fetch task.
#[repr(transparent)]
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SplitId(pub String);

impl SplitId {
	pub fn new(id: impl Into<String>) -> Self {
		Self(id.into())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl Display for SplitId {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<&str> for SplitId {
	fn from(value: &str) -> Self {
		Self(value.to_string())
	}
}

/// Where a stream range stops.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndPosition {
	/// Stop once the stream reaches this position (inclusive).
	Bounded(Position),
	/// Read until the task is closed.
	NoStopping,
}

/// Sentinel for ranges without an end.
pub const NO_STOPPING: EndPosition = EndPosition::NoStopping;

impl Display for EndPosition {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			EndPosition::Bounded(position) => Display::fmt(position, f),
			EndPosition::NoStopping => f.write_str("NO_STOPPING"),
		}
	}
}

/// A contiguous segment of the change stream assigned to one fetch task.
///
/// The end is either [`NO_STOPPING`] or at or after the start; the
/// constructors reject anything else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamRange {
	id: SplitId,
	start: Position,
	end: EndPosition,
}

impl StreamRange {
	pub fn new(id: impl Into<SplitId>, start: Position, end: EndPosition) -> crate::Result<Self> {
		let id = id.into();
		if let EndPosition::Bounded(end) = &end {
			if !end.is_at_or_after(&start) {
				return Err(FetchError::InvalidRange {
					split: id,
					start,
					end: end.clone(),
				});
			}
		}

		Ok(Self {
			id,
			start,
			end,
		})
	}

	pub fn bounded(id: impl Into<SplitId>, start: Position, end: Position) -> crate::Result<Self> {
		Self::new(id, start, EndPosition::Bounded(end))
	}

	pub fn unbounded(id: impl Into<SplitId>, start: Position) -> Self {
		Self {
			id: id.into(),
			start,
			end: NO_STOPPING,
		}
	}

	pub fn id(&self) -> &SplitId {
		&self.id
	}

	pub fn start(&self) -> &Position {
		&self.start
	}

	pub fn end(&self) -> &EndPosition {
		&self.end
	}

	/// The end position of a bounded range.
	pub fn end_position(&self) -> Option<&Position> {
		match &self.end {
			EndPosition::Bounded(position) => Some(position),
			EndPosition::NoStopping => None,
		}
	}

	pub fn is_bounded(&self) -> bool {
		!matches!(self.end, EndPosition::NoStopping)
	}
}

impl Display for StreamRange {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		write!(f, "{}[{}..{}]", self.id, self.start, self.end)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn scn(value: u64) -> Position {
		Position::new().with("scn", value.to_string())
	}

	#[test]
	fn test_bounded_range() {
		let range = StreamRange::bounded("split-0", scn(100), scn(200)).unwrap();
		assert!(range.is_bounded());
		assert_eq!(range.id().as_str(), "split-0");
		assert_eq!(range.start(), &scn(100));
		assert_eq!(range.end_position(), Some(&scn(200)));
	}

	#[test]
	fn test_empty_bounded_range_is_valid() {
		let range = StreamRange::bounded("split-0", scn(100), scn(100)).unwrap();
		assert_eq!(range.end(), &EndPosition::Bounded(scn(100)));
	}

	#[test]
	fn test_end_before_start_rejected() {
		let err = StreamRange::bounded("split-0", scn(200), scn(100)).unwrap_err();
		match err {
			FetchError::InvalidRange {
				split,
				start,
				end,
			} => {
				assert_eq!(split, SplitId::from("split-0"));
				assert_eq!(start, scn(200));
				assert_eq!(end, scn(100));
			}
			other => panic!("Expected InvalidRange, got {:?}", other),
		}
	}

	#[test]
	fn test_unbounded_range() {
		let range = StreamRange::unbounded("stream-split", scn(100));
		assert!(!range.is_bounded());
		assert_eq!(range.end(), &NO_STOPPING);
		assert_eq!(range.end_position(), None);
		assert_eq!(range.to_string(), "stream-split[{scn=100}..NO_STOPPING]");
	}
}
