// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Log stream positions.
//!
//! A [`Position`] is a set of named coordinates (for example `scn` and
//! `commit_scn` for a redo log) describing how far a reader has progressed
//! through a change stream. Values are kept as strings since the engine
//! reports them that way; comparison interprets them numerically when both
//! sides are numbers.

use std::{
	cmp::Ordering,
	collections::BTreeMap,
	fmt::{self, Display, Formatter},
};

use serde::{Deserialize, Serialize};

/// Immutable set of log coordinates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Position(BTreeMap<String, String>);

impl Position {
	/// Value stored for a component the engine reported without a value.
	pub const UNSET: &'static str = "null";

	pub fn new() -> Self {
		Self(BTreeMap::new())
	}

	/// Returns a copy of this position with `key` set to `value`.
	pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.0.insert(key.into(), value.into());
		self
	}

	/// Builds a position from a raw engine offset.
	///
	/// Components without a value are kept under [`Position::UNSET`] so that
	/// comparison never fails on them.
	pub fn from_offset_map<K, V, I>(offset: I) -> Self
	where
		I: IntoIterator<Item = (K, Option<V>)>,
		K: Into<String>,
		V: ToString,
	{
		Self(offset
			.into_iter()
			.map(|(key, value)| {
				let value = value.map(|v| v.to_string()).unwrap_or_else(|| Self::UNSET.to_string());
				(key.into(), value)
			})
			.collect())
	}

	pub fn get(&self, key: &str) -> Option<&str> {
		self.0.get(key).map(String::as_str)
	}

	pub fn components(&self) -> impl Iterator<Item = (&str, &str)> {
		self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Returns true when this position has reached `target`.
	///
	/// Every component named by `target` must be at or above the target's
	/// value. A missing or unset component is lower than any set value, so a
	/// position lacking a coordinate the target has never reaches it. The
	/// check is inclusive: a position equal to the target has reached it.
	pub fn is_at_or_after(&self, target: &Position) -> bool {
		target.0.iter().all(|(key, expected)| {
			compare_component(self.get(key), Some(expected.as_str())) != Ordering::Less
		})
	}
}

impl Display for Position {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.write_str("{")?;
		for (idx, (key, value)) in self.0.iter().enumerate() {
			if idx > 0 {
				f.write_str(", ")?;
			}
			write!(f, "{}={}", key, value)?;
		}
		f.write_str("}")
	}
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Position {
	fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
		Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
	}
}

fn compare_component(lhs: Option<&str>, rhs: Option<&str>) -> Ordering {
	let lhs = lhs.filter(|v| *v != Position::UNSET);
	let rhs = rhs.filter(|v| *v != Position::UNSET);

	match (lhs, rhs) {
		(None, None) => Ordering::Equal,
		(None, Some(_)) => Ordering::Less,
		(Some(_), None) => Ordering::Greater,
		(Some(l), Some(r)) if is_decimal(l) && is_decimal(r) => {
			// magnitude first, so values of any width compare numerically
			let l = l.trim_start_matches('0');
			let r = r.trim_start_matches('0');
			l.len().cmp(&r.len()).then_with(|| l.cmp(r))
		}
		(Some(l), Some(r)) => l.cmp(r),
	}
}

fn is_decimal(value: &str) -> bool {
	!value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}
