use serde::{Deserialize, Serialize};

/// Point in time view of a path on the filesystem service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Metadata {
	pub path: String,
	pub exists: bool,
	pub is_directory: bool,
	/// Milliseconds since the Unix epoch, as reported by the service
	pub last_modified_ms: i64,
	/// A complete entry is fully written and safe to be consumed
	pub is_complete: bool,
}

impl Metadata {
	#[must_use]
	pub fn file(path: impl Into<String>, last_modified_ms: i64) -> Self {
		Self {
			path: path.into(),
			exists: true,
			is_directory: false,
			last_modified_ms,
			is_complete: true,
		}
	}

	#[must_use]
	pub fn directory(path: impl Into<String>, last_modified_ms: i64) -> Self {
		Self {
			path: path.into(),
			exists: true,
			is_directory: true,
			last_modified_ms,
			is_complete: true,
		}
	}

	/// Marks this entry as still being written
	#[must_use]
	pub fn incomplete(mut self) -> Self {
		self.is_complete = false;
		self
	}

	/// Whether `self` is strictly newer than `other`; equal or older timestamps never count as updates
	#[must_use]
	pub const fn is_newer_than(&self, other: &Self) -> bool {
		self.last_modified_ms > other.last_modified_ms
	}
}
