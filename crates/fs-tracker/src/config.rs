use crate::error::Error;

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;
pub const DEFAULT_WORKER_COUNT: usize = 4;
pub const DEFAULT_QUERY_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_SHUTDOWN_TIMEOUT_MS: u64 = 100_000;

/// Configuration for the [`Tracker`](crate::Tracker)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
	/// Interval between two polls of the same registration
	pub poll_interval_ms: u64,
	/// How many polls may query the filesystem service at the same time
	pub worker_count: usize,
	/// Upper bound for a single metadata or listing query
	pub query_timeout_ms: u64,
	/// How long shutdown waits for in-flight polls before aborting them
	pub shutdown_timeout_ms: u64,
}

impl Default for TrackerConfig {
	fn default() -> Self {
		Self {
			poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
			worker_count: DEFAULT_WORKER_COUNT,
			query_timeout_ms: DEFAULT_QUERY_TIMEOUT_MS,
			shutdown_timeout_ms: DEFAULT_SHUTDOWN_TIMEOUT_MS,
		}
	}
}

impl TrackerConfig {
	#[must_use]
	pub const fn with_poll_interval_ms(mut self, poll_interval_ms: u64) -> Self {
		self.poll_interval_ms = poll_interval_ms;
		self
	}

	#[must_use]
	pub const fn with_worker_count(mut self, worker_count: usize) -> Self {
		self.worker_count = worker_count;
		self
	}

	#[must_use]
	pub const fn with_query_timeout_ms(mut self, query_timeout_ms: u64) -> Self {
		self.query_timeout_ms = query_timeout_ms;
		self
	}

	#[must_use]
	pub const fn with_shutdown_timeout_ms(mut self, shutdown_timeout_ms: u64) -> Self {
		self.shutdown_timeout_ms = shutdown_timeout_ms;
		self
	}

	pub fn validate(&self) -> Result<(), Error> {
		if self.poll_interval_ms == 0 {
			return Err(Error::InvalidConfig("poll interval must be greater than zero"));
		}

		if self.worker_count == 0 {
			return Err(Error::InvalidConfig("worker count must be greater than zero"));
		}

		if self.query_timeout_ms == 0 {
			return Err(Error::InvalidConfig("query timeout must be greater than zero"));
		}

		Ok(())
	}

	#[must_use]
	pub const fn poll_interval(&self) -> Duration {
		Duration::from_millis(self.poll_interval_ms)
	}

	#[must_use]
	pub const fn query_timeout(&self) -> Duration {
		Duration::from_millis(self.query_timeout_ms)
	}

	#[must_use]
	pub const fn shutdown_timeout(&self) -> Duration {
		Duration::from_millis(self.shutdown_timeout_ms)
	}
}
