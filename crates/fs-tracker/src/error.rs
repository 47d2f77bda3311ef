use std::{io, time::Duration};

use thiserror::Error;
use tokio::task::JoinError;

/// Failure of a single metadata or listing query against the filesystem service
#[derive(Debug, Error)]
pub enum QueryError {
	#[error("filesystem query failed: {0}")]
	Io(#[from] io::Error),
	#[error("filesystem query timed out after {0:?}")]
	Timeout(Duration),
}

#[derive(Debug, Error)]
pub enum Error {
	#[error("failed to bootstrap listener <path='{path}'>: {source}")]
	Bootstrap {
		path: String,
		#[source]
		source: QueryError,
	},
	#[error("invalid tracker configuration: {0}")]
	InvalidConfig(&'static str),
	#[error("tracker was already shutdown")]
	TrackerShutdown,
	#[error("listener task failed while shutting down: {0}")]
	TaskJoin(#[from] JoinError),
}
