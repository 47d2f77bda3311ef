use crate::{
	client::FileSystemClient,
	error::QueryError,
	event::{FileEvent, FileEventListener},
	metadata::Metadata,
};

use std::{
	collections::HashSet, future::Future, io, panic::AssertUnwindSafe, sync::Arc, time::Duration,
};

use futures::FutureExt;
use tokio::{
	sync::Semaphore,
	time::{interval, timeout, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, trace, warn};

use super::RegistrationId;

/// Last state observed by a listener task.
///
/// The baseline holds the paths of every child seen complete since the directory started being
/// tracked. It only grows while the directory exists and is reset when it's deleted and created again.
#[derive(Debug, Default)]
struct Snapshot {
	metadata: Option<Metadata>,
	baseline: HashSet<String>,
}

impl Snapshot {
	fn new(metadata: Option<Metadata>, children: Option<Vec<Metadata>>) -> Self {
		let mut snapshot = Self {
			metadata,
			baseline: HashSet::new(),
		};

		if let Some(children) = children {
			snapshot.absorb(children);
		}

		snapshot
	}

	/// Merges the complete `children` into the baseline, returning the ones it didn't know about
	fn absorb(&mut self, children: Vec<Metadata>) -> Vec<Metadata> {
		children
			.into_iter()
			.filter(|child| child.is_complete)
			.filter(|child| self.baseline.insert(child.path.clone()))
			.collect()
	}
}

async fn bounded<T>(
	query_timeout: Duration,
	query: impl Future<Output = io::Result<T>> + Send,
) -> Result<T, QueryError> {
	timeout(query_timeout, query)
		.await
		.map_err(|_| QueryError::Timeout(query_timeout))?
		.map_err(Into::into)
}

/// Polls a single path on behalf of a single listener
pub(super) struct ListenerTask {
	path: String,
	client: Arc<dyn FileSystemClient>,
	listener: Box<dyn FileEventListener>,
	query_timeout: Duration,
	snapshot: Snapshot,
}

impl ListenerTask {
	/// Captures the current state of `path` so already existing content doesn't produce events
	pub async fn bootstrap(
		path: String,
		client: Arc<dyn FileSystemClient>,
		listener: Box<dyn FileEventListener>,
		query_timeout: Duration,
	) -> Result<Self, QueryError> {
		let mut task = Self {
			path,
			client,
			listener,
			query_timeout,
			snapshot: Snapshot::default(),
		};

		let metadata = task.fetch_metadata().await?;
		let children = match &metadata {
			Some(metadata) if metadata.is_directory => Some(task.fetch_children().await?),
			_ => None,
		};

		task.snapshot = Snapshot::new(metadata, children);

		Ok(task)
	}

	/// Entries the service reports as not existing are treated the same as missing ones
	async fn fetch_metadata(&self) -> Result<Option<Metadata>, QueryError> {
		Ok(bounded(self.query_timeout, self.client.metadata(&self.path))
			.await?
			.filter(|metadata| metadata.exists))
	}

	async fn fetch_children(&self) -> Result<Vec<Metadata>, QueryError> {
		bounded(self.query_timeout, self.client.list_children(&self.path)).await
	}

	/// Queries the current state and diffs it against the snapshot.
	///
	/// Every query happens before the snapshot is touched, so a failed tick leaves it as it was.
	async fn tick(&mut self) -> Result<Vec<FileEvent>, QueryError> {
		let previous = self.snapshot.metadata.clone();
		let current = self.fetch_metadata().await?;

		let events = match (previous, current) {
			(None, None) => vec![],

			(None, Some(current)) => {
				let children = if current.is_directory {
					Some(self.fetch_children().await?)
				} else {
					None
				};

				self.snapshot = Snapshot::new(Some(current), children);

				vec![FileEvent::Created]
			}

			(Some(_), None) => {
				self.snapshot = Snapshot::default();

				vec![FileEvent::Deleted]
			}

			(Some(previous), Some(current)) => {
				let is_update = current.is_newer_than(&previous);
				let is_directory = if is_update {
					current.is_directory
				} else {
					previous.is_directory
				};

				let children = if is_directory {
					Some(self.fetch_children().await?)
				} else {
					None
				};

				let mut events = Vec::with_capacity(2);

				if is_update {
					// Children seen under a previous incarnation don't count as known anymore
					if previous.is_directory != current.is_directory {
						self.snapshot.baseline.clear();
					}

					self.snapshot.metadata = Some(current.clone());
					events.push(FileEvent::Updated(current.clone()));
				}

				if let Some(children) = children {
					let new_entries = self.snapshot.absorb(children);
					if !new_entries.is_empty() {
						events.push(FileEvent::ListUpdated {
							directory: current,
							new_entries,
						});
					}
				}

				events
			}
		};

		Ok(events)
	}

	async fn dispatch(&self, event: FileEvent) {
		trace!(?event, "Dispatching event");

		if AssertUnwindSafe(self.listener.on_event(event))
			.catch_unwind()
			.await
			.is_err()
		{
			error!("Listener unexpectedly panicked while handling an event");
		}
	}

	fn announce(&self) {
		match &self.snapshot.metadata {
			None => info!("Tracking non-existing path"),
			Some(metadata) if metadata.is_directory => info!("Tracking a directory"),
			Some(_) => info!("Tracking a file"),
		}
	}

	/// Polls until `stop` is cancelled. Cancellation is only checked between ticks, a tick that
	/// already started always runs to completion.
	#[instrument(skip_all, fields(path = %self.path, %id))]
	pub async fn run(
		mut self,
		id: RegistrationId,
		poll_interval: Duration,
		permits: Arc<Semaphore>,
		stop: CancellationToken,
	) {
		self.announce();

		let mut ticker = interval(poll_interval);
		ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

		loop {
			tokio::select! {
				biased;
				() = stop.cancelled() => break,
				_ = ticker.tick() => {}
			}

			let permit = tokio::select! {
				biased;
				() = stop.cancelled() => break,
				permit = permits.acquire() => permit,
			};

			let Ok(_permit) = permit else {
				debug!("Poll permits were closed, stopping listener task");
				break;
			};

			match self.tick().await {
				Ok(events) => {
					for event in events {
						self.dispatch(event).await;
					}
				}
				Err(e) => warn!("Failed to poll tracked path, will retry on next tick: {e:#}"),
			}
		}

		debug!("Listener task stopped");
	}
}
