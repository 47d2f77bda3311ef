use crate::{
	client::FileSystemClient, config::TrackerConfig, error::Error, event::FileEventListener,
};

use std::{
	collections::{BTreeMap, HashMap},
	fmt,
	mem,
	sync::Arc,
};

use futures_concurrency::future::Join;
use tokio::{
	spawn,
	sync::{Mutex, Semaphore},
	task::JoinHandle,
	time::timeout,
};
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, error, instrument, warn};

mod task;

use task::ListenerTask;

/// Identifies a registration among the ones of the same path.
///
/// Ids are handed out by a per path counter and are never reused, even after removals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RegistrationId(u64);

impl RegistrationId {
	#[must_use]
	pub const fn get(self) -> u64 {
		self.0
	}
}

impl fmt::Display for RegistrationId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		self.0.fmt(f)
	}
}

/// Which registrations of a path [`Tracker::remove_listener`] should remove
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerSelector {
	All,
	Id(RegistrationId),
}

impl From<RegistrationId> for ListenerSelector {
	fn from(id: RegistrationId) -> Self {
		Self::Id(id)
	}
}

struct Registration {
	stop: CancellationToken,
	handle: JoinHandle<()>,
}

#[derive(Default)]
struct Registry {
	paths: HashMap<String, BTreeMap<RegistrationId, Registration>>,
	next_ids: HashMap<String, u64>,
	/// Removed registrations that may still be finishing their last tick
	draining: Vec<JoinHandle<()>>,
	is_shutdown: bool,
}

impl Registry {
	fn next_id(&mut self, path: &str) -> RegistrationId {
		let next = self.next_ids.entry(path.to_string()).or_default();
		let id = RegistrationId(*next);
		*next += 1;
		id
	}

	fn retire(&mut self, Registration { stop, handle }: Registration) {
		stop.cancel();
		if !handle.is_finished() {
			self.draining.push(handle);
		}
	}

	fn prune(&mut self) {
		self.draining.retain(|handle| !handle.is_finished());
	}
}

/// Registry of watched paths and scheduler of their listener tasks.
///
/// Cloning is cheap and every clone drives the same registry. When the last clone is dropped all
/// listener tasks are stopped, but only [`Tracker::shutdown`] waits for them.
#[derive(Clone)]
pub struct Tracker {
	client: Arc<dyn FileSystemClient>,
	config: TrackerConfig,
	permits: Arc<Semaphore>,
	stop: CancellationToken,
	registry: Arc<Mutex<Registry>>,
	_stop_on_drop: Arc<DropGuard>,
}

impl Tracker {
	pub fn new(client: impl FileSystemClient, config: TrackerConfig) -> Result<Self, Error> {
		config.validate()?;

		Ok(Self::build(Arc::new(client), config))
	}

	pub fn with_defaults(client: impl FileSystemClient) -> Self {
		Self::build(Arc::new(client), TrackerConfig::default())
	}

	fn build(client: Arc<dyn FileSystemClient>, config: TrackerConfig) -> Self {
		let stop = CancellationToken::new();

		Self {
			client,
			permits: Arc::new(Semaphore::new(config.worker_count)),
			config,
			_stop_on_drop: Arc::new(stop.clone().drop_guard()),
			stop,
			registry: Arc::default(),
		}
	}

	#[must_use]
	pub const fn config(&self) -> &TrackerConfig {
		&self.config
	}

	/// Starts polling `path` on behalf of `listener`, first poll happens right away.
	///
	/// The current state of `path` is captured before returning, so content that already exists
	/// doesn't produce events. Fails if this initial query fails.
	#[instrument(skip(self, listener), err)]
	pub async fn register_listener(
		&self,
		path: &str,
		listener: impl FileEventListener,
	) -> Result<RegistrationId, Error> {
		if self.registry.lock().await.is_shutdown {
			return Err(Error::TrackerShutdown);
		}

		let task = ListenerTask::bootstrap(
			path.to_string(),
			Arc::clone(&self.client),
			Box::new(listener),
			self.config.query_timeout(),
		)
		.await
		.map_err(|source| Error::Bootstrap {
			path: path.to_string(),
			source,
		})?;

		let mut registry = self.registry.lock().await;

		// Might have been shutdown while we were bootstrapping
		if registry.is_shutdown {
			return Err(Error::TrackerShutdown);
		}

		registry.prune();

		let id = registry.next_id(path);
		let stop = self.stop.child_token();

		let handle = spawn(task.run(
			id,
			self.config.poll_interval(),
			Arc::clone(&self.permits),
			stop.clone(),
		));

		registry
			.paths
			.entry(path.to_string())
			.or_default()
			.insert(id, Registration { stop, handle });

		debug!(%id, "Registered listener");

		Ok(id)
	}

	/// Stops the registrations of `path` matched by `selector`. Removing an unknown id is a no-op.
	///
	/// A poll that is already running when its registration is removed is allowed to finish.
	#[instrument(skip(self, selector))]
	pub async fn remove_listener(&self, path: &str, selector: impl Into<ListenerSelector>) {
		let selector = selector.into();
		let mut registry = self.registry.lock().await;

		registry.prune();

		let removed = match selector {
			ListenerSelector::All => registry
				.paths
				.remove(path)
				.map(BTreeMap::into_values)
				.into_iter()
				.flatten()
				.collect::<Vec<_>>(),

			ListenerSelector::Id(id) => {
				let Some(registrations) = registry.paths.get_mut(path) else {
					debug!(?selector, "No listeners registered for path");
					return;
				};

				let removed = registrations.remove(&id);

				if registrations.is_empty() {
					registry.paths.remove(path);
				}

				removed.into_iter().collect()
			}
		};

		debug!(?selector, count = removed.len(), "Removing listeners");

		for registration in removed {
			registry.retire(registration);
		}
	}

	/// Registration ids currently active for `path`, in ascending order
	pub async fn registrations(&self, path: &str) -> Vec<RegistrationId> {
		self.registry
			.lock()
			.await
			.paths
			.get(path)
			.map(|registrations| registrations.keys().copied().collect())
			.unwrap_or_default()
	}

	/// Paths with at least one active registration
	pub async fn watched_paths(&self) -> Vec<String> {
		let mut paths = self
			.registry
			.lock()
			.await
			.paths
			.keys()
			.cloned()
			.collect::<Vec<_>>();

		paths.sort();

		paths
	}

	/// Stops every registration and waits, up to the configured shutdown timeout, for polls
	/// in flight to finish, removed ones included. Polls still running after that are aborted.
	///
	/// Returns the first abnormal termination of a listener task, if any.
	#[instrument(skip(self))]
	pub async fn shutdown(&self) -> Result<(), Error> {
		let handles = {
			let mut registry = self.registry.lock().await;

			if registry.is_shutdown {
				warn!("Trying to shutdown a tracker that was already shutdown");
				return Ok(());
			}

			registry.is_shutdown = true;
			self.stop.cancel();
			self.permits.close();

			let mut handles = mem::take(&mut registry.draining);
			handles.extend(
				registry
					.paths
					.drain()
					.flat_map(|(_, registrations)| registrations.into_values())
					.map(|Registration { handle, .. }| handle),
			);

			handles
		};

		debug!(count = handles.len(), "Waiting for listener tasks to stop");

		let abort_handles = handles
			.iter()
			.map(JoinHandle::abort_handle)
			.collect::<Vec<_>>();

		let shutdown_timeout = self.config.shutdown_timeout();

		match timeout(shutdown_timeout, handles.join()).await {
			Ok(results) => {
				let mut maybe_error = None;

				for res in results {
					if let Err(e) = res {
						error!("Listener task failed to stop gracefully: {e:#?}");
						maybe_error.get_or_insert(e);
					}
				}

				maybe_error.map_or(Ok(()), |e| Err(e.into()))
			}

			Err(_) => {
				warn!(
					"Listener tasks didn't stop in {shutdown_timeout:?}, forcing abortion of the remaining ones"
				);

				for abort_handle in abort_handles {
					abort_handle.abort();
				}

				Ok(())
			}
		}
	}
}
