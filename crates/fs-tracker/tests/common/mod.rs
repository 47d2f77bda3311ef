#![allow(dead_code)]

use sd_fs_tracker::{FileEvent, FileEventListener, FileSystemClient, Metadata};

use std::{
	collections::HashMap,
	io,
	sync::{
		atomic::{AtomicBool, AtomicUsize, Ordering},
		Arc, Mutex,
	},
	time::Duration,
};

use async_trait::async_trait;

/// In memory filesystem service, children of a directory are the entries one level below it
#[derive(Default)]
pub struct MemoryFs {
	entries: Mutex<HashMap<String, Metadata>>,
	failing: AtomicBool,
	pub metadata_queries: AtomicUsize,
}

impl MemoryFs {
	pub fn new() -> Arc<Self> {
		Arc::new(Self::default())
	}

	pub fn put(&self, metadata: Metadata) {
		self.entries
			.lock()
			.unwrap()
			.insert(metadata.path.clone(), metadata);
	}

	pub fn remove(&self, path: &str) {
		self.entries.lock().unwrap().remove(path);
	}

	pub fn set_failing(&self, failing: bool) {
		self.failing.store(failing, Ordering::Release);
	}

	fn check(&self) -> io::Result<()> {
		if self.failing.load(Ordering::Acquire) {
			Err(io::Error::new(
				io::ErrorKind::ConnectionRefused,
				"filesystem service unreachable",
			))
		} else {
			Ok(())
		}
	}
}

#[async_trait]
impl FileSystemClient for MemoryFs {
	async fn metadata(&self, path: &str) -> io::Result<Option<Metadata>> {
		self.metadata_queries.fetch_add(1, Ordering::Relaxed);
		self.check()?;
		Ok(self.entries.lock().unwrap().get(path).cloned())
	}

	async fn list_children(&self, path: &str) -> io::Result<Vec<Metadata>> {
		self.check()?;
		let prefix = format!("{}/", path.trim_end_matches('/'));
		let mut children = self
			.entries
			.lock()
			.unwrap()
			.values()
			.filter(|meta| {
				meta.path
					.strip_prefix(&prefix)
					.is_some_and(|rest| !rest.is_empty() && !rest.contains('/'))
			})
			.cloned()
			.collect::<Vec<_>>();
		children.sort_by(|a, b| a.path.cmp(&b.path));
		Ok(children)
	}
}

/// Wraps a [`MemoryFs`] and panics on every query once switched on
#[derive(Default)]
pub struct PanickingFs {
	pub inner: MemoryFs,
	armed: AtomicBool,
}

impl PanickingFs {
	pub fn new() -> Arc<Self> {
		Arc::new(Self::default())
	}

	pub fn arm(&self) {
		self.armed.store(true, Ordering::Release);
	}

	fn check(&self) {
		assert!(
			!self.armed.load(Ordering::Acquire),
			"filesystem client blew up"
		);
	}
}

#[async_trait]
impl FileSystemClient for PanickingFs {
	async fn metadata(&self, path: &str) -> io::Result<Option<Metadata>> {
		self.check();
		self.inner.metadata(path).await
	}

	async fn list_children(&self, path: &str) -> io::Result<Vec<Metadata>> {
		self.check();
		self.inner.list_children(path).await
	}
}

/// Listener that keeps every event it receives
#[derive(Clone, Default)]
pub struct Recorder {
	events: Arc<Mutex<Vec<FileEvent>>>,
}

impl Recorder {
	pub fn take(&self) -> Vec<FileEvent> {
		std::mem::take(&mut *self.events.lock().unwrap())
	}

	pub fn len(&self) -> usize {
		self.events.lock().unwrap().len()
	}
}

#[async_trait]
impl FileEventListener for Recorder {
	async fn on_event(&self, event: FileEvent) {
		self.events.lock().unwrap().push(event);
	}
}

/// Panics on the first event, records the following ones
#[derive(Clone, Default)]
pub struct PanicOnceListener {
	pub recorder: Recorder,
	panicked: Arc<AtomicBool>,
}

#[async_trait]
impl FileEventListener for PanicOnceListener {
	async fn on_event(&self, event: FileEvent) {
		assert!(
			self.panicked.swap(true, Ordering::AcqRel),
			"listener blew up handling {event:?}"
		);
		self.recorder.on_event(event).await;
	}
}

/// Takes `delay` to handle every event, records it afterwards
#[derive(Clone)]
pub struct SlowListener {
	pub recorder: Recorder,
	pub delay: Duration,
}

#[async_trait]
impl FileEventListener for SlowListener {
	async fn on_event(&self, event: FileEvent) {
		tokio::time::sleep(self.delay).await;
		self.recorder.on_event(event).await;
	}
}

pub fn paths(entries: &[Metadata]) -> Vec<&str> {
	entries.iter().map(|entry| entry.path.as_str()).collect()
}
