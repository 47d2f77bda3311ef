use crate::metadata::Metadata;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::debug;

/// Change detected on a tracked path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileEvent {
	/// The path didn't exist on the previous poll and now it does
	Created,
	/// The path existed on the previous poll and now it doesn't
	Deleted,
	/// The modification time strictly increased, carries the new metadata
	Updated(Metadata),
	/// A directory gained complete children that were never seen before
	ListUpdated {
		directory: Metadata,
		new_entries: Vec<Metadata>,
	},
}

impl FileEvent {
	#[must_use]
	pub const fn is_created(&self) -> bool {
		matches!(self, Self::Created)
	}

	#[must_use]
	pub const fn is_deleted(&self) -> bool {
		matches!(self, Self::Deleted)
	}

	#[must_use]
	pub const fn is_updated(&self) -> bool {
		matches!(self, Self::Updated(_))
	}

	#[must_use]
	pub const fn is_list_updated(&self) -> bool {
		matches!(self, Self::ListUpdated { .. })
	}
}

/// Receives the events of a registration.
///
/// Events of a single registration are delivered one at a time and in the order they were
/// detected. Different registrations are dispatched independently from each other.
#[async_trait]
pub trait FileEventListener: Send + Sync + 'static {
	async fn on_event(&self, event: FileEvent);
}

#[async_trait]
impl FileEventListener for mpsc::UnboundedSender<FileEvent> {
	async fn on_event(&self, event: FileEvent) {
		if self.send(event).is_err() {
			debug!("Event receiver was dropped, discarding event");
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn channel_listener_forwards_events() {
		let (tx, mut rx) = mpsc::unbounded_channel();

		tx.on_event(FileEvent::Created).await;
		tx.on_event(FileEvent::Updated(Metadata::file("/a", 1))).await;

		assert_eq!(rx.recv().await, Some(FileEvent::Created));
		assert_eq!(
			rx.recv().await,
			Some(FileEvent::Updated(Metadata::file("/a", 1)))
		);
	}

	#[tokio::test]
	async fn channel_listener_survives_closed_receiver() {
		let (tx, rx) = mpsc::unbounded_channel();
		drop(rx);

		tx.on_event(FileEvent::Deleted).await;
	}
}
