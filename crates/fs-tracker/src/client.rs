use crate::metadata::Metadata;

use std::{io, sync::Arc};

use async_trait::async_trait;

/// Access to the filesystem service being tracked.
///
/// Implementations talk to whatever backs the remote namespace; the tracker only needs
/// point in time metadata and directory listings.
#[async_trait]
pub trait FileSystemClient: Send + Sync + 'static {
	/// Metadata for `path`, or `None` if it doesn't exist
	async fn metadata(&self, path: &str) -> io::Result<Option<Metadata>>;

	/// Children of a directory, in the order the service reports them.
	/// Only called for paths whose metadata says they're directories.
	async fn list_children(&self, path: &str) -> io::Result<Vec<Metadata>>;
}

#[async_trait]
impl<C: FileSystemClient + ?Sized> FileSystemClient for Arc<C> {
	async fn metadata(&self, path: &str) -> io::Result<Option<Metadata>> {
		(**self).metadata(path).await
	}

	async fn list_children(&self, path: &str) -> io::Result<Vec<Metadata>> {
		(**self).list_children(path).await
	}
}
