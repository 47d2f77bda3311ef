use crate::{client::FileSystemClient, metadata::Metadata};

use std::{
	fs,
	io,
	path::{Component, Path, PathBuf},
	time::UNIX_EPOCH,
};

use async_trait::async_trait;
use tracing::warn;

/// [`FileSystemClient`] backed by a directory on the host filesystem.
///
/// Tracked paths are resolved relative to `root`, so `/data/file` maps to `<root>/data/file`.
/// Local writes have no notion of completeness, every entry is reported as complete.
#[derive(Debug, Clone)]
pub struct LocalFileSystem {
	root: PathBuf,
}

impl LocalFileSystem {
	pub fn new(root: impl Into<PathBuf>) -> Self {
		Self { root: root.into() }
	}

	/// Tracked paths never leave `root`, so `..` and absolute prefixes are rejected
	fn resolve(&self, path: &str) -> io::Result<PathBuf> {
		let relative = Path::new(path.trim_start_matches('/'));

		if relative
			.components()
			.any(|component| !matches!(component, Component::Normal(_) | Component::CurDir))
		{
			return Err(io::Error::new(
				io::ErrorKind::InvalidInput,
				format!("path escapes the tracked root: <path='{path}'>"),
			));
		}

		Ok(self.root.join(relative))
	}
}

fn join_remote(parent: &str, name: &str) -> String {
	format!("{}/{name}", parent.trim_end_matches('/'))
}

fn modified_ms(metadata: &fs::Metadata) -> io::Result<i64> {
	let modified = metadata.modified()?;

	Ok(modified
		.duration_since(UNIX_EPOCH)
		.map_or(0, |since_epoch| {
			i64::try_from(since_epoch.as_millis()).unwrap_or(i64::MAX)
		}))
}

fn to_metadata(path: String, metadata: &fs::Metadata) -> io::Result<Metadata> {
	Ok(Metadata {
		path,
		exists: true,
		is_directory: metadata.is_dir(),
		last_modified_ms: modified_ms(metadata)?,
		is_complete: true,
	})
}

#[async_trait]
impl FileSystemClient for LocalFileSystem {
	async fn metadata(&self, path: &str) -> io::Result<Option<Metadata>> {
		match tokio::fs::metadata(self.resolve(path)?).await {
			Ok(metadata) => to_metadata(path.to_string(), &metadata).map(Some),
			Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
			Err(e) => Err(e),
		}
	}

	async fn list_children(&self, path: &str) -> io::Result<Vec<Metadata>> {
		let mut read_dir = tokio::fs::read_dir(self.resolve(path)?).await?;
		let mut children = Vec::new();

		while let Some(entry) = read_dir.next_entry().await? {
			let Some(name) = entry.file_name().to_str().map(ToString::to_string) else {
				warn!(
					"Skipping child with non UTF-8 name: <path='{}'>",
					entry.path().display()
				);
				continue;
			};

			match entry.metadata().await {
				Ok(metadata) => children.push(to_metadata(join_remote(path, &name), &metadata)?),
				// Removed between listing and stat
				Err(e) if e.kind() == io::ErrorKind::NotFound => {}
				Err(e) => return Err(e),
			}
		}

		children.sort_by(|a, b| a.path.cmp(&b.path));

		Ok(children)
	}
}
