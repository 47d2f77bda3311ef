//!
//! # Filesystem Tracker
//!
//! Polling change detection for paths living on a remote filesystem service that can't push
//! notifications by itself.
//!
//! A [`Tracker`] keeps a registry of watched paths. Every registration gets its own listener task
//! that periodically asks a [`FileSystemClient`] for the path metadata (and children listing, for
//! directories), compares it against the last snapshot it saw and dispatches [`FileEvent`]s to the
//! registered [`FileEventListener`]:
//! - [`FileEvent::Created`] when a path that didn't exist shows up;
//! - [`FileEvent::Deleted`] when a tracked path goes away;
//! - [`FileEvent::Updated`] when the modification time strictly increases;
//! - [`FileEvent::ListUpdated`] when a directory gains complete children never seen before;
//!
//! Query failures are never reported to listeners, the tick is skipped and retried on the next one.
//!
//! ## Basic example
//!
//! ```
//! use sd_fs_tracker::{FileEvent, ListenerSelector, LocalFileSystem, Tracker, TrackerConfig};
//! use tokio::sync::mpsc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), sd_fs_tracker::Error> {
//! 	let root = std::env::temp_dir();
//! 	let tracker = Tracker::new(
//! 		LocalFileSystem::new(root),
//! 		TrackerConfig::default().with_poll_interval_ms(50),
//! 	)?;
//!
//! 	let (tx, mut rx) = mpsc::unbounded_channel::<FileEvent>();
//! 	let id = tracker.register_listener("/some-missing-dir", tx).await?;
//!
//! 	tracker.remove_listener("/some-missing-dir", id).await;
//! 	tracker.remove_listener("/some-missing-dir", ListenerSelector::All).await;
//! 	tracker.shutdown().await?;
//!
//! 	assert!(rx.try_recv().is_err());
//!
//! 	Ok(())
//! }
//! ```

#![warn(
	clippy::all,
	clippy::pedantic,
	clippy::correctness,
	clippy::perf,
	clippy::style,
	clippy::suspicious,
	clippy::complexity,
	clippy::nursery,
	clippy::unwrap_used,
	unused_qualifications,
	rust_2018_idioms,
	trivial_casts,
	trivial_numeric_casts,
	unused_allocation,
	clippy::unnecessary_cast,
	clippy::cast_lossless,
	clippy::cast_possible_truncation,
	clippy::cast_possible_wrap,
	clippy::cast_precision_loss,
	clippy::cast_sign_loss,
	clippy::dbg_macro,
	clippy::deprecated_cfg_attr,
	clippy::separated_literal_suffix,
	deprecated
)]
#![forbid(deprecated_in_future)]
#![allow(clippy::missing_errors_doc, clippy::module_name_repetitions)]

mod client;
mod config;
mod error;
mod event;
mod local;
mod metadata;
mod tracker;

pub use client::FileSystemClient;
pub use config::TrackerConfig;
pub use error::{Error, QueryError};
pub use event::{FileEvent, FileEventListener};
pub use local::LocalFileSystem;
pub use metadata::Metadata;
pub use tracker::{ListenerSelector, RegistrationId, Tracker};
