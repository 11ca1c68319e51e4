//! Recommendation history.
//!
//! Every call is recorded through an injected [`HistoryStore`]. Entries are kept newest first and
//! capped; a store failure never reaches the caller of the orchestrator.

use std::{
	ffi::OsString,
	io::ErrorKind,
	path::PathBuf,
	sync::{Mutex as StdMutex, PoisonError},
};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tokio::{fs, sync::Mutex};

use crate::{BoxFuture, Error, Result, recommend::Tier};
use chakula_domain::NutrientProfile;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
	#[serde(with = "rfc3339")]
	pub at: OffsetDateTime,
	pub profile: NutrientProfile,
	pub top_k: u32,
	pub tier: Tier,
	pub item_ids: Vec<String>,
}

pub trait HistoryStore
where
	Self: Send + Sync,
{
	fn record<'a>(&'a self, entry: HistoryEntry) -> BoxFuture<'a, Result<()>>;

	/// Newest first.
	fn entries<'a>(&'a self) -> BoxFuture<'a, Result<Vec<HistoryEntry>>>;

	fn clear<'a>(&'a self) -> BoxFuture<'a, Result<()>>;
}

#[derive(Debug)]
pub struct MemoryHistory {
	limit: usize,
	entries: StdMutex<Vec<HistoryEntry>>,
}
impl MemoryHistory {
	pub fn new(limit: usize) -> Self {
		Self { limit, entries: StdMutex::new(Vec::new()) }
	}
}

impl HistoryStore for MemoryHistory {
	fn record<'a>(&'a self, entry: HistoryEntry) -> BoxFuture<'a, Result<()>> {
		let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);

		push_newest(&mut entries, entry, self.limit);

		Box::pin(async { Ok(()) })
	}

	fn entries<'a>(&'a self) -> BoxFuture<'a, Result<Vec<HistoryEntry>>> {
		let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner).clone();

		Box::pin(async move { Ok(entries) })
	}

	fn clear<'a>(&'a self) -> BoxFuture<'a, Result<()>> {
		self.entries.lock().unwrap_or_else(PoisonError::into_inner).clear();

		Box::pin(async { Ok(()) })
	}
}

/// History persisted as a JSON array.
///
/// A missing file reads as empty history. A file that is not valid history JSON also reads as
/// empty, and is moved aside to `<name>.corrupt` before the next write so its contents survive.
#[derive(Debug)]
pub struct JsonFileHistory {
	path: PathBuf,
	limit: usize,
	lock: Mutex<()>,
}
impl JsonFileHistory {
	pub fn new(path: impl Into<PathBuf>, limit: usize) -> Self {
		Self { path: path.into(), limit, lock: Mutex::new(()) }
	}

	/// Where an unparsable history file is moved before it would be overwritten.
	pub fn corrupt_path(&self) -> PathBuf {
		let mut name = self.path.file_name().map(OsString::from).unwrap_or_default();

		name.push(".corrupt");

		self.path.with_file_name(name)
	}

	async fn load(&self) -> Result<Loaded> {
		let raw = match fs::read_to_string(&self.path).await {
			Ok(raw) => raw,
			Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Loaded::Entries(Vec::new())),
			Err(err) => return Err(err.into()),
		};

		match serde_json::from_str(&raw) {
			Ok(entries) => Ok(Loaded::Entries(entries)),
			Err(err) => Ok(Loaded::Corrupt(err.to_string())),
		}
	}

	async fn store(&self, entries: &[HistoryEntry]) -> Result<()> {
		if let Some(parent) = self.path.parent()
			&& !parent.as_os_str().is_empty()
		{
			fs::create_dir_all(parent).await?;
		}

		fs::write(&self.path, serde_json::to_vec_pretty(entries)?).await?;

		Ok(())
	}
}

impl HistoryStore for JsonFileHistory {
	fn record<'a>(&'a self, entry: HistoryEntry) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			let _guard = self.lock.lock().await;
			let mut entries = match self.load().await? {
				Loaded::Entries(entries) => entries,
				Loaded::Corrupt(reason) => {
					let aside = self.corrupt_path();

					fs::rename(&self.path, &aside).await.map_err(|err| Error::History {
						message: format!(
							"Refusing to overwrite invalid history file {} ({reason}): {err}",
							self.path.display()
						),
					})?;

					tracing::warn!(
						reason = %reason,
						path = %self.path.display(),
						moved_to = %aside.display(),
						"History file is not valid JSON. Moved aside."
					);

					Vec::new()
				},
			};

			push_newest(&mut entries, entry, self.limit);

			self.store(&entries).await
		})
	}

	fn entries<'a>(&'a self) -> BoxFuture<'a, Result<Vec<HistoryEntry>>> {
		Box::pin(async move {
			let _guard = self.lock.lock().await;

			match self.load().await {
				Ok(Loaded::Entries(mut entries)) => {
					entries.truncate(self.limit);

					Ok(entries)
				},
				Ok(Loaded::Corrupt(reason)) => {
					tracing::warn!(
						reason = %reason,
						path = %self.path.display(),
						"History file is not valid JSON. Reading as empty."
					);

					Ok(Vec::new())
				},
				Err(err) => {
					tracing::warn!(
						error = %err,
						path = %self.path.display(),
						"History file unreadable. Reading as empty."
					);

					Ok(Vec::new())
				},
			}
		})
	}

	fn clear<'a>(&'a self) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			let _guard = self.lock.lock().await;

			match fs::remove_file(&self.path).await {
				Ok(()) => Ok(()),
				Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
				Err(err) => Err(Error::from(err)),
			}
		})
	}
}

enum Loaded {
	Entries(Vec<HistoryEntry>),
	Corrupt(String),
}

mod rfc3339 {
	use serde::{Deserialize, Deserializer, Serializer};
	use time::{OffsetDateTime, format_description::well_known::Rfc3339};

	pub fn serialize<S>(at: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(&at.format(&Rfc3339).map_err(serde::ser::Error::custom)?)
	}

	pub fn deserialize<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
	where
		D: Deserializer<'de>,
	{
		let raw = String::deserialize(deserializer)?;

		OffsetDateTime::parse(&raw, &Rfc3339).map_err(serde::de::Error::custom)
	}
}

fn push_newest(entries: &mut Vec<HistoryEntry>, entry: HistoryEntry, limit: usize) {
	entries.insert(0, entry);
	entries.truncate(limit);
}
