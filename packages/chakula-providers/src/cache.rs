//! Offline response cache for provider GET requests.
//!
//! Network first: fresh 200 responses are stored, and a stored response is served only when the
//! network call itself fails. API responses and other dynamic content live in separate
//! partitions, each bounded and evicted oldest-first.

use std::{
	collections::{HashMap, VecDeque},
	sync::{Mutex, PoisonError},
};

use reqwest::Method;
use serde_json::Value;

/// Paths whose responses go to the API partition.
pub const API_PATH_PREFIXES: [&str; 3] = ["/api/", "/predict/", "/health/"];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Partition {
	Api,
	Dynamic,
}
impl Partition {
	pub fn for_path(path: &str) -> Self {
		if API_PATH_PREFIXES.iter().any(|prefix| path.starts_with(prefix)) {
			Self::Api
		} else {
			Self::Dynamic
		}
	}
}

#[derive(Debug)]
pub struct ResponseCache {
	api: Mutex<Fifo>,
	dynamic: Mutex<Fifo>,
}
impl ResponseCache {
	pub fn new(api_max_items: usize, dynamic_max_items: usize) -> Self {
		Self {
			api: Mutex::new(Fifo::new(api_max_items)),
			dynamic: Mutex::new(Fifo::new(dynamic_max_items)),
		}
	}

	pub fn from_config(cfg: &chakula_config::Cache) -> Self {
		Self::new(cfg.api_max_items as usize, cfg.dynamic_max_items as usize)
	}

	/// Stores a response. Only GET requests are cached; returns whether the response was stored.
	pub fn put(&self, method: &Method, url: &reqwest::Url, body: Value) -> bool {
		if *method != Method::GET {
			return false;
		}

		let partition = Partition::for_path(url.path());
		let evicted = self
			.partition(partition)
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.put(cache_key(method, url), body);

		if evicted > 0 {
			tracing::debug!(?partition, evicted, "Evicted oldest cached responses.");
		}

		true
	}

	pub fn get(&self, method: &Method, url: &reqwest::Url) -> Option<Value> {
		if *method != Method::GET {
			return None;
		}

		self.partition(Partition::for_path(url.path()))
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.get(&cache_key(method, url))
	}

	pub fn len(&self, partition: Partition) -> usize {
		self.partition(partition).lock().unwrap_or_else(PoisonError::into_inner).order.len()
	}

	pub fn is_empty(&self) -> bool {
		self.len(Partition::Api) == 0 && self.len(Partition::Dynamic) == 0
	}

	fn partition(&self, partition: Partition) -> &Mutex<Fifo> {
		match partition {
			Partition::Api => &self.api,
			Partition::Dynamic => &self.dynamic,
		}
	}
}

pub fn cache_key(method: &Method, url: &reqwest::Url) -> String {
	let raw = format!("{method} {url}");

	blake3::hash(raw.as_bytes()).to_hex().to_string()
}

#[derive(Debug)]
struct Fifo {
	max_items: usize,
	order: VecDeque<String>,
	entries: HashMap<String, Value>,
}
impl Fifo {
	fn new(max_items: usize) -> Self {
		Self { max_items, order: VecDeque::new(), entries: HashMap::new() }
	}

	/// Inserts or refreshes an entry, moving it to the newest position. Returns the number of
	/// entries evicted.
	fn put(&mut self, key: String, body: Value) -> usize {
		if self.entries.insert(key.clone(), body).is_some() {
			self.order.retain(|existing| existing != &key);
		}

		self.order.push_back(key);

		let mut evicted = 0;

		while self.order.len() > self.max_items {
			let Some(oldest) = self.order.pop_front() else {
				break;
			};

			self.entries.remove(&oldest);

			evicted += 1;
		}

		evicted
	}

	fn get(&self, key: &str) -> Option<Value> {
		self.entries.get(key).cloned()
	}
}
