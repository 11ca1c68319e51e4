pub mod history;
pub mod recommend;

mod error;

pub use error::{Error, Result};
pub use history::{HistoryEntry, HistoryStore, JsonFileHistory, MemoryHistory};
pub use recommend::{
	CorpusOutcome, NO_RECOMMENDATIONS, RecommendationResult, RetrievalOutcome, Tier,
};

use std::{future::Future, pin::Pin, sync::Arc};

use chakula_config::{Config, CorpusProviderConfig, ProviderConfig};
use chakula_domain::{Candidate, QueryVector, ReferenceFoodRecord};
use chakula_providers::{cache::ResponseCache, corpus, http::HttpClient, recommender};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait RecommenderProvider
where
	Self: Send + Sync,
{
	fn recommend<'a>(
		&'a self,
		cfg: &'a ProviderConfig,
		vector: &'a QueryVector,
		top_k: u32,
	) -> BoxFuture<'a, Result<Vec<Candidate>>>;
}

pub trait CorpusProvider
where
	Self: Send + Sync,
{
	fn fetch<'a>(
		&'a self,
		cfg: &'a CorpusProviderConfig,
	) -> BoxFuture<'a, Result<Vec<ReferenceFoodRecord>>>;
}

#[derive(Clone)]
pub struct Providers {
	pub recommender: Arc<dyn RecommenderProvider>,
	pub corpus: Arc<dyn CorpusProvider>,
}
impl Providers {
	pub fn new(recommender: Arc<dyn RecommenderProvider>, corpus: Arc<dyn CorpusProvider>) -> Self {
		Self { recommender, corpus }
	}

	/// Both providers over one HTTP client.
	pub fn http(client: HttpClient) -> Self {
		let provider = Arc::new(HttpProviders { client });

		Self { recommender: provider.clone(), corpus: provider }
	}
}

impl Default for Providers {
	fn default() -> Self {
		Self::http(HttpClient::default())
	}
}

pub struct ChakulaService {
	pub cfg: Config,
	pub providers: Providers,
	pub history: Arc<dyn HistoryStore>,
}
impl ChakulaService {
	/// HTTP providers, wrapped by the offline cache when enabled, and history from
	/// `history.path` (in memory when unset).
	pub fn new(cfg: Config) -> Self {
		let cache = cfg.cache.enabled.then(|| Arc::new(ResponseCache::from_config(&cfg.cache)));
		let providers = Providers::http(HttpClient::new(cache));
		let history = history_store(&cfg);

		Self { cfg, providers, history }
	}

	pub fn with_parts(cfg: Config, providers: Providers, history: Arc<dyn HistoryStore>) -> Self {
		Self { cfg, providers, history }
	}
}

struct HttpProviders {
	client: HttpClient,
}

impl RecommenderProvider for HttpProviders {
	fn recommend<'a>(
		&'a self,
		cfg: &'a ProviderConfig,
		vector: &'a QueryVector,
		top_k: u32,
	) -> BoxFuture<'a, Result<Vec<Candidate>>> {
		Box::pin(async move {
			recommender::recommend(&self.client, cfg, vector, top_k).await.map_err(Error::from)
		})
	}
}

impl CorpusProvider for HttpProviders {
	fn fetch<'a>(
		&'a self,
		cfg: &'a CorpusProviderConfig,
	) -> BoxFuture<'a, Result<Vec<ReferenceFoodRecord>>> {
		Box::pin(async move { corpus::fetch_corpus(&self.client, cfg).await.map_err(Error::from) })
	}
}

fn history_store(cfg: &Config) -> Arc<dyn HistoryStore> {
	let limit = cfg.history.limit as usize;

	match cfg.history.path.as_ref() {
		Some(path) => Arc::new(JsonFileHistory::new(path.clone(), limit)),
		None => Arc::new(MemoryHistory::new(limit)),
	}
}
