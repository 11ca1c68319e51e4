use std::{sync::Arc, time::Duration};

use reqwest::{Client, Method, StatusCode, Url, header::HeaderMap};
use serde_json::Value;

use crate::{Error, Result, cache::ResponseCache};

/// Shared HTTP client for the provider endpoints, optionally backed by the offline cache.
#[derive(Clone, Debug, Default)]
pub struct HttpClient {
	client: Client,
	cache: Option<Arc<ResponseCache>>,
}
impl HttpClient {
	pub fn new(cache: Option<Arc<ResponseCache>>) -> Self {
		Self { client: Client::new(), cache }
	}

	pub async fn get_json(
		&self,
		url: Url,
		headers: HeaderMap,
		timeout: Duration,
	) -> Result<Value> {
		let sent = self.client.get(url.clone()).headers(headers).timeout(timeout).send().await;
		let res = match sent {
			Ok(res) => res,
			Err(err) => return self.serve_cached(url, err),
		};
		let res = res.error_for_status()?;
		let status = res.status();
		let json: Value = res.json().await?;

		if status == StatusCode::OK
			&& let Some(cache) = self.cache.as_deref()
		{
			cache.put(&Method::GET, &url, json.clone());
		}

		Ok(json)
	}

	fn serve_cached(&self, url: Url, err: reqwest::Error) -> Result<Value> {
		let Some(cache) = self.cache.as_deref() else {
			return Err(Error::Reqwest(err));
		};

		match cache.get(&Method::GET, &url) {
			Some(json) => {
				tracing::info!(path = url.path(), error = %err, "Serving cached response.");

				Ok(json)
			},
			None => Err(Error::Offline { url: url.to_string(), source: err }),
		}
	}
}

pub fn endpoint_url(api_base: &str, path: &str, query: &[(&str, String)]) -> Result<Url> {
	let raw = format!("{}{}", api_base.trim_end_matches('/'), path);
	let mut url = Url::parse(&raw)
		.map_err(|err| Error::InvalidConfig { message: format!("Invalid endpoint {raw}: {err}") })?;

	if !query.is_empty() {
		let mut pairs = url.query_pairs_mut();

		for (key, value) in query {
			pairs.append_pair(key, value);
		}
	}

	Ok(url)
}
