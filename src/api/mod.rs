//! HTTP client for the knowledge-base backend.

mod types;

pub use types::{
	Cluster, ClusterDocument, IndexDetail, ScrapeResponse, SearchHit, SearchResponse,
	StatusResponse, TaskStatus, TaskSummary,
};

use gloo_net::http::{Request, Response};
use log::debug;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::config::AppConfig;
use crate::error::ApiError;

/// Backend routes. Path segments and query values are percent-encoded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Endpoint<'a> {
	ScrapeWeb { url: &'a str },
	ScrapeStatus { task_id: &'a str },
	BuildIndex,
	ClusteringStatus { task_id: &'a str },
	Kill { task_id: &'a str },
	ListIndexes,
	DeleteIndex { task_id: &'a str },
	TextIndex { task_id: &'a str },
	SearchText { index_id: &'a str, query: &'a str },
}

impl Endpoint<'_> {
	pub fn path(&self) -> String {
		use urlencoding::encode;
		match *self {
			Endpoint::ScrapeWeb { url } => format!("/api/scrape_web?url={}", encode(url)),
			Endpoint::ScrapeStatus { task_id } => format!("/api/scrape_status/{}", encode(task_id)),
			Endpoint::BuildIndex => "/api/build_index_by_url".to_string(),
			Endpoint::ClusteringStatus { task_id } => {
				format!("/api/clustering_status/{}", encode(task_id))
			}
			Endpoint::Kill { task_id } => format!("/api/kill/{}", encode(task_id)),
			Endpoint::ListIndexes => "/api/text_indexes".to_string(),
			Endpoint::DeleteIndex { task_id } => format!("/api/text_indexes/{}", encode(task_id)),
			Endpoint::TextIndex { task_id } => format!("/api/text_index/{}", encode(task_id)),
			Endpoint::SearchText { index_id, query } => format!(
				"/api/search_text/{}?query={}",
				encode(index_id),
				encode(query)
			),
		}
	}
}

#[derive(Serialize)]
struct BuildRequest<'a> {
	url: &'a str,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackendClient {
	base_url: String,
}

impl BackendClient {
	pub fn new(base_url: impl Into<String>) -> Self {
		let base_url: String = base_url.into();
		Self {
			base_url: base_url.trim_end_matches('/').to_string(),
		}
	}

	pub fn from_config(config: &AppConfig) -> Self {
		Self::new(config.api_base_url.as_str())
	}

	pub fn url(&self, endpoint: Endpoint<'_>) -> String {
		format!("{}{}", self.base_url, endpoint.path())
	}

	pub async fn scrape_web(&self, url: &str) -> Result<ScrapeResponse, ApiError> {
		self.get_json(Endpoint::ScrapeWeb { url }).await
	}

	pub async fn scrape_status(&self, task_id: &str) -> Result<StatusResponse, ApiError> {
		self.get_json(Endpoint::ScrapeStatus { task_id }).await
	}

	pub async fn build_index(&self, url: &str) -> Result<ScrapeResponse, ApiError> {
		let endpoint = Endpoint::BuildIndex;
		debug!("POST {}", endpoint.path());
		let request = Request::post(&self.url(endpoint))
			.json(&BuildRequest { url })
			.map_err(|e| ApiError::Encode(e.to_string()))?;
		let response = request.send().await?;
		decode(response, endpoint).await
	}

	pub async fn clustering_status(&self, task_id: &str) -> Result<StatusResponse, ApiError> {
		self.get_json(Endpoint::ClusteringStatus { task_id }).await
	}

	pub async fn kill_task(&self, task_id: &str) -> Result<(), ApiError> {
		let endpoint = Endpoint::Kill { task_id };
		debug!("POST {}", endpoint.path());
		let response = Request::post(&self.url(endpoint)).send().await?;
		expect_success(&response, endpoint)
	}

	pub async fn list_indexes(&self) -> Result<Vec<TaskSummary>, ApiError> {
		self.get_json(Endpoint::ListIndexes).await
	}

	pub async fn delete_index(&self, task_id: &str) -> Result<(), ApiError> {
		let endpoint = Endpoint::DeleteIndex { task_id };
		debug!("DELETE {}", endpoint.path());
		let response = Request::delete(&self.url(endpoint)).send().await?;
		expect_success(&response, endpoint)
	}

	pub async fn text_index(&self, task_id: &str) -> Result<IndexDetail, ApiError> {
		self.get_json(Endpoint::TextIndex { task_id }).await
	}

	pub async fn search_text(
		&self,
		index_id: &str,
		query: &str,
	) -> Result<SearchResponse, ApiError> {
		self.get_json(Endpoint::SearchText { index_id, query }).await
	}

	async fn get_json<T: DeserializeOwned>(&self, endpoint: Endpoint<'_>) -> Result<T, ApiError> {
		debug!("GET {}", endpoint.path());
		let response = Request::get(&self.url(endpoint)).send().await?;
		decode(response, endpoint).await
	}
}

fn expect_success(response: &Response, endpoint: Endpoint<'_>) -> Result<(), ApiError> {
	if response.ok() {
		Ok(())
	} else {
		Err(ApiError::Status {
			status: response.status(),
			path: endpoint.path(),
		})
	}
}

async fn decode<T: DeserializeOwned>(
	response: Response,
	endpoint: Endpoint<'_>,
) -> Result<T, ApiError> {
	expect_success(&response, endpoint)?;
	response
		.json::<T>()
		.await
		.map_err(|e| ApiError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn paths_match_backend_routes() {
		assert_eq!(Endpoint::BuildIndex.path(), "/api/build_index_by_url");
		assert_eq!(Endpoint::ListIndexes.path(), "/api/text_indexes");
		assert_eq!(
			Endpoint::ClusteringStatus { task_id: "t1" }.path(),
			"/api/clustering_status/t1"
		);
		assert_eq!(Endpoint::Kill { task_id: "t1" }.path(), "/api/kill/t1");
		assert_eq!(
			Endpoint::DeleteIndex { task_id: "t1" }.path(),
			"/api/text_indexes/t1"
		);
		assert_eq!(Endpoint::TextIndex { task_id: "t1" }.path(), "/api/text_index/t1");
		assert_eq!(
			Endpoint::ScrapeStatus { task_id: "t1" }.path(),
			"/api/scrape_status/t1"
		);
	}

	#[test]
	fn user_input_is_encoded() {
		assert_eq!(
			Endpoint::ScrapeWeb { url: "https://example.com/a b?x=1" }.path(),
			"/api/scrape_web?url=https%3A%2F%2Fexample.com%2Fa%20b%3Fx%3D1"
		);
		assert_eq!(
			Endpoint::SearchText { index_id: "idx/1", query: "foo & bar" }.path(),
			"/api/search_text/idx%2F1?query=foo%20%26%20bar"
		);
	}

	#[test]
	fn client_trims_base_url() {
		let client = BackendClient::new("http://localhost:5009/");
		assert_eq!(
			client.url(Endpoint::ListIndexes),
			"http://localhost:5009/api/text_indexes"
		);
	}
}
