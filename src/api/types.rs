//! Response schemas of the search backend.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Local, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::components::force_graph::GraphPayload;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TaskStatus {
	Pending,
	Processing,
	Completed,
	Failed,
	Unknown(String),
}

impl TaskStatus {
	pub fn parse(raw: &str) -> Self {
		match raw.trim().to_ascii_lowercase().as_str() {
			"pending" => TaskStatus::Pending,
			"processing" | "running" | "in_progress" => TaskStatus::Processing,
			"completed" | "complete" | "done" => TaskStatus::Completed,
			"failed" | "error" => TaskStatus::Failed,
			_ => TaskStatus::Unknown(raw.to_string()),
		}
	}

	pub fn as_str(&self) -> &str {
		match self {
			TaskStatus::Pending => "pending",
			TaskStatus::Processing => "processing",
			TaskStatus::Completed => "completed",
			TaskStatus::Failed => "failed",
			TaskStatus::Unknown(raw) => raw,
		}
	}

	/// Badge class: green once completed, amber otherwise.
	pub fn badge_class(&self) -> &'static str {
		match self {
			TaskStatus::Completed => "badge success",
			TaskStatus::Failed => "badge error",
			_ => "badge warning",
		}
	}
}

impl fmt::Display for TaskStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl Default for TaskStatus {
	fn default() -> Self {
		TaskStatus::Unknown(String::new())
	}
}

impl Serialize for TaskStatus {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_str(self.as_str())
	}
}

impl<'de> Deserialize<'de> for TaskStatus {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let raw = String::deserialize(deserializer)?;
		Ok(TaskStatus::parse(&raw))
	}
}

/// One row of the index list, also the completed shape of a status poll.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskSummary {
	pub task_id: String,
	#[serde(default)]
	pub scraping_url: String,
	#[serde(default)]
	pub status: TaskStatus,
	#[serde(default)]
	pub created_at: Option<String>,
	#[serde(default)]
	pub processed_files: u64,
}

impl TaskSummary {
	/// Creation time as `MM/DD/YYYY HH:MM:SS` local time, or the raw value.
	pub fn created_display(&self) -> String {
		let Some(raw) = self.created_at.as_deref() else {
			return String::new();
		};
		const FORMAT: &str = "%m/%d/%Y %H:%M:%S";
		if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
			return dt.with_timezone(&Local).format(FORMAT).to_string();
		}
		for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
			if let Ok(naive) = NaiveDateTime::parse_from_str(raw, pattern) {
				return naive.format(FORMAT).to_string();
			}
		}
		raw.to_string()
	}
}

/// Answer to a scrape or build submission.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ScrapeResponse {
	pub task_id: String,
	#[serde(default)]
	pub message: String,
	#[serde(default)]
	pub status: TaskStatus,
}

/// Answer to a status poll. Carries the full task once completed.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
	#[serde(default)]
	pub task_id: String,
	pub status: TaskStatus,
	#[serde(default)]
	pub message: Option<String>,
	#[serde(default)]
	pub scraping_url: Option<String>,
	#[serde(default)]
	pub created_at: Option<String>,
	#[serde(default)]
	pub processed_files: Option<u64>,
}

impl StatusResponse {
	pub fn into_summary(self, task_id: &str) -> TaskSummary {
		TaskSummary {
			task_id: if self.task_id.is_empty() {
				task_id.to_string()
			} else {
				self.task_id
			},
			scraping_url: self.scraping_url.unwrap_or_default(),
			status: self.status,
			created_at: self.created_at,
			processed_files: self.processed_files.unwrap_or_default(),
		}
	}
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterDocument {
	#[serde(default)]
	pub index: u64,
	#[serde(default)]
	pub file_path: String,
	#[serde(default)]
	pub url: Option<String>,
	#[serde(default)]
	pub preview: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Cluster {
	pub size: usize,
	pub keywords: Vec<String>,
	pub documents: Vec<ClusterDocument>,
}

/// Full index payload: the task plus its link graph and clusters.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexDetail {
	#[serde(flatten)]
	pub summary: TaskSummary,
	#[serde(default)]
	pub webpage_graph: Option<GraphPayload>,
	#[serde(default)]
	pub clustering_data: Option<BTreeMap<String, Cluster>>,
}

/// Relevance score; some indexes report it preformatted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Score {
	Number(f64),
	Text(String),
}

impl fmt::Display for Score {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Score::Number(n) => write!(f, "{n:.2}"),
			Score::Text(s) => f.write_str(s),
		}
	}
}

impl Default for Score {
	fn default() -> Self {
		Score::Number(0.0)
	}
}

const EXCERPT_CHARS: usize = 1000;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
	#[serde(default)]
	pub document_id: serde_json::Value,
	#[serde(default)]
	pub score: Score,
	#[serde(default)]
	pub url: String,
	#[serde(default)]
	pub content: String,
}

impl SearchHit {
	pub fn key(&self) -> String {
		match &self.document_id {
			serde_json::Value::String(s) => s.clone(),
			other => other.to_string(),
		}
	}

	pub fn excerpt(&self) -> &str {
		match self.content.char_indices().nth(EXCERPT_CHARS) {
			Some((end, _)) => &self.content[..end],
			None => &self.content,
		}
	}
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
	#[serde(default)]
	pub results: Vec<SearchHit>,
	#[serde(default)]
	pub suggestion_text: Option<String>,
	#[serde(default)]
	pub original_query: Option<String>,
}

impl SearchResponse {
	/// Query shown in the result header: the suggestion if any, else the query sent.
	pub fn shown_query(&self) -> &str {
		self.suggestion_text
			.as_deref()
			.filter(|s| !s.trim().is_empty())
			.or(self.original_query.as_deref())
			.unwrap_or_default()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn index_detail_with_graph_and_clusters() {
		let json = r#"{
			"task_id": "t1",
			"scraping_url": "https://example.com",
			"status": "completed",
			"created_at": "2024-11-27T10:00:00",
			"processed_files": 12,
			"webpage_graph": {
				"nodes": [{"id": "a", "metadata": {"content_length": 10, "links": 2}}, {"id": "b"}],
				"links": [{"source": "a", "target": "b"}]
			},
			"clustering_data": {
				"cluster_0": {
					"size": 1,
					"keywords": ["rust"],
					"documents": [{"index": 3, "file_path": "a.txt", "preview": "hello"}]
				}
			}
		}"#;
		let detail: IndexDetail = serde_json::from_str(json).unwrap();
		assert_eq!(detail.summary.task_id, "t1");
		assert_eq!(detail.summary.status, TaskStatus::Completed);
		assert_eq!(detail.summary.created_display(), "11/27/2024 10:00:00");
		let graph = detail.webpage_graph.unwrap().into_graph().unwrap();
		assert_eq!(graph.nodes.len(), 2);
		assert_eq!(graph.links[0].weight, 1.0);
		assert_eq!(detail.clustering_data.unwrap()["cluster_0"].documents[0].index, 3);
	}

	#[test]
	fn index_detail_without_graph() {
		let detail: IndexDetail =
			serde_json::from_str(r#"{"task_id": "t2", "status": "processing"}"#).unwrap();
		assert!(detail.webpage_graph.is_none());
		assert!(detail.clustering_data.is_none());
		assert_eq!(detail.summary.status, TaskStatus::Processing);
	}

	#[test]
	fn unknown_status_is_kept() {
		let status: TaskStatus = serde_json::from_str(r#""queued""#).unwrap();
		assert_eq!(status, TaskStatus::Unknown("queued".into()));
		assert_eq!(status.badge_class(), "badge warning");
	}

	#[test]
	fn completed_poll_becomes_summary() {
		let poll: StatusResponse = serde_json::from_str(
			r#"{"status": "completed", "scraping_url": "https://example.com", "processed_files": 4}"#,
		)
		.unwrap();
		let summary = poll.into_summary("t1");
		assert_eq!(summary.task_id, "t1");
		assert_eq!(summary.processed_files, 4);
	}

	#[test]
	fn empty_search_is_not_an_error() {
		let response: SearchResponse = serde_json::from_str(r#"{"results": []}"#).unwrap();
		assert!(response.results.is_empty());
		assert_eq!(response.shown_query(), "");
	}

	#[test]
	fn search_hits_accept_loose_ids_and_scores() {
		let response: SearchResponse = serde_json::from_str(
			r#"{"results": [
				{"document_id": 7, "score": 0.91234, "url": "u", "content": "c"},
				{"document_id": "x", "score": "high"}
			], "suggestion_text": "", "original_query": "foo"}"#,
		)
		.unwrap();
		assert_eq!(response.results[0].key(), "7");
		assert_eq!(response.results[0].score.to_string(), "0.91");
		assert_eq!(response.results[1].score.to_string(), "high");
		assert_eq!(response.shown_query(), "foo");
	}

	#[test]
	fn excerpt_is_capped_on_char_boundary() {
		let hit = SearchHit {
			content: "é".repeat(1500),
			..SearchHit::default()
		};
		assert_eq!(hit.excerpt().chars().count(), 1000);
	}
}
