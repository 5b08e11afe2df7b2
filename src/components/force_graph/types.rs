use serde::{Deserialize, Serialize};

/// Page statistics the backend attaches to a node.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeMetadata {
	pub content_length: u64,
	pub links: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
	pub id: String,
	#[serde(default)]
	pub label: Option<String>,
	#[serde(default)]
	pub title: Option<String>,
	#[serde(default)]
	pub url: Option<String>,
	#[serde(default)]
	pub metadata: Option<NodeMetadata>,
	#[serde(default)]
	pub rank: Option<f64>,
}

fn default_weight() -> f64 {
	1.0
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GraphLink {
	pub source: String,
	pub target: String,
	#[serde(default = "default_weight")]
	pub weight: f64,
}

/// Well-formed graph: both lists present.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphData {
	pub nodes: Vec<GraphNode>,
	pub links: Vec<GraphLink>,
}

/// Graph as the backend sends it. Either list may be missing.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphPayload {
	#[serde(default)]
	pub nodes: Option<Vec<GraphNode>>,
	#[serde(default)]
	pub links: Option<Vec<GraphLink>>,
}

impl GraphPayload {
	pub fn into_graph(self) -> Option<GraphData> {
		Some(GraphData {
			nodes: self.nodes?,
			links: self.links?,
		})
	}
}
