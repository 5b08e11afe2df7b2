//! Turns raw graph data into deduplicated, styled nodes and edges.
//!
//! Everything here runs before a simulation exists, so a failure leaves the
//! current layout untouched.

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use super::types::{GraphData, GraphLink, GraphNode};

pub const MIN_NODE_SIZE: f64 = 8.0;
pub const MAX_NODE_SIZE: f64 = 24.0;
const NODE_SIZE_SCALE: f64 = 3.2;

pub const MIN_EDGE_WIDTH: f64 = 0.5;
pub const MAX_EDGE_WIDTH: f64 = 4.0;
pub const MIN_EDGE_OPACITY: f64 = 0.15;
pub const MAX_EDGE_OPACITY: f64 = 0.8;

/// Connection bands, lightest first.
pub const BAND_COLORS: [&str; 4] = ["#D1E5FD", "#97C2FC", "#2B7CE9", "#1B4C89"];

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LayoutError {
	#[error("node at position {0} has an empty id")]
	EmptyNodeId(usize),
	#[error("node {id} has a non-finite rank")]
	InvalidRank { id: String },
	#[error("edge {from} -> {to} has a non-finite weight")]
	InvalidWeight { from: String, to: String },
}

#[derive(Clone, Debug, PartialEq)]
pub struct StyledNode {
	pub node: GraphNode,
	pub size: f64,
	pub color: &'static str,
	pub connections: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct StyledEdge {
	/// Indices into [`PreparedGraph::nodes`].
	pub source: usize,
	pub target: usize,
	pub weight: f64,
	pub width: f64,
	pub opacity: f64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PreparedGraph {
	pub nodes: Vec<StyledNode>,
	pub edges: Vec<StyledEdge>,
	/// Edges dropped because an endpoint is not in the node list.
	pub dangling: usize,
}

impl PreparedGraph {
	pub fn index_of(&self, id: &str) -> Option<usize> {
		self.nodes.iter().position(|n| n.node.id == id)
	}
}

pub fn dedup_nodes(nodes: &[GraphNode]) -> Vec<GraphNode> {
	let mut seen = HashSet::new();
	nodes
		.iter()
		.filter(|n| seen.insert(n.id.as_str()))
		.cloned()
		.collect()
}

pub fn dedup_links(links: &[GraphLink]) -> Vec<GraphLink> {
	let mut seen = HashSet::new();
	links
		.iter()
		.filter(|l| seen.insert((l.source.as_str(), l.target.as_str())))
		.cloned()
		.collect()
}

/// Log-damped size from page volume, clamped so outliers stay readable.
pub fn node_size(content_length: u64, links: u64) -> f64 {
	let volume = content_length.saturating_add(links) as f64;
	(MIN_NODE_SIZE + NODE_SIZE_SCALE * volume.ln_1p() / std::f64::consts::LN_10)
		.clamp(MIN_NODE_SIZE, MAX_NODE_SIZE)
}

pub fn band_color(connections: usize, max_connections: usize) -> &'static str {
	let c = connections as f64;
	let max = max_connections as f64;
	if connections == 0 {
		BAND_COLORS[0]
	} else if c <= 0.2 * max {
		BAND_COLORS[1]
	} else if c <= 0.5 * max {
		BAND_COLORS[2]
	} else {
		BAND_COLORS[3]
	}
}

/// Width and opacity for an edge weight. Weight 1 maps to (1.0, 0.3).
pub fn edge_style(weight: f64) -> (f64, f64) {
	let w = weight.max(0.0).ln_1p();
	let doublings = w / std::f64::consts::LN_2;
	let width = (MIN_EDGE_WIDTH + 0.5 * doublings).clamp(MIN_EDGE_WIDTH, MAX_EDGE_WIDTH);
	let opacity = (MIN_EDGE_OPACITY + 0.15 * doublings).clamp(MIN_EDGE_OPACITY, MAX_EDGE_OPACITY);
	(width, opacity)
}

pub fn prepare(data: &GraphData) -> Result<PreparedGraph, LayoutError> {
	let nodes = dedup_nodes(&data.nodes);
	let links = dedup_links(&data.links);

	for (i, node) in nodes.iter().enumerate() {
		if node.id.is_empty() {
			return Err(LayoutError::EmptyNodeId(i));
		}
		if node.rank.is_some_and(|r| !r.is_finite()) {
			return Err(LayoutError::InvalidRank {
				id: node.id.clone(),
			});
		}
	}
	if let Some(bad) = links.iter().find(|l| !l.weight.is_finite()) {
		return Err(LayoutError::InvalidWeight {
			from: bad.source.clone(),
			to: bad.target.clone(),
		});
	}

	let index: HashMap<&str, usize> = nodes
		.iter()
		.enumerate()
		.map(|(i, n)| (n.id.as_str(), i))
		.collect();

	let mut connections = vec![0usize; nodes.len()];
	let mut edges = Vec::with_capacity(links.len());
	let mut dangling = 0;
	for link in &links {
		let (Some(&source), Some(&target)) =
			(index.get(link.source.as_str()), index.get(link.target.as_str()))
		else {
			dangling += 1;
			continue;
		};
		connections[source] += 1;
		connections[target] += 1;
		let (width, opacity) = edge_style(link.weight);
		edges.push(StyledEdge {
			source,
			target,
			weight: link.weight,
			width,
			opacity,
		});
	}

	let max_connections = connections.iter().copied().max().unwrap_or(0);
	let nodes = nodes
		.into_iter()
		.zip(connections)
		.map(|(node, connections)| {
			let meta = node.metadata.clone().unwrap_or_default();
			StyledNode {
				size: node_size(meta.content_length, meta.links),
				color: band_color(connections, max_connections),
				connections,
				node,
			}
		})
		.collect();

	Ok(PreparedGraph {
		nodes,
		edges,
		dangling,
	})
}
