//! Physics backend for the canvas.
//!
//! [`LayoutEngine`] is the narrow surface the canvas state drives; swapping the
//! simulation means providing another implementation of it.

use std::collections::HashMap;
use std::f64::consts::PI;

use force_graph::{DefaultNodeIdx, EdgeData, ForceGraph, NodeData, SimulationParameters};

use super::prepare::PreparedGraph;
use super::presets::PhysicsParams;
use super::state::ViewTransform;

/// Largest per-step node displacement still considered at rest.
const REST_MOTION: f64 = 0.5;
const MAX_ZOOM: f64 = 10.0;
const MIN_ZOOM: f64 = 0.1;
const FIT_PADDING: f64 = 40.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
	pub min_x: f64,
	pub min_y: f64,
	pub max_x: f64,
	pub max_y: f64,
}

pub trait LayoutEngine {
	/// Replace the simulation parameters, keeping current positions.
	fn configure(&mut self, params: &PhysicsParams);

	/// Advance the simulation by one iteration.
	fn step(&mut self, dt: f32);

	fn is_stable(&self) -> bool;

	/// World positions, indexed like the prepared nodes.
	fn positions(&self) -> &[(f64, f64)];

	/// Place a node and pin it there.
	fn move_node(&mut self, idx: usize, x: f64, y: f64);

	fn radius(&self, idx: usize) -> f64;

	fn bounds(&self) -> Option<Bounds> {
		let positions = self.positions();
		if positions.is_empty() {
			return None;
		}
		let mut b = Bounds {
			min_x: f64::INFINITY,
			min_y: f64::INFINITY,
			max_x: f64::NEG_INFINITY,
			max_y: f64::NEG_INFINITY,
		};
		for (i, &(x, y)) in positions.iter().enumerate() {
			let r = self.radius(i);
			b.min_x = b.min_x.min(x - r);
			b.min_y = b.min_y.min(y - r);
			b.max_x = b.max_x.max(x + r);
			b.max_y = b.max_y.max(y + r);
		}
		Some(b)
	}

	/// Transform that centers the content in a `width` x `height` viewport.
	fn fit(&self, width: f64, height: f64) -> Option<ViewTransform> {
		let b = self.bounds()?;
		let (w, h) = (
			(b.max_x - b.min_x).max(1.0) + 2.0 * FIT_PADDING,
			(b.max_y - b.min_y).max(1.0) + 2.0 * FIT_PADDING,
		);
		let k = (width / w).min(height / h).clamp(MIN_ZOOM, MAX_ZOOM);
		let (cx, cy) = ((b.min_x + b.max_x) / 2.0, (b.min_y + b.max_y) / 2.0);
		Some(ViewTransform {
			x: width / 2.0 - cx * k,
			y: height / 2.0 - cy * k,
			k,
		})
	}
}

fn simulation_parameters(params: &PhysicsParams) -> SimulationParameters {
	SimulationParameters {
		force_charge: (params.repulsion.abs() * params.spring_length * 0.000375) as f32,
		force_spring: (params.spring_constant * 1.25) as f32,
		force_max: 100.0,
		node_speed: 3000.0,
		damping_factor: (1.0 - params.damping).clamp(0.0, 1.0) as f32,
	}
}

/// [`LayoutEngine`] over the `force_graph` crate, with central gravity and an
/// anti-overlap pass applied after each step.
pub struct ForceLayout {
	graph: ForceGraph<usize, ()>,
	params: PhysicsParams,
	links: Vec<(usize, usize)>,
	radii: Vec<f64>,
	pinned: Vec<bool>,
	positions: Vec<(f64, f64)>,
	last_motion: f64,
}

impl ForceLayout {
	pub fn new(prepared: &PreparedGraph, params: &PhysicsParams) -> Self {
		let n = prepared.nodes.len();
		let ring = params.spring_length * 0.5 * (n as f64).sqrt().max(1.0);
		let positions = (0..n)
			.map(|i| {
				let angle = (i as f64) * 2.0 * PI / n as f64;
				(ring * angle.cos(), ring * angle.sin())
			})
			.collect();
		// self-loops carry no layout information
		let links = prepared
			.edges
			.iter()
			.filter(|e| e.source != e.target)
			.map(|e| (e.source, e.target))
			.collect();

		let mut layout = Self {
			graph: ForceGraph::new(simulation_parameters(params)),
			params: *params,
			links,
			radii: prepared.nodes.iter().map(|n| n.size / 2.0).collect(),
			pinned: vec![false; n],
			positions,
			last_motion: f64::INFINITY,
		};
		layout.rebuild();
		layout
	}

	fn rebuild(&mut self) {
		let mut graph = ForceGraph::new(simulation_parameters(&self.params));
		let handles: Vec<DefaultNodeIdx> = self
			.positions
			.iter()
			.enumerate()
			.map(|(i, &(x, y))| {
				graph.add_node(NodeData {
					x: x as f32,
					y: y as f32,
					mass: (10.0 * self.radii[i] / 4.0) as f32,
					is_anchor: self.pinned[i],
					user_data: i,
				})
			})
			.collect();
		for &(src, tgt) in &self.links {
			graph.add_edge(handles[src], handles[tgt], EdgeData::default());
		}
		self.graph = graph;
	}

	fn apply_corrections(&self, next: &mut [(f64, f64)], dt: f64) {
		let gravity = self.params.central_gravity * dt;
		for (i, p) in next.iter_mut().enumerate() {
			if !self.pinned[i] {
				p.0 -= p.0 * gravity;
				p.1 -= p.1 * gravity;
			}
		}

		if self.params.avoid_overlap > 0.0 {
			self.separate_overlaps(next);
		}
	}

	/// Push apart nodes closer than their padded radii. Nodes are bucketed in a
	/// grid whose cells are as wide as the largest contact distance, so only
	/// neighbouring cells need comparing.
	fn separate_overlaps(&self, next: &mut [(f64, f64)]) {
		let factor = 1.0 + self.params.avoid_overlap;
		let cell = 2.0 * self.radii.iter().copied().fold(0.0, f64::max) * factor;
		if cell <= 0.0 || !cell.is_finite() {
			return;
		}
		let key = |p: (f64, f64)| ((p.0 / cell).floor() as i64, (p.1 / cell).floor() as i64);
		let mut grid: HashMap<(i64, i64), Vec<usize>> = HashMap::new();
		for (i, &p) in next.iter().enumerate() {
			grid.entry(key(p)).or_default().push(i);
		}

		for i in 0..next.len() {
			let (cx, cy) = key(next[i]);
			for gx in (cx - 1)..=(cx + 1) {
				for gy in (cy - 1)..=(cy + 1) {
					let Some(bucket) = grid.get(&(gx, gy)) else {
						continue;
					};
					for &j in bucket.iter().filter(|&&j| j > i) {
						let (dx, dy) = (next[j].0 - next[i].0, next[j].1 - next[i].1);
						let dist = (dx * dx + dy * dy).sqrt();
						let min_dist = (self.radii[i] + self.radii[j]) * factor;
						if dist >= min_dist || dist < 1e-6 {
							continue;
						}
						let push = (min_dist - dist) / 2.0;
						let (ux, uy) = (dx / dist, dy / dist);
						if !self.pinned[i] {
							next[i].0 -= ux * push;
							next[i].1 -= uy * push;
						}
						if !self.pinned[j] {
							next[j].0 += ux * push;
							next[j].1 += uy * push;
						}
					}
				}
			}
		}
	}
}

impl LayoutEngine for ForceLayout {
	fn configure(&mut self, params: &PhysicsParams) {
		self.params = *params;
		self.last_motion = f64::INFINITY;
		self.rebuild();
	}

	fn step(&mut self, dt: f32) {
		if self.positions.is_empty() {
			self.last_motion = 0.0;
			return;
		}
		self.graph.update(dt);

		let mut next = self.positions.clone();
		self.graph.visit_nodes(|node| {
			let (x, y) = (node.x() as f64, node.y() as f64);
			if x.is_finite() && y.is_finite() {
				next[node.data.user_data] = (x, y);
			}
		});
		self.apply_corrections(&mut next, dt as f64);

		self.graph.visit_nodes_mut(|node| {
			let (x, y) = next[node.data.user_data];
			node.data.x = x as f32;
			node.data.y = y as f32;
		});
		self.last_motion = self
			.positions
			.iter()
			.zip(&next)
			.map(|(a, b)| ((b.0 - a.0).powi(2) + (b.1 - a.1).powi(2)).sqrt())
			.fold(0.0, f64::max);
		self.positions = next;
	}

	fn is_stable(&self) -> bool {
		self.last_motion < REST_MOTION
	}

	fn positions(&self) -> &[(f64, f64)] {
		&self.positions
	}

	fn move_node(&mut self, idx: usize, x: f64, y: f64) {
		let Some(slot) = self.positions.get_mut(idx) else {
			return;
		};
		*slot = (x, y);
		self.pinned[idx] = true;
		self.graph.visit_nodes_mut(|node| {
			if node.data.user_data == idx {
				node.data.x = x as f32;
				node.data.y = y as f32;
				node.data.is_anchor = true;
			}
		});
	}

	fn radius(&self, idx: usize) -> f64 {
		self.radii.get(idx).copied().unwrap_or(0.0)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::force_graph::prepare::prepare;
	use crate::components::force_graph::presets::LayoutPreset;
	use crate::components::force_graph::types::{GraphData, GraphLink, GraphNode};

	fn chain(n: usize) -> PreparedGraph {
		let nodes = (0..n)
			.map(|i| GraphNode {
				id: format!("n{i}"),
				..GraphNode::default()
			})
			.collect();
		let links = (1..n)
			.map(|i| GraphLink {
				source: format!("n{}", i - 1),
				target: format!("n{i}"),
				weight: 1.0,
			})
			.collect();
		prepare(&GraphData { nodes, links }).unwrap()
	}

	#[test]
	fn default_preset_matches_canvas_tuning() {
		let p = simulation_parameters(&LayoutPreset::Default.params());
		assert!((p.force_charge - 150.0).abs() < 1e-3);
		assert!((p.force_spring - 0.05).abs() < 1e-6);
		assert!((p.damping_factor - 0.91).abs() < 1e-6);
	}

	#[test]
	fn steps_keep_positions_finite() {
		let mut layout = ForceLayout::new(&chain(12), &LayoutPreset::Default.params());
		for _ in 0..200 {
			layout.step(0.016);
		}
		assert_eq!(layout.positions().len(), 12);
		assert!(
			layout
				.positions()
				.iter()
				.all(|(x, y)| x.is_finite() && y.is_finite())
		);
	}

	#[test]
	fn configure_keeps_positions() {
		let mut layout = ForceLayout::new(&chain(5), &LayoutPreset::Default.params());
		layout.step(0.016);
		let before = layout.positions().to_vec();
		layout.configure(&LayoutPreset::Compact.params());
		assert_eq!(layout.positions(), before.as_slice());
		assert!(!layout.is_stable());
	}

	#[test]
	fn moved_node_stays_pinned() {
		let mut layout = ForceLayout::new(&chain(4), &LayoutPreset::Default.params());
		layout.move_node(2, 500.0, -500.0);
		for _ in 0..20 {
			layout.step(0.016);
		}
		assert_eq!(layout.positions()[2], (500.0, -500.0));
	}

	#[test]
	fn fit_centers_content() {
		let layout = ForceLayout::new(&chain(6), &LayoutPreset::Default.params());
		let t = layout.fit(800.0, 600.0).unwrap();
		let b = layout.bounds().unwrap();
		let (cx, cy) = ((b.min_x + b.max_x) / 2.0, (b.min_y + b.max_y) / 2.0);
		assert!((cx * t.k + t.x - 400.0).abs() < 1e-6);
		assert!((cy * t.k + t.y - 300.0).abs() < 1e-6);
		assert!((MIN_ZOOM..=MAX_ZOOM).contains(&t.k));
	}

	#[test]
	fn overlapping_nodes_are_pushed_apart() {
		let layout = ForceLayout::new(&chain(4), &LayoutPreset::Default.params());
		let contact = (layout.radius(0) + layout.radius(1)) * (1.0 + layout.params.avoid_overlap);
		let mut next = vec![(0.0, 0.0), (contact * 0.5, 0.0), (1_000.0, 1_000.0), (-1_000.0, 0.0)];
		layout.separate_overlaps(&mut next);

		let dist = ((next[1].0 - next[0].0).powi(2) + (next[1].1 - next[0].1).powi(2)).sqrt();
		assert!((dist - contact).abs() < 1e-9);
		assert_eq!(next[2], (1_000.0, 1_000.0));
		assert_eq!(next[3], (-1_000.0, 0.0));
	}

	#[test]
	fn overlap_pass_crosses_cell_borders() {
		let layout = ForceLayout::new(&chain(2), &LayoutPreset::Default.params());
		let contact = (layout.radius(0) + layout.radius(1)) * (1.0 + layout.params.avoid_overlap);
		// straddle the cell boundary at x = 0
		let mut next = vec![(-contact * 0.25, 0.0), (contact * 0.25, 0.0)];
		layout.separate_overlaps(&mut next);
		assert!((next[1].0 - next[0].0 - contact).abs() < 1e-9);
	}

	#[test]
	fn empty_graph_is_immediately_stable() {
		let empty = PreparedGraph::default();
		let mut layout = ForceLayout::new(&empty, &LayoutPreset::Default.params());
		layout.step(0.016);
		assert!(layout.is_stable());
		assert!(layout.fit(800.0, 600.0).is_none());
	}
}
