use std::collections::HashSet;

use log::{debug, error, info};

use super::engine::{ForceLayout, LayoutEngine};
use super::prepare::{self, LayoutError, PreparedGraph};
use super::presets::LayoutPreset;
use super::types::{GraphNode, GraphPayload};

/// Hard cap on stabilization iterations for one load or preset change.
pub const STABILIZATION_ITERATIONS: u32 = 1000;
/// Upper bound on iterations in one animation frame, reached by small graphs.
pub const MAX_ITERATIONS_PER_FRAME: u32 = 50;
/// Node-steps one frame may spend; larger graphs get fewer iterations.
const FRAME_NODE_STEPS: usize = 4000;
/// Wall-clock share of a frame given to the simulation, in milliseconds.
pub const FRAME_BUDGET_MS: f64 = 10.0;
pub const HIT_PADDING: f64 = 4.0;
const STEP_DT: f32 = 0.016;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LayoutPhase {
	#[default]
	Empty,
	Loading,
	Stabilizing {
		iteration: u32,
	},
	Stable,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadOutcome {
	/// Payload lacked nodes or links; nothing changed.
	Skipped,
	Loaded,
}

#[derive(Clone, Debug, Default)]
pub struct DragState {
	pub active: bool,
	pub node_idx: Option<usize>,
	pub start_x: f64,
	pub start_y: f64,
	pub node_start_x: f64,
	pub node_start_y: f64,
	pub moved: bool,
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

#[derive(Clone, Debug, Default)]
pub struct HoverState {
	pub node: Option<usize>,
	pub neighbors: HashSet<usize>,
	pub highlight_t: f64,
	pub prev_node: Option<usize>,
	pub prev_neighbors: HashSet<usize>,
	delay_t: f64,
}

pub type ProgressCallback = Box<dyn FnMut(f64)>;

/// Iteration cap for one frame on a graph of `nodes` nodes. Always at least one.
pub fn iterations_per_frame(nodes: usize) -> u32 {
	(FRAME_NODE_STEPS / nodes.max(1)).clamp(1, MAX_ITERATIONS_PER_FRAME as usize) as u32
}

pub struct ForceGraphState {
	pub graph: PreparedGraph,
	engine: Option<Box<dyn LayoutEngine>>,
	pub phase: LayoutPhase,
	pub preset: LayoutPreset,
	pub transform: ViewTransform,
	pub drag: DragState,
	pub pan: PanState,
	pub hover: HoverState,
	pub width: f64,
	pub height: f64,
	pub edges_visible: bool,
	pub flow_time: f64,
	on_progress: Option<ProgressCallback>,
}

impl ForceGraphState {
	pub fn new(width: f64, height: f64) -> Self {
		Self {
			graph: PreparedGraph::default(),
			engine: None,
			phase: LayoutPhase::Empty,
			preset: LayoutPreset::Default,
			transform: ViewTransform {
				x: width / 2.0,
				y: height / 2.0,
				k: 1.0,
			},
			drag: DragState::default(),
			pan: PanState::default(),
			hover: HoverState::default(),
			width,
			height,
			edges_visible: true,
			flow_time: 0.0,
			on_progress: None,
		}
	}

	/// Called with a fraction in `[0, 1]` as stabilization advances.
	pub fn set_progress_callback(&mut self, cb: impl FnMut(f64) + 'static) {
		self.on_progress = Some(Box::new(cb));
	}

	fn report_progress(&mut self, fraction: f64) {
		if let Some(cb) = self.on_progress.as_mut() {
			cb(fraction.clamp(0.0, 1.0));
		}
	}

	/// Replace the current graph. Malformed payloads are skipped without
	/// touching the current layout; invalid data is logged and also leaves it
	/// in place.
	pub fn load_graph(&mut self, payload: &GraphPayload) -> Result<LoadOutcome, LayoutError> {
		let Some(data) = payload.clone().into_graph() else {
			debug!("graph: payload without nodes or links, skipping");
			return Ok(LoadOutcome::Skipped);
		};

		let previous = self.phase;
		self.phase = LayoutPhase::Loading;
		let prepared = match prepare::prepare(&data) {
			Ok(prepared) => prepared,
			Err(e) => {
				error!("graph: failed to build layout: {e}");
				self.phase = previous;
				return Err(e);
			}
		};

		// the old simulation is gone before the new one exists
		self.engine = None;
		self.drag = DragState::default();
		self.pan = PanState::default();
		self.hover = HoverState::default();

		info!(
			"graph: {} nodes, {} edges ({} dangling dropped)",
			prepared.nodes.len(),
			prepared.edges.len(),
			prepared.dangling
		);
		self.engine = Some(Box::new(ForceLayout::new(&prepared, &self.preset.params())));
		self.graph = prepared;
		self.phase = LayoutPhase::Stabilizing { iteration: 0 };
		self.report_progress(0.0);
		Ok(LoadOutcome::Loaded)
	}

	pub fn apply_preset(&mut self, preset: LayoutPreset) {
		self.preset = preset;
		self.stabilize();
	}

	/// Re-arm the simulation with the current preset.
	pub fn stabilize(&mut self) {
		let Some(engine) = self.engine.as_mut() else {
			return;
		};
		engine.configure(&self.preset.params());
		self.phase = LayoutPhase::Stabilizing { iteration: 0 };
		self.report_progress(0.0);
	}

	pub fn stop_physics(&mut self) {
		if matches!(self.phase, LayoutPhase::Stabilizing { .. }) {
			self.phase = LayoutPhase::Stable;
			self.report_progress(1.0);
		}
	}

	pub fn fit_view(&mut self) {
		if let Some(t) = self
			.engine
			.as_ref()
			.and_then(|e| e.fit(self.width, self.height))
		{
			self.transform = t;
		}
	}

	pub fn toggle_edge_visibility(&mut self) -> bool {
		self.edges_visible = !self.edges_visible;
		self.edges_visible
	}

	pub fn select_node(&self, id: &str) -> Option<&GraphNode> {
		self.graph.index_of(id).map(|idx| &self.graph.nodes[idx].node)
	}

	pub fn is_stable(&self) -> bool {
		matches!(self.phase, LayoutPhase::Stable)
	}

	pub fn positions(&self) -> &[(f64, f64)] {
		self.engine.as_ref().map(|e| e.positions()).unwrap_or(&[])
	}

	pub fn move_node(&mut self, idx: usize, x: f64, y: f64) {
		if let Some(engine) = self.engine.as_mut() {
			engine.move_node(idx, x, y);
		}
	}

	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		(
			(sx - self.transform.x) / self.transform.k,
			(sy - self.transform.y) / self.transform.k,
		)
	}

	pub fn node_at_position(&self, sx: f64, sy: f64) -> Option<usize> {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		let mut found = None;
		for (idx, &(x, y)) in self.positions().iter().enumerate() {
			let (dx, dy) = (x - gx, y - gy);
			let reach = self.graph.nodes[idx].size / 2.0 + HIT_PADDING;
			if (dx * dx + dy * dy).sqrt() < reach {
				found = Some(idx);
			}
		}
		found
	}

	pub fn set_hover(&mut self, node: Option<usize>) {
		if self.hover.node == node {
			return;
		}
		let was_hovering = self.hover.node.is_some();

		// Save previous state for fade-out
		if was_hovering && node.is_none() {
			self.hover.prev_node = self.hover.node.take();
			self.hover.prev_neighbors = std::mem::take(&mut self.hover.neighbors);
		} else {
			self.hover.prev_node = None;
			self.hover.prev_neighbors.clear();
		}

		self.hover.node = node;
		self.hover.neighbors.clear();

		if let Some(idx) = node {
			if !was_hovering {
				self.hover.delay_t = 0.0;
			}
			for edge in &self.graph.edges {
				if edge.source == idx {
					self.hover.neighbors.insert(edge.target);
				} else if edge.target == idx {
					self.hover.neighbors.insert(edge.source);
				}
			}
		}
	}

	pub fn is_highlighted(&self, idx: usize) -> bool {
		self.hover.node == Some(idx)
			|| self.hover.neighbors.contains(&idx)
			|| self.hover.prev_node == Some(idx)
			|| self.hover.prev_neighbors.contains(&idx)
	}

	pub fn is_hovered(&self, idx: usize) -> bool {
		self.hover.node == Some(idx) || self.hover.prev_node == Some(idx)
	}

	pub fn has_active_highlight(&self) -> bool {
		self.hover.node.is_some() || self.hover.prev_node.is_some()
	}

	/// Advance one animation frame. `now` reads a millisecond clock; the
	/// simulation stops for this frame once [`FRAME_BUDGET_MS`] have passed.
	pub fn tick(&mut self, dt: f32, now: &dyn Fn() -> f64) {
		self.flow_time += dt as f64;
		self.advance_stabilization(now);
		self.advance_highlight(dt as f64);
	}

	fn advance_stabilization(&mut self, now: &dyn Fn() -> f64) {
		let LayoutPhase::Stabilizing { mut iteration } = self.phase else {
			return;
		};
		let Some(engine) = self.engine.as_mut() else {
			return;
		};
		let started = now();
		let cap = iterations_per_frame(self.graph.nodes.len());
		let mut settled = false;
		for _ in 0..cap {
			engine.step(STEP_DT);
			iteration += 1;
			if engine.is_stable() || iteration >= STABILIZATION_ITERATIONS {
				settled = true;
				break;
			}
			if now() - started >= FRAME_BUDGET_MS {
				break;
			}
		}

		if settled {
			debug!("graph: stabilized after {iteration} iterations");
			self.phase = LayoutPhase::Stable;
			self.fit_view();
			self.report_progress(1.0);
		} else {
			self.phase = LayoutPhase::Stabilizing { iteration };
			self.report_progress(iteration as f64 / STABILIZATION_ITERATIONS as f64);
		}
	}

	fn advance_highlight(&mut self, dt: f64) {
		let (target, delay, speed) = if self.hover.node.is_some() {
			(1.0, 0.08, 1.8)
		} else {
			(0.0, 0.0, 1.26)
		};

		if self.hover.node.is_some() {
			self.hover.delay_t = (self.hover.delay_t + dt).min(delay);
			if self.hover.delay_t >= delay {
				self.hover.highlight_t += (target - self.hover.highlight_t) * speed * dt;
			}
		} else {
			self.hover.highlight_t += (target - self.hover.highlight_t) * speed * dt;
			if self.hover.highlight_t < 0.01 {
				self.hover.highlight_t = 0.0;
				self.hover.prev_node = None;
				self.hover.prev_neighbors.clear();
			}
		}
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}
}

#[cfg(test)]
mod tests {
	use std::cell::{Cell, RefCell};
	use std::rc::Rc;

	use super::*;
	use crate::components::force_graph::types::{GraphLink, GraphNode};

	fn payload(ids: &[&str], links: &[(&str, &str)]) -> GraphPayload {
		GraphPayload {
			nodes: Some(
				ids.iter()
					.map(|id| GraphNode {
						id: id.to_string(),
						..GraphNode::default()
					})
					.collect(),
			),
			links: Some(
				links
					.iter()
					.map(|(s, t)| GraphLink {
						source: s.to_string(),
						target: t.to_string(),
						weight: 1.0,
					})
					.collect(),
			),
		}
	}

	fn frozen_clock() -> f64 {
		0.0
	}

	fn settle(state: &mut ForceGraphState) {
		for _ in 0..=STABILIZATION_ITERATIONS {
			if state.is_stable() {
				return;
			}
			state.tick(0.016, &frozen_clock);
		}
	}

	fn iteration(state: &ForceGraphState) -> u32 {
		match state.phase {
			LayoutPhase::Stabilizing { iteration } => iteration,
			_ => STABILIZATION_ITERATIONS,
		}
	}

	fn ring(n: usize) -> GraphPayload {
		let ids: Vec<String> = (0..n).map(|i| format!("p{i}")).collect();
		let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
		let links: Vec<(&str, &str)> = (0..n).map(|i| (refs[i], refs[(i + 1) % n])).collect();
		payload(&refs, &links)
	}

	#[test]
	fn load_dedups_before_simulating() {
		let mut state = ForceGraphState::new(800.0, 600.0);
		let outcome = state
			.load_graph(&payload(&["a", "a", "b"], &[("a", "b"), ("a", "b")]))
			.unwrap();
		assert_eq!(outcome, LoadOutcome::Loaded);
		assert_eq!(state.graph.nodes.len(), 2);
		assert_eq!(state.graph.edges.len(), 1);
		assert_eq!(state.positions().len(), 2);
		assert_eq!(state.phase, LayoutPhase::Stabilizing { iteration: 0 });
	}

	#[test]
	fn malformed_payload_is_a_no_op() {
		let mut state = ForceGraphState::new(800.0, 600.0);
		let outcome = state
			.load_graph(&GraphPayload {
				nodes: Some(vec![]),
				links: None,
			})
			.unwrap();
		assert_eq!(outcome, LoadOutcome::Skipped);
		assert_eq!(state.phase, LayoutPhase::Empty);
		assert!(state.positions().is_empty());
	}

	#[test]
	fn failed_load_keeps_previous_layout() {
		let mut state = ForceGraphState::new(800.0, 600.0);
		state.load_graph(&payload(&["a", "b"], &[("a", "b")])).unwrap();
		settle(&mut state);
		assert!(state.is_stable());

		let mut bad = payload(&["x", "y"], &[("x", "y")]);
		bad.links.as_mut().unwrap()[0].weight = f64::INFINITY;
		assert!(state.load_graph(&bad).is_err());
		assert!(state.is_stable());
		assert!(state.select_node("a").is_some());
		assert!(state.select_node("x").is_none());
		assert_eq!(state.positions().len(), 2);
	}

	#[test]
	fn stabilization_reports_progress_and_freezes() {
		let seen = Rc::new(RefCell::new(Vec::new()));
		let mut state = ForceGraphState::new(800.0, 600.0);
		let sink = seen.clone();
		state.set_progress_callback(move |p| sink.borrow_mut().push(p));
		state
			.load_graph(&payload(&["a", "b", "c"], &[("a", "b"), ("b", "c")]))
			.unwrap();
		settle(&mut state);

		assert!(state.is_stable());
		let seen = seen.borrow();
		assert_eq!(seen.first(), Some(&0.0));
		assert_eq!(seen.last(), Some(&1.0));
		assert!(seen.windows(2).all(|w| w[0] <= w[1]));

		let frozen = state.positions().to_vec();
		state.tick(0.016, &frozen_clock);
		assert_eq!(state.positions(), frozen.as_slice());
	}

	#[test]
	fn large_graphs_run_fewer_iterations_per_frame() {
		assert_eq!(iterations_per_frame(0), MAX_ITERATIONS_PER_FRAME);
		assert_eq!(iterations_per_frame(10), MAX_ITERATIONS_PER_FRAME);
		assert_eq!(iterations_per_frame(200), 20);
		assert_eq!(iterations_per_frame(1000), 4);
		assert_eq!(iterations_per_frame(50_000), 1);

		let mut state = ForceGraphState::new(800.0, 600.0);
		state.load_graph(&ring(400)).unwrap();
		state.tick(0.016, &frozen_clock);
		assert!(iteration(&state) <= iterations_per_frame(400));
	}

	#[test]
	fn frame_stops_when_time_budget_is_spent() {
		let mut state = ForceGraphState::new(800.0, 600.0);
		state.load_graph(&ring(30)).unwrap();

		// every clock read advances by 4 ms: start, then one read per step
		let clock = Cell::new(0.0);
		let slow = || {
			let t = clock.get();
			clock.set(t + 4.0);
			t
		};
		state.tick(0.016, &slow);
		assert_eq!(iteration(&state), 3);
		assert!(!state.is_stable());

		// the next frame picks up where the last one stopped
		state.tick(0.016, &slow);
		assert_eq!(iteration(&state), 6);
	}

	#[test]
	fn preset_change_restabilizes_same_data() {
		let mut state = ForceGraphState::new(800.0, 600.0);
		state.load_graph(&payload(&["a", "b"], &[("a", "b")])).unwrap();
		settle(&mut state);
		state.apply_preset(LayoutPreset::Spread);
		assert_eq!(state.phase, LayoutPhase::Stabilizing { iteration: 0 });
		assert_eq!(state.preset, LayoutPreset::Spread);
		assert_eq!(state.graph.nodes.len(), 2);
	}

	#[test]
	fn stop_freezes_immediately() {
		let mut state = ForceGraphState::new(800.0, 600.0);
		state.load_graph(&payload(&["a", "b"], &[("a", "b")])).unwrap();
		state.stop_physics();
		assert!(state.is_stable());
	}

	#[test]
	fn edge_toggle_does_not_move_nodes() {
		let mut state = ForceGraphState::new(800.0, 600.0);
		state.load_graph(&payload(&["a", "b"], &[("a", "b")])).unwrap();
		state.stop_physics();
		let before = state.positions().to_vec();
		assert!(!state.toggle_edge_visibility());
		assert!(state.toggle_edge_visibility());
		assert_eq!(state.positions(), before.as_slice());
	}

	#[test]
	fn hit_testing_uses_view_transform() {
		let mut state = ForceGraphState::new(800.0, 600.0);
		state.load_graph(&payload(&["a"], &[])).unwrap();
		settle(&mut state);
		let (x, y) = state.positions()[0];
		let t = state.transform.clone();
		assert_eq!(state.node_at_position(x * t.k + t.x, y * t.k + t.y), Some(0));
		assert_eq!(state.node_at_position(t.x + 10_000.0, t.y), None);
	}
}
