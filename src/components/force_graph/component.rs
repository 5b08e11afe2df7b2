use std::cell::{Cell, RefCell};
use std::rc::Rc;

use leptos::prelude::*;
use log::warn;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, WheelEvent, Window};

use super::presets::LayoutPreset;
use super::render;
use super::state::ForceGraphState;
use super::types::{GraphNode, GraphPayload};

type SharedState = Rc<RefCell<Option<ForceGraphState>>>;
type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut()>>>>;

/// Node picked by a click, for the side panel.
#[derive(Clone, Debug, PartialEq)]
struct SelectedNode {
	node: GraphNode,
	connections: usize,
}

/// Owns the animation loop and window listener; dropping it stops both.
struct CanvasLoop {
	alive: Rc<Cell<bool>>,
	frame_id: Rc<Cell<i32>>,
	animate: FrameCallback,
	resize_cb: Option<Closure<dyn FnMut()>>,
}

impl Drop for CanvasLoop {
	fn drop(&mut self) {
		self.alive.set(false);
		let Some(window) = web_sys::window() else {
			return;
		};
		let _ = window.cancel_animation_frame(self.frame_id.get());
		if let Some(cb) = self.resize_cb.take() {
			let _ =
				window.remove_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
		}
		self.animate.borrow_mut().take();
	}
}

fn canvas_point(canvas: &HtmlCanvasElement, ev: &MouseEvent) -> (f64, f64) {
	let rect = canvas.get_bounding_client_rect();
	(
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	)
}

fn parent_width(canvas: &HtmlCanvasElement) -> f64 {
	canvas
		.parent_element()
		.map(|p| p.client_width() as f64)
		.filter(|w| *w > 0.0)
		.unwrap_or(800.0)
}

fn start_loop(
	window: &Window,
	canvas: HtmlCanvasElement,
	ctx: CanvasRenderingContext2d,
	state: SharedState,
	height: f64,
) -> CanvasLoop {
	let alive = Rc::new(Cell::new(true));
	let frame_id = Rc::new(Cell::new(0));
	let animate: FrameCallback = Rc::new(RefCell::new(None));

	let (state_anim, animate_inner, alive_anim, frame_anim) =
		(state.clone(), animate.clone(), alive.clone(), frame_id.clone());
	*animate.borrow_mut() = Some(Closure::new(move || {
		if !alive_anim.get() {
			return;
		}
		if let Some(ref mut s) = *state_anim.borrow_mut() {
			s.tick(0.016, &js_sys::Date::now);
			render::render(s, &ctx);
		}
		let Some(window) = web_sys::window() else {
			return;
		};
		if let Some(ref cb) = *animate_inner.borrow() {
			if let Ok(id) = window.request_animation_frame(cb.as_ref().unchecked_ref()) {
				frame_anim.set(id);
			}
		}
	}));
	if let Some(ref cb) = *animate.borrow() {
		if let Ok(id) = window.request_animation_frame(cb.as_ref().unchecked_ref()) {
			frame_id.set(id);
		}
	}

	let resize_cb: Closure<dyn FnMut()> = Closure::new(move || {
		let width = parent_width(&canvas);
		canvas.set_width(width as u32);
		if let Some(ref mut s) = *state.borrow_mut() {
			s.resize(width, height);
		}
	});
	let _ = window.add_event_listener_with_callback("resize", resize_cb.as_ref().unchecked_ref());

	CanvasLoop {
		alive,
		frame_id,
		animate,
		resize_cb: Some(resize_cb),
	}
}

/// Interactive force-directed view of a link graph, with physics controls.
#[component]
pub fn NetworkGraph(
	#[prop(into)] data: Signal<GraphPayload>,
	#[prop(default = 700.0)] height: f64,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let state: SharedState = Rc::new(RefCell::new(None));
	let canvas_loop = StoredValue::new_local(None::<CanvasLoop>);

	let progress = RwSignal::new(1.0_f64);
	let stable = RwSignal::new(true);
	let edges_visible = RwSignal::new(true);
	let active_preset = RwSignal::new(LayoutPreset::Default);
	let selected = RwSignal::new(None::<SelectedNode>);

	let state_init = state.clone();
	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let payload = data.get();
		let canvas: HtmlCanvasElement = canvas.into();

		if state_init.borrow().is_none() {
			let Some(window) = web_sys::window() else {
				return;
			};
			let width = parent_width(&canvas);
			canvas.set_width(width as u32);
			canvas.set_height(height as u32);

			let ctx = match canvas.get_context("2d") {
				Ok(Some(ctx)) => ctx.dyn_into::<CanvasRenderingContext2d>(),
				_ => {
					warn!("graph: canvas has no 2d context");
					return;
				}
			};
			let Ok(ctx) = ctx else {
				return;
			};

			let mut fresh = ForceGraphState::new(width, height);
			fresh.set_progress_callback(move |p| {
				progress.set(p);
				stable.set(p >= 1.0);
			});
			*state_init.borrow_mut() = Some(fresh);
			canvas_loop.set_value(Some(start_loop(
				&window,
				canvas,
				ctx,
				state_init.clone(),
				height,
			)));
		}

		if let Some(ref mut s) = *state_init.borrow_mut() {
			if s.load_graph(&payload).is_ok() {
				selected.set(None);
				edges_visible.set(s.edges_visible);
				active_preset.set(s.preset);
			}
		}
	});

	let state_md = state.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let (x, y) = canvas_point(&canvas, &ev);

		if let Some(ref mut s) = *state_md.borrow_mut() {
			if let Some(idx) = s.node_at_position(x, y) {
				let (nx, ny) = s.positions()[idx];
				s.drag = Default::default();
				s.drag.active = true;
				s.drag.node_idx = Some(idx);
				s.drag.start_x = x;
				s.drag.start_y = y;
				s.drag.node_start_x = nx;
				s.drag.node_start_y = ny;
			} else {
				s.pan.active = true;
				s.pan.start_x = x;
				s.pan.start_y = y;
				s.pan.transform_start_x = s.transform.x;
				s.pan.transform_start_y = s.transform.y;
			}
		}
	};

	let state_mm = state.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let (x, y) = canvas_point(&canvas, &ev);

		if let Some(ref mut s) = *state_mm.borrow_mut() {
			// Update hover state when not dragging
			if !s.drag.active {
				let hovered = s.node_at_position(x, y);
				s.set_hover(hovered);
			}

			if s.drag.active {
				if let Some(idx) = s.drag.node_idx {
					let (dx, dy) = (
						(x - s.drag.start_x) / s.transform.k,
						(y - s.drag.start_y) / s.transform.k,
					);
					if dx.abs() + dy.abs() > 1.0 {
						s.drag.moved = true;
					}
					let (nx, ny) = (s.drag.node_start_x + dx, s.drag.node_start_y + dy);
					s.move_node(idx, nx, ny);
				}
			} else if s.pan.active {
				s.transform.x = s.pan.transform_start_x + (x - s.pan.start_x);
				s.transform.y = s.pan.transform_start_y + (y - s.pan.start_y);
			}
		}
	};

	let state_mu = state.clone();
	let on_mouseup = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_mu.borrow_mut() {
			if let (true, false, Some(idx)) = (s.drag.active, s.drag.moved, s.drag.node_idx) {
				let styled = &s.graph.nodes[idx];
				let connections = styled.connections;
				if let Some(node) = s.select_node(&styled.node.id) {
					selected.set(Some(SelectedNode {
						node: node.clone(),
						connections,
					}));
				}
			}
			s.drag = Default::default();
			s.pan.active = false;
		}
	};

	let state_ml = state.clone();
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_ml.borrow_mut() {
			s.drag = Default::default();
			s.pan.active = false;
			s.set_hover(None);
		}
	};

	let state_wh = state.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let (x, y) = canvas_point(&canvas, &ev);

		if let Some(ref mut s) = *state_wh.borrow_mut() {
			let factor = if ev.delta_y() > 0.0 { 0.9 } else { 1.1 };
			let new_k = (s.transform.k * factor).clamp(0.1, 10.0);
			let ratio = new_k / s.transform.k;
			s.transform.x = x - (x - s.transform.x) * ratio;
			s.transform.y = y - (y - s.transform.y) * ratio;
			s.transform.k = new_k;
		}
	};

	let state_fit = state.clone();
	let on_fit = move |_| {
		if let Some(ref mut s) = *state_fit.borrow_mut() {
			s.fit_view();
		}
	};
	let state_stab = state.clone();
	let on_stabilize = move |_| {
		if let Some(ref mut s) = *state_stab.borrow_mut() {
			s.stabilize();
		}
	};
	let state_stop = state.clone();
	let on_stop = move |_| {
		if let Some(ref mut s) = *state_stop.borrow_mut() {
			s.stop_physics();
		}
	};
	let state_edges = state.clone();
	let on_toggle_edges = move |_| {
		if let Some(ref mut s) = *state_edges.borrow_mut() {
			edges_visible.set(s.toggle_edge_visibility());
		}
	};

	let preset_buttons = LayoutPreset::ALL
		.into_iter()
		.map(|preset| {
			let state_preset = state.clone();
			view! {
				<button
					class="graph-button preset"
					class:active=move || active_preset.get() == preset
					on:click=move |_| {
						if let Some(ref mut s) = *state_preset.borrow_mut() {
							s.apply_preset(preset);
							active_preset.set(preset);
						}
					}
				>
					{preset.label()}
				</button>
			}
		})
		.collect_view();

	view! {
		<div class="network-graph">
			<div class="graph-controls">
				<button class="graph-button" on:click=on_fit>"Fit"</button>
				<button class="graph-button" on:click=on_stabilize disabled=move || !stable.get()>
					"Stabilize"
				</button>
				<button class="graph-button stop" on:click=on_stop>"Stop"</button>
				{preset_buttons}
				<button class="graph-button" on:click=on_toggle_edges>
					{move || if edges_visible.get() { "Hide edges" } else { "Show edges" }}
				</button>
			</div>
			<canvas
				node_ref=canvas_ref
				class="force-graph-canvas"
				on:mousedown=on_mousedown
				on:mousemove=on_mousemove
				on:mouseup=on_mouseup
				on:mouseleave=on_mouseleave
				on:wheel=on_wheel
				style="display: block; cursor: grab;"
			/>
			<Show when=move || !stable.get()>
				<div class="graph-progress">
					<div class="progress-track">
						<div
							class="progress-fill"
							style:width=move || format!("{:.0}%", progress.get() * 100.0)
						/>
					</div>
					<div class="progress-label">
						{move || format!("Stabilizing: {:.0}%", progress.get() * 100.0)}
					</div>
				</div>
			</Show>
			{move || {
				selected
					.get()
					.map(|s| {
						let url = s.node.url.clone().unwrap_or_default();
						let href = url.clone();
						let meta = s.node.metadata.clone().unwrap_or_default();
						let heading = s
							.node
							.title
							.clone()
							.or(s.node.label.clone())
							.unwrap_or(s.node.id.clone());
						let rank = s
							.node
							.rank
							.map(|r| format!("{r:.3}"))
							.unwrap_or_else(|| "-".into());
						view! {
							<aside class="node-panel">
								<button class="close" on:click=move |_| selected.set(None)>
									"×"
								</button>
								<h3>{heading}</h3>
								<a href=href target="_blank" rel="noopener noreferrer">
									{url}
								</a>
								<dl>
									<dt>"Connections"</dt>
									<dd>{s.connections}</dd>
									<dt>"Content length"</dt>
									<dd>{meta.content_length}</dd>
									<dt>"Outbound links"</dt>
									<dd>{meta.links}</dd>
									<dt>"Rank"</dt>
									<dd>{rank}</dd>
								</dl>
							</aside>
						}
					})
			}}
		</div>
	}
}
