use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::state::ForceGraphState;

const BACKGROUND: &str = "#1a1a2e";
const EDGE_RGB: &str = "132, 160, 210";
const LABEL_ZOOM_MIN: f64 = 0.6;

fn ease_out_cubic(t: f64) -> f64 {
	1.0 - (1.0 - t).powi(3)
}

pub fn render(state: &ForceGraphState, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str(BACKGROUND);
	ctx.fill_rect(0.0, 0.0, state.width, state.height);
	ctx.save();
	let _ = ctx.translate(state.transform.x, state.transform.y);
	let _ = ctx.scale(state.transform.k, state.transform.k);
	if state.edges_visible {
		draw_edges(state, ctx);
	}
	draw_nodes(state, ctx);
	ctx.restore();
}

fn draw_edges(state: &ForceGraphState, ctx: &CanvasRenderingContext2d) {
	let k = state.transform.k;
	let (dash, gap, arrow_size) = (8.0 / k, 4.0 / k, 6.0 / k);
	let dash_offset = -(state.flow_time * 30.0) % (dash + gap);
	let t = ease_out_cubic(state.hover.highlight_t);
	let positions = state.positions();
	let has_highlight = state.has_active_highlight();

	for edge in &state.graph.edges {
		let (Some(&(x1, y1)), Some(&(x2, y2))) =
			(positions.get(edge.source), positions.get(edge.target))
		else {
			continue;
		};
		let (dx, dy) = (x2 - x1, y2 - y1);
		let dist = (dx * dx + dy * dy).sqrt();
		if dist < 0.001 {
			continue;
		}
		let (r1, r2) = (
			state.graph.nodes[edge.source].size / 2.0,
			state.graph.nodes[edge.target].size / 2.0,
		);

		let is_highlighted =
			has_highlight && state.is_highlighted(edge.source) && state.is_highlighted(edge.target);
		let base_width = edge.width / k;

		// t=0: every edge at its own opacity; t=1: highlighted edges brighten, others dim
		let (alpha, width) = if is_highlighted {
			(
				edge.opacity + (0.9 - edge.opacity) * t,
				base_width * (1.0 + 0.3 * t),
			)
		} else {
			(edge.opacity * (1.0 - 0.6 * t), base_width * (1.0 - 0.3 * t))
		};

		ctx.set_stroke_style_str(&format!("rgba({EDGE_RGB}, {alpha})"));
		ctx.set_line_width(width);
		let _ = ctx.set_line_dash(&js_sys::Array::of2(
			&JsValue::from_f64(dash),
			&JsValue::from_f64(gap),
		));
		ctx.set_line_dash_offset(dash_offset);

		let (ux, uy) = (dx / dist, dy / dist);
		ctx.begin_path();
		ctx.move_to(x1 + ux * r1, y1 + uy * r1);
		ctx.line_to(x2 - ux * (r2 + arrow_size), y2 - uy * (r2 + arrow_size));
		ctx.stroke();

		let _ = ctx.set_line_dash(&js_sys::Array::new());
		ctx.set_fill_style_str(&format!("rgba({EDGE_RGB}, {})", (alpha + 0.2).min(1.0)));
		let (tip_x, tip_y) = (x2 - ux * r2, y2 - uy * r2);
		let (back_x, back_y) = (tip_x - ux * arrow_size, tip_y - uy * arrow_size);
		let (px, py) = (-uy * arrow_size * 0.5, ux * arrow_size * 0.5);
		ctx.begin_path();
		ctx.move_to(tip_x, tip_y);
		ctx.line_to(back_x + px, back_y + py);
		ctx.line_to(back_x - px, back_y - py);
		ctx.close_path();
		ctx.fill();
	}
	let _ = ctx.set_line_dash(&js_sys::Array::new());
}

fn draw_label(ctx: &CanvasRenderingContext2d, text: &str, x: f64, y: f64, k: f64, alpha: f64) {
	ctx.set_fill_style_str(&format!("rgba(255, 255, 255, {alpha})"));
	ctx.set_font(&format!("{}px sans-serif", 9.0 / k.max(0.5)));
	let _ = ctx.fill_text(text, x, y);
}

fn draw_nodes(state: &ForceGraphState, ctx: &CanvasRenderingContext2d) {
	let (has_highlight, t, k) = (
		state.has_active_highlight(),
		ease_out_cubic(state.hover.highlight_t),
		state.transform.k,
	);
	let positions = state.positions();
	let show_labels = k >= LABEL_ZOOM_MIN;

	for (idx, styled) in state.graph.nodes.iter().enumerate() {
		if has_highlight && state.is_highlighted(idx) {
			continue;
		}
		let Some(&(x, y)) = positions.get(idx) else {
			continue;
		};
		let base = styled.size / 2.0;
		let (alpha, radius) = (1.0 - 0.7 * t, base * (1.0 - 0.15 * t));

		ctx.set_global_alpha(alpha);
		ctx.begin_path();
		let _ = ctx.arc(x, y, radius, 0.0, 2.0 * PI);
		ctx.set_fill_style_str(styled.color);
		ctx.fill();
		ctx.set_stroke_style_str("#2B7CE9");
		ctx.set_line_width(1.0 / k);
		ctx.stroke();
		ctx.set_global_alpha(1.0);

		if let (true, Some(label)) = (show_labels, &styled.node.label) {
			draw_label(ctx, label, x + radius + 3.0, y + 3.0, k, alpha * 0.8);
		}
	}

	if !has_highlight {
		return;
	}

	for (idx, styled) in state.graph.nodes.iter().enumerate() {
		if !state.is_highlighted(idx) {
			continue;
		}
		let Some(&(x, y)) = positions.get(idx) else {
			continue;
		};
		let base = styled.size / 2.0;
		let is_hovered = state.is_hovered(idx);
		let is_neighbor =
			state.hover.neighbors.contains(&idx) || state.hover.prev_neighbors.contains(&idx);

		let (radius, glow_radius) = if is_hovered {
			(base * (1.0 + 0.35 * t), base * (1.8 + 1.2 * t))
		} else if is_neighbor {
			(base * (1.0 + 0.2 * t), base * (1.4 + 0.6 * t))
		} else {
			(base, 0.0)
		};

		if glow_radius > 0.0 && t > 0.01 {
			let Ok(gradient) =
				ctx.create_radial_gradient(x, y, radius * 0.3, x, y, glow_radius)
			else {
				continue;
			};
			let alpha = if is_hovered { 0.35 * t } else { 0.2 * t };
			let _ = gradient.add_color_stop(0.0, &format!("rgba(255, 255, 255, {alpha})"));
			let _ = gradient.add_color_stop(0.6, &format!("rgba(200, 220, 255, {})", alpha * 0.3));
			let _ = gradient.add_color_stop(1.0, "rgba(255, 255, 255, 0)");
			ctx.begin_path();
			let _ = ctx.arc(x, y, glow_radius, 0.0, 2.0 * PI);
			#[allow(deprecated)]
			ctx.set_fill_style(&gradient);
			ctx.fill();
		}

		ctx.begin_path();
		let _ = ctx.arc(x, y, radius, 0.0, 2.0 * PI);
		ctx.set_fill_style_str(styled.color);
		ctx.fill();

		if is_hovered && t > 0.01 {
			ctx.begin_path();
			let _ = ctx.arc(x, y, radius + 2.0 / k, 0.0, 2.0 * PI);
			ctx.set_stroke_style_str(&format!("rgba(255, 255, 255, {})", 0.7 * t));
			ctx.set_line_width(1.5 / k);
			ctx.stroke();
		}

		let text = styled
			.node
			.label
			.as_deref()
			.or(styled.node.title.as_deref());
		if let Some(text) = text {
			draw_label(ctx, text, x + radius + 3.0, y + 3.0, k, 1.0);
		}
	}
}
