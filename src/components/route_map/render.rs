use std::collections::HashSet;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use crate::config::LayoutConfig;
use crate::layout::{EdgeGeometry, GraphLayout, ViewTransform, edge_geometry};

const ACTIVE: &str = "#7CFC00";
const IDLE: &str = "rgba(255, 255, 255, 0.3)";
const BOX_FILL: &str = "rgba(255, 255, 255, 0.1)";
const ARROW_SIZE: f64 = 10.0;

/// Everything one frame needs.
pub struct Scene<'a> {
	pub layout: &'a GraphLayout,
	pub config: &'a LayoutConfig,
	pub active_nodes: &'a [String],
	pub transform: &'a ViewTransform,
	pub editing: bool,
	pub dragging: Option<&'a str>,
	pub width: f64,
	pub height: f64,
}

pub fn render(scene: &Scene, ctx: &CanvasRenderingContext2d) {
	ctx.clear_rect(0.0, 0.0, scene.width, scene.height);
	ctx.save();
	let _ = ctx.translate(scene.transform.x, scene.transform.y);
	let _ = ctx.scale(scene.transform.k, scene.transform.k);
	draw_edges(scene, ctx);
	draw_boxes(scene, ctx);
	ctx.restore();
}

fn draw_edges(scene: &Scene, ctx: &CanvasRenderingContext2d) {
	for edge in edge_geometry(scene.layout, scene.config) {
		let active = scene.active_nodes.contains(&edge.node);
		let color = if active { ACTIVE } else { IDLE };

		ctx.set_stroke_style_str(color);
		ctx.set_line_width(if active { 4.0 } else { 2.5 });
		if active {
			ctx.set_shadow_color("rgba(124, 252, 0, 0.6)");
			ctx.set_shadow_blur(15.0);
		}
		ctx.begin_path();
		ctx.move_to(edge.start.x, edge.start.y);
		ctx.line_to(edge.end.x, edge.end.y);
		ctx.stroke();
		draw_arrowhead(&edge, color, ctx);
		ctx.set_shadow_blur(0.0);

		ctx.set_fill_style_str("#ffffff");
		ctx.set_font("900 16px sans-serif");
		ctx.set_text_align("center");
		ctx.set_text_baseline("middle");
		let _ = ctx.fill_text(&edge.node, edge.label.x, edge.label.y);
	}
}

fn draw_arrowhead(edge: &EdgeGeometry, color: &str, ctx: &CanvasRenderingContext2d) {
	let (dx, dy) = (edge.end.x - edge.start.x, edge.end.y - edge.start.y);
	let dist = (dx * dx + dy * dy).sqrt();
	if dist < 0.001 {
		return;
	}
	let (ux, uy) = (dx / dist, dy / dist);
	let (back_x, back_y) = (edge.end.x - ux * ARROW_SIZE, edge.end.y - uy * ARROW_SIZE);
	let (px, py) = (-uy * ARROW_SIZE * 0.35, ux * ARROW_SIZE * 0.35);

	ctx.set_fill_style_str(color);
	ctx.begin_path();
	ctx.move_to(edge.end.x, edge.end.y);
	ctx.line_to(back_x + px, back_y + py);
	ctx.line_to(back_x - px, back_y - py);
	ctx.close_path();
	ctx.fill();
}

fn draw_boxes(scene: &Scene, ctx: &CanvasRenderingContext2d) {
	let active: HashSet<&str> = scene.layout.active_locations(scene.active_nodes);
	let (w, h) = (scene.config.box_width, scene.config.box_height);

	for node in &scene.layout.nodes {
		let is_active = active.contains(node.id.as_str());
		let (x, y) = (node.position.x - w / 2.0, node.position.y - h / 2.0);

		ctx.set_fill_style_str(BOX_FILL);
		ctx.fill_rect(x, y, w, h);

		if is_active {
			ctx.set_shadow_color("rgba(124, 252, 0, 0.8)");
			ctx.set_shadow_blur(12.0);
		}
		ctx.set_stroke_style_str(if is_active { ACTIVE } else { IDLE });
		ctx.set_line_width(if is_active { 3.5 } else { 2.0 });
		if scene.editing {
			let dash = if scene.dragging == Some(node.id.as_str()) { 2.0 } else { 6.0 };
			let _ = ctx.set_line_dash(&js_sys::Array::of2(
				&JsValue::from_f64(dash),
				&JsValue::from_f64(4.0),
			));
		}
		ctx.stroke_rect(x, y, w, h);
		let _ = ctx.set_line_dash(&js_sys::Array::new());
		ctx.set_shadow_blur(0.0);

		ctx.set_fill_style_str("#ffffff");
		ctx.set_font("900 16px sans-serif");
		ctx.set_text_align("center");
		ctx.set_text_baseline("middle");
		let _ = ctx.fill_text(&node.label, node.position.x, node.position.y);
	}
}
