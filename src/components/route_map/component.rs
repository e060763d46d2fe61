use leptos::prelude::*;
use log::error;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent};

use super::render::{self, Scene};
use crate::components::notify;
use crate::config::LayoutConfig;
use crate::layout::{GraphLayout, LocalLayoutStore, MapEditor, Position, ViewTransform};

#[component]
pub fn RouteMap(
	#[prop(into)] layout: Signal<GraphLayout>,
	#[prop(into)] active_nodes: Signal<Vec<String>>,
	editor: RwSignal<MapEditor>,
	store: LocalLayoutStore,
	config: LayoutConfig,
	#[prop(default = 350.0)] height: f64,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let (view_width, box_width, box_height) = (config.canvas_width, config.box_width, config.box_height);

	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let width = canvas
			.parent_element()
			.map(|p| p.client_width() as f64)
			.filter(|w| *w > 0.0)
			.unwrap_or(view_width);
		canvas.set_width(width as u32);
		canvas.set_height(height as u32);

		let Ok(Some(ctx)) = canvas.get_context("2d") else {
			error!("Route map canvas has no 2d context");
			return;
		};
		let Ok(ctx) = ctx.dyn_into::<CanvasRenderingContext2d>() else {
			return;
		};

		let active = active_nodes.get();
		editor.with(|editor| {
			layout.with(|layout| {
				let transform = ViewTransform::fit(view_width, layout.canvas_height, width, height);
				let scene = Scene {
					layout,
					config: &config,
					active_nodes: &active,
					transform: &transform,
					editing: editor.is_editing(),
					dragging: editor.dragging(),
					width,
					height,
				};
				render::render(&scene, &ctx);
			})
		});
	});

	// Pointer position in view-box units.
	let view_point = move |ev: &MouseEvent| -> Option<Position> {
		let canvas: HtmlCanvasElement = canvas_ref.get()?.into();
		let rect = canvas.get_bounding_client_rect();
		let transform = layout.with_untracked(|l| {
			ViewTransform::fit(
				view_width,
				l.canvas_height,
				canvas.width() as f64,
				canvas.height() as f64,
			)
		});
		Some(transform.screen_to_view(
			ev.client_x() as f64 - rect.left(),
			ev.client_y() as f64 - rect.top(),
		))
	};
	let hit = move |point: Position| {
		layout.with_untracked(|l| {
			l.node_at(point, box_width, box_height)
				.map(|n| (n.id.clone(), n.label.clone(), n.position))
		})
	};

	let on_mousedown = move |ev: MouseEvent| {
		if !editor.with_untracked(MapEditor::is_editing) {
			return;
		}
		let Some(point) = view_point(&ev) else {
			return;
		};
		if let Some((id, _, position)) = hit(point) {
			editor.update(|e| {
				e.begin_drag(&id, point, position);
			});
		}
	};

	let on_mousemove = move |ev: MouseEvent| {
		if editor.with_untracked(|e| e.dragging().is_none()) {
			return;
		}
		if let Some(point) = view_point(&ev) {
			editor.update(|e| {
				e.drag_to(point);
			});
		}
	};

	let on_release = move |_: MouseEvent| {
		if editor.with_untracked(|e| e.dragging().is_some()) {
			editor.update(MapEditor::end_drag);
		}
	};

	let on_dblclick = move |ev: MouseEvent| {
		if !editor.with_untracked(MapEditor::is_editing) {
			return;
		}
		let Some((id, label, _)) = view_point(&ev).and_then(hit) else {
			return;
		};
		let answer = web_sys::window()
			.and_then(|w| w.prompt_with_message_and_default("Box label", &label).ok())
			.flatten();
		if let Some(answer) = answer {
			editor.update(|e| {
				e.rename(&id, &answer);
			});
		}
	};

	let save_store = store.clone();
	let on_save = move |_: MouseEvent| {
		if let Some(Err(err)) = editor.try_update(|e| e.save(&save_store)) {
			error!("Saving map layout failed: {err}");
			notify(&format!("Could not save the map layout: {err}"));
		}
	};
	let on_reset = move |_: MouseEvent| {
		if let Some(Err(err)) = editor.try_update(|e| e.reset(&store)) {
			error!("Clearing saved map layout failed: {err}");
		}
	};

	view! {
		<div class="map-toolbar">
			<button
				class="btn-icon glass"
				on:click=move |_| editor.update(|e| e.set_editing(!e.is_editing()))
			>
				{move || if editor.with(MapEditor::is_editing) { "Done editing" } else { "Edit layout" }}
			</button>
			<button
				class="btn-icon glass"
				on:click=on_save
				disabled=move || !editor.with(MapEditor::has_unsaved_changes)
			>
				"Save layout"
			</button>
			<button class="btn-icon glass" on:click=on_reset>
				"Reset layout"
			</button>
		</div>
		<div class="map-container glass" style=format!("height: {height}px; position: relative;")>
			<canvas
				node_ref=canvas_ref
				class="route-map-canvas"
				on:mousedown=on_mousedown
				on:mousemove=on_mousemove
				on:mouseup=on_release
				on:mouseleave=on_release
				on:dblclick=on_dblclick
				style=move || {
					if editor.with(MapEditor::is_editing) {
						"display: block; cursor: move;"
					} else {
						"display: block; cursor: default;"
					}
				}
			/>
		</div>
	}
}
