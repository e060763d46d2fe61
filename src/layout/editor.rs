use log::{info, warn};

use super::{LayoutOverrides, LayoutStore, Position};
use crate::error::LayoutStoreError;

/// Maps view-box coordinates onto the canvas: `screen = view * k + (x, y)`.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self {
			x: 0.0,
			y: 0.0,
			k: 1.0,
		}
	}
}

impl ViewTransform {
	/// Largest uniform scale showing the whole view box, centred.
	pub fn fit(view_width: f64, view_height: f64, screen_width: f64, screen_height: f64) -> Self {
		if view_width <= 0.0 || view_height <= 0.0 {
			return Self::default();
		}
		let k = (screen_width / view_width).min(screen_height / view_height);
		Self {
			x: (screen_width - view_width * k) / 2.0,
			y: (screen_height - view_height * k) / 2.0,
			k,
		}
	}

	pub fn screen_to_view(&self, sx: f64, sy: f64) -> Position {
		Position::new((sx - self.x) / self.k, (sy - self.y) / self.k)
	}
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DragState {
	pub node_id: Option<String>,
	pub start: Position,
	pub node_start: Position,
}

/// Edit-mode session over the route map's overrides.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MapEditor {
	overrides: LayoutOverrides,
	editing: bool,
	drag: DragState,
	dirty: bool,
}

impl MapEditor {
	/// Start from whatever was saved. Unreadable storage starts empty.
	pub fn load(store: &impl LayoutStore) -> Self {
		let overrides = store.load().unwrap_or_else(|err| {
			warn!("Ignoring saved map layout: {err}");
			LayoutOverrides::default()
		});
		Self {
			overrides,
			..Self::default()
		}
	}

	pub fn overrides(&self) -> &LayoutOverrides {
		&self.overrides
	}

	pub fn is_editing(&self) -> bool {
		self.editing
	}

	pub fn has_unsaved_changes(&self) -> bool {
		self.dirty
	}

	pub fn set_editing(&mut self, editing: bool) {
		self.editing = editing;
		if !editing {
			self.end_drag();
		}
	}

	pub fn dragging(&self) -> Option<&str> {
		self.drag.node_id.as_deref()
	}

	/// Grab a box. Refused outside edit mode.
	pub fn begin_drag(&mut self, id: &str, pointer: Position, node_position: Position) -> bool {
		if !self.editing {
			return false;
		}
		self.drag = DragState {
			node_id: Some(id.to_string()),
			start: pointer,
			node_start: node_position,
		};
		true
	}

	/// Move the grabbed box with the pointer.
	pub fn drag_to(&mut self, pointer: Position) -> bool {
		let Some(id) = &self.drag.node_id else {
			return false;
		};
		let position = Position::new(
			self.drag.node_start.x + pointer.x - self.drag.start.x,
			self.drag.node_start.y + pointer.y - self.drag.start.y,
		);
		self.overrides.set_position(id, position);
		self.dirty = true;
		true
	}

	/// Let go; the last position stays as an override.
	pub fn end_drag(&mut self) {
		self.drag = DragState::default();
	}

	pub fn rename(&mut self, id: &str, label: &str) -> bool {
		if !self.editing {
			return false;
		}
		self.overrides.set_label(id, label);
		self.dirty = true;
		true
	}

	pub fn save(&mut self, store: &impl LayoutStore) -> Result<(), LayoutStoreError> {
		store.save(&self.overrides)?;
		self.dirty = false;
		info!("Map layout saved");
		Ok(())
	}

	/// Drop every override, in memory and in storage.
	pub fn reset(&mut self, store: &impl LayoutStore) -> Result<(), LayoutStoreError> {
		self.overrides.clear();
		self.end_drag();
		self.dirty = false;
		info!("Map layout reset");
		store.clear()
	}
}
