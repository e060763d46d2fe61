//! Route map topology, placement and user overrides.
//!
//! Locations are the vertices; every node with a connection contributes one
//! edge labelled with the node name.

mod editor;
mod engine;
pub(crate) mod overrides;

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub use editor::{DragState, MapEditor, ViewTransform};
pub use engine::{EdgeGeometry, LayoutEngine, edge_geometry};
pub use overrides::{LayoutOverrides, LayoutStore, LocalLayoutStore};

/// A point in view-box units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
	pub x: f64,
	pub y: f64,
}

impl Position {
	pub fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}
}

/// Which side of the map a location was partitioned into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Column {
	Left,
	Right,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GraphNode {
	/// Location name.
	pub id: String,
	pub label: String,
	pub position: Position,
	pub column: Column,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GraphEdge {
	/// Catalog node providing this connection.
	pub node: String,
	pub from: String,
	pub to: String,
}

/// Output of [`LayoutEngine::layout`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphLayout {
	pub nodes: Vec<GraphNode>,
	pub edges: Vec<GraphEdge>,
	pub canvas_height: f64,
}

impl GraphLayout {
	pub fn node(&self, id: &str) -> Option<&GraphNode> {
		self.nodes.iter().find(|n| n.id == id)
	}

	/// Locations touched by an edge of any in-use node.
	pub fn active_locations<'a>(&'a self, active_nodes: &[String]) -> HashSet<&'a str> {
		self.edges
			.iter()
			.filter(|e| active_nodes.contains(&e.node))
			.flat_map(|e| [e.from.as_str(), e.to.as_str()])
			.collect()
	}

	/// Topmost box under `point`, if any.
	pub fn node_at(&self, point: Position, box_width: f64, box_height: f64) -> Option<&GraphNode> {
		self.nodes.iter().rev().find(|n| {
			(point.x - n.position.x).abs() <= box_width / 2.0
				&& (point.y - n.position.y).abs() <= box_height / 2.0
		})
	}
}

/// How computed positions are chosen before overrides apply.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum LayoutStrategy {
	/// Sources left, sinks right, ordered to cluster shared endpoints.
	#[default]
	Flow,
	/// First-appearance order, alternating between the two columns.
	Alternating,
	/// Fixed positions by location name; others fall back to `Flow`.
	Pinned(IndexMap<String, Position>),
}

impl LayoutStrategy {
	/// The fixed four-box warehouse map.
	pub fn four_box() -> Self {
		LayoutStrategy::Pinned(
			[
				("Vendor", 200.0, 300.0),
				("WADG", 200.0, 100.0),
				("Humen", 800.0, 100.0),
				("HK3PL", 800.0, 300.0),
			]
			.into_iter()
			.map(|(id, x, y)| (id.to_string(), Position::new(x, y)))
			.collect(),
		)
	}
}
