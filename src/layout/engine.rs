use std::collections::{HashMap, HashSet};

use indexmap::IndexSet;

use super::{Column, GraphEdge, GraphLayout, GraphNode, LayoutOverrides, LayoutStrategy, Position};
use crate::catalog::RouteCatalog;
use crate::config::LayoutConfig;

/// Computes box positions for the route map.
///
/// A pure function of the catalog and overrides; persistence lives in
/// [`super::LayoutStore`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LayoutEngine {
	config: LayoutConfig,
	strategy: LayoutStrategy,
}

struct Placement<'a> {
	id: &'a str,
	column: Column,
	position: Position,
}

impl LayoutEngine {
	pub fn new(config: LayoutConfig) -> Self {
		Self::with_strategy(config, LayoutStrategy::default())
	}

	pub fn with_strategy(config: LayoutConfig, strategy: LayoutStrategy) -> Self {
		Self { config, strategy }
	}

	pub fn config(&self) -> &LayoutConfig {
		&self.config
	}

	pub fn layout(&self, catalog: &RouteCatalog, overrides: &LayoutOverrides) -> GraphLayout {
		let edges: Vec<GraphEdge> = catalog
			.connections()
			.map(|(node, c)| GraphEdge {
				node: node.to_string(),
				from: c.from.clone(),
				to: c.to.clone(),
			})
			.collect();

		let placements = match &self.strategy {
			LayoutStrategy::Flow => self.flow(&edges),
			LayoutStrategy::Alternating => self.alternating(&edges),
			LayoutStrategy::Pinned(table) => {
				let mut placements = self.flow(&edges);
				for p in &mut placements {
					if let Some(pinned) = table.get(p.id) {
						p.position = *pinned;
					}
				}
				placements
			}
		};

		let max_y = placements
			.iter()
			.map(|p| p.position.y)
			.fold(0.0, f64::max);
		let canvas_height = (max_y + self.config.bottom_padding).max(self.config.min_canvas_height);

		let nodes = placements
			.into_iter()
			.map(|p| GraphNode {
				id: p.id.to_string(),
				label: overrides.label(p.id).unwrap_or(p.id).to_string(),
				position: overrides.position(p.id).unwrap_or(p.position),
				column: p.column,
			})
			.collect();

		GraphLayout {
			nodes,
			edges,
			canvas_height,
		}
	}

	fn flow<'a>(&self, edges: &'a [GraphEdge]) -> Vec<Placement<'a>> {
		let order = appearance_order(edges);
		let sources: HashSet<&str> = edges.iter().map(|e| e.from.as_str()).collect();

		// Anything that emits an edge goes left, even if it also receives one.
		let (mut left, mut right): (Vec<&str>, Vec<&str>) =
			order.iter().copied().partition(|id| sources.contains(id));
		left.sort_by_key(|id| {
			edges
				.iter()
				.find(|e| e.from == *id)
				.map(|e| e.to.as_str())
		});
		right.sort_by_key(|id| {
			edges
				.iter()
				.find(|e| e.to == *id)
				.map(|e| e.from.as_str())
		});

		let mut placements = Vec::with_capacity(order.len());
		self.stack(&left, Column::Left, edges, &mut placements);
		self.stack(&right, Column::Right, edges, &mut placements);
		placements
	}

	fn stack<'a>(
		&self,
		ids: &[&'a str],
		column: Column,
		edges: &[GraphEdge],
		out: &mut Vec<Placement<'a>>,
	) {
		let x = self.column_x(column);
		let mut y = self.config.start_y;
		for &id in ids {
			out.push(Placement {
				id,
				column,
				position: Position::new(x, y),
			});
			let degree = edges.iter().filter(|e| e.from == id || e.to == id).count();
			y += self.config.base_spacing
				+ self.config.extra_spacing_per_edge * degree.saturating_sub(1) as f64;
		}
	}

	fn alternating<'a>(&self, edges: &'a [GraphEdge]) -> Vec<Placement<'a>> {
		appearance_order(edges)
			.into_iter()
			.enumerate()
			.map(|(idx, id)| {
				let column = if idx % 2 == 0 {
					Column::Left
				} else {
					Column::Right
				};
				Placement {
					id,
					column,
					position: Position::new(
						self.column_x(column),
						self.config.start_y + (idx / 2) as f64 * self.config.base_spacing,
					),
				}
			})
			.collect()
	}

	fn column_x(&self, column: Column) -> f64 {
		match column {
			Column::Left => self.config.left_x,
			Column::Right => self.config.right_x,
		}
	}
}

fn appearance_order(edges: &[GraphEdge]) -> IndexSet<&str> {
	edges
		.iter()
		.flat_map(|e| [e.from.as_str(), e.to.as_str()])
		.collect()
}

/// Screen geometry of one edge.
#[derive(Clone, Debug, PartialEq)]
pub struct EdgeGeometry {
	pub node: String,
	pub start: Position,
	pub end: Position,
	/// Anchor of the node label, just above the midpoint.
	pub label: Position,
}

/// Endpoints of every drawable edge. Edges leaving the same box fan out
/// perpendicular to their direction, symmetric around the centre line.
pub fn edge_geometry(layout: &GraphLayout, config: &LayoutConfig) -> Vec<EdgeGeometry> {
	let mut group_sizes: HashMap<&str, usize> = HashMap::new();
	for edge in &layout.edges {
		*group_sizes.entry(edge.from.as_str()).or_default() += 1;
	}

	let mut seen: HashMap<&str, usize> = HashMap::new();
	let mut geometry = Vec::with_capacity(layout.edges.len());
	for edge in &layout.edges {
		let (Some(from), Some(to)) = (layout.node(&edge.from), layout.node(&edge.to)) else {
			continue;
		};
		let count = group_sizes[edge.from.as_str()] as f64;
		let slot = seen.entry(edge.from.as_str()).or_default();
		let offset = (*slot as f64 - (count - 1.0) / 2.0) * config.fan_spacing;
		*slot += 1;

		let (a, b) = (from.position, to.position);
		let angle = (b.y - a.y).atan2(b.x - a.x);
		let (cos, sin) = (angle.cos(), angle.sin());
		let (px, py) = (-sin * offset, cos * offset);

		let start = Position::new(
			a.x + cos * config.source_padding.0 + px,
			a.y + sin * config.source_padding.1 + py,
		);
		let end = Position::new(
			b.x - cos * config.target_padding.0 + px,
			b.y - sin * config.target_padding.1 + py,
		);
		geometry.push(EdgeGeometry {
			node: edge.node.clone(),
			start,
			end,
			label: Position::new(
				(start.x + end.x) / 2.0,
				(start.y + end.y) / 2.0 - config.label_lift,
			),
		});
	}
	geometry
}
