//! Snapshot of the node → route topology served by the catalog endpoint.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

/// One from → to hop between two locations.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Connection {
	pub from: String,
	pub to: String,
}

/// The routes one node can serve.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteOption {
	/// Route labels, in the order the service lists them.
	#[serde(default)]
	pub locations: Vec<String>,
	/// Connection rows. Only the first one places the node on the map.
	#[serde(default)]
	pub details: Vec<Connection>,
}

impl RouteOption {
	pub fn has_location(&self, location: &str) -> bool {
		self.locations.iter().any(|l| l == location)
	}

	/// The connection drawn on the route map for this node.
	pub fn connection(&self) -> Option<&Connection> {
		self.details.first()
	}
}

/// Node name → route option, in service order.
///
/// Order matters: when a location is picked without a compatible node, the
/// first node listing it wins.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RouteCatalog {
	nodes: IndexMap<String, RouteOption>,
}

impl FromIterator<(String, RouteOption)> for RouteCatalog {
	fn from_iter<T: IntoIterator<Item = (String, RouteOption)>>(iter: T) -> Self {
		Self {
			nodes: iter.into_iter().collect(),
		}
	}
}

impl RouteCatalog {
	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	pub fn len(&self) -> usize {
		self.nodes.len()
	}

	pub fn get(&self, node: &str) -> Option<&RouteOption> {
		self.nodes.get(node)
	}

	pub fn node_names(&self) -> impl Iterator<Item = &str> {
		self.nodes.keys().map(String::as_str)
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &RouteOption)> {
		self.nodes.iter().map(|(k, v)| (k.as_str(), v))
	}

	/// Valid locations for `node`; empty for unknown nodes.
	pub fn locations(&self, node: &str) -> &[String] {
		self.nodes
			.get(node)
			.map(|o| o.locations.as_slice())
			.unwrap_or_default()
	}

	/// Every location any node serves, sorted and de-duplicated.
	pub fn all_locations(&self) -> Vec<&str> {
		let mut all: Vec<&str> = self
			.nodes
			.values()
			.flat_map(|o| o.locations.iter().map(String::as_str))
			.collect::<IndexSet<_>>()
			.into_iter()
			.collect();
		all.sort_unstable();
		all
	}

	/// Route dropdown contents for a section: the node's own locations when
	/// a node is chosen, otherwise every known location.
	pub fn location_choices(&self, node: Option<&str>) -> Vec<&str> {
		match node.and_then(|n| self.nodes.get(n)) {
			Some(option) => option.locations.iter().map(String::as_str).collect(),
			None => self.all_locations(),
		}
	}

	pub fn first_node_with_location(&self, location: &str) -> Option<&str> {
		self.nodes
			.iter()
			.find(|(_, o)| o.has_location(location))
			.map(|(name, _)| name.as_str())
	}

	/// Location to keep after `node` was picked: the current one if the node
	/// serves it, else the node's first location.
	pub fn location_for_node(&self, node: &str, current: Option<&str>) -> Option<String> {
		let locations = self.locations(node);
		match current {
			Some(loc) if locations.iter().any(|l| l == loc) => Some(loc.to_string()),
			_ => locations.first().cloned(),
		}
	}

	/// Node to keep after `location` was picked: the current one if it
	/// serves the location, else the first node that does.
	pub fn node_for_location(&self, location: &str, current: Option<&str>) -> Option<String> {
		match current.and_then(|n| self.nodes.get_key_value(n)) {
			Some((name, option)) if option.has_location(location) => Some(name.clone()),
			_ => self.first_node_with_location(location).map(str::to_string),
		}
	}

	/// `(node, connection)` for every node that has one, in catalog order.
	pub fn connections(&self) -> impl Iterator<Item = (&str, &Connection)> {
		self.nodes
			.iter()
			.filter_map(|(name, o)| o.connection().map(|c| (name.as_str(), c)))
	}
}

#[cfg(test)]
pub(crate) mod tests {
	use super::*;

	pub(crate) fn route(locations: &[&str], from: &str, to: &str) -> RouteOption {
		RouteOption {
			locations: locations.iter().map(|s| s.to_string()).collect(),
			details: vec![Connection {
				from: from.into(),
				to: to.into(),
			}],
		}
	}

	pub(crate) fn sample_catalog() -> RouteCatalog {
		[
			("A".to_string(), route(&["Vendor -> WADG"], "Vendor", "WADG")),
			(
				"B".to_string(),
				route(&["WADG -> Humen", "WADG -> HK3PL"], "WADG", "Humen"),
			),
			("C".to_string(), route(&["WADG -> HK3PL"], "WADG", "HK3PL")),
			("D".to_string(), RouteOption::default()),
		]
		.into_iter()
		.collect()
	}

	#[test]
	fn decodes_service_payload_in_order() {
		let json = r#"{
			"Z": {"locations": ["X -> Y"], "details": [{"from": "X", "to": "Y", "excel_row": 4, "own": ""}], "sheet": "WAHL WH fee"},
			"A": {"locations": ["Y -> W"], "details": []}
		}"#;
		let catalog: RouteCatalog = serde_json::from_str(json).unwrap();
		assert_eq!(catalog.node_names().collect::<Vec<_>>(), ["Z", "A"]);
		assert_eq!(catalog.get("Z").unwrap().connection().unwrap().to, "Y");
		assert!(catalog.get("A").unwrap().connection().is_none());
	}

	#[test]
	fn location_for_node_keeps_valid_or_takes_first() {
		let catalog = sample_catalog();
		assert_eq!(
			catalog.location_for_node("B", Some("WADG -> HK3PL")).as_deref(),
			Some("WADG -> HK3PL")
		);
		assert_eq!(
			catalog.location_for_node("B", Some("Vendor -> WADG")).as_deref(),
			Some("WADG -> Humen")
		);
		assert_eq!(
			catalog.location_for_node("B", None).as_deref(),
			Some("WADG -> Humen")
		);
		assert_eq!(catalog.location_for_node("D", Some("Vendor -> WADG")), None);
		assert_eq!(catalog.location_for_node("missing", None), None);
	}

	#[test]
	fn node_for_location_keeps_valid_or_takes_first_match() {
		let catalog = sample_catalog();
		assert_eq!(
			catalog.node_for_location("WADG -> HK3PL", Some("C")).as_deref(),
			Some("C")
		);
		assert_eq!(
			catalog.node_for_location("WADG -> HK3PL", Some("A")).as_deref(),
			Some("B")
		);
		assert_eq!(catalog.node_for_location("Nowhere", Some("A")), None);
	}

	#[test]
	fn location_choices_depend_on_node() {
		let catalog = sample_catalog();
		assert_eq!(
			catalog.location_choices(None),
			["Vendor -> WADG", "WADG -> HK3PL", "WADG -> Humen"]
		);
		assert_eq!(
			catalog.location_choices(Some("B")),
			["WADG -> Humen", "WADG -> HK3PL"]
		);
	}

	#[test]
	fn connections_skip_nodes_without_details() {
		let catalog = sample_catalog();
		let nodes: Vec<_> = catalog.connections().map(|(n, _)| n).collect();
		assert_eq!(nodes, ["A", "B", "C"]);
	}
}
