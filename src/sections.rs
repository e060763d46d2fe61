//! The operator's ordered pipeline of calculation sections.
//!
//! Every mutation that needs fresh fields hands back a [`ResolveTicket`].
//! The ticket carries a token; only the newest token of a section may write
//! its fields back, so a slow response can never overwrite a newer one.

use std::fmt;

use log::{debug, info};

use crate::aggregator::{Breakdown, SectionSelection};
use crate::catalog::RouteCatalog;
use crate::fields::{FieldDefinition, FieldRequest, Inputs, merge_inputs};

/// Stable identity of a section, minted in insertion order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SectionId(u64);

impl fmt::Display for SectionId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "section#{}", self.0)
	}
}

/// One (node, location, inputs) unit contributing one breakdown.
#[derive(Clone, Debug, PartialEq)]
pub struct CalculationSection {
	pub id: SectionId,
	pub node: Option<String>,
	pub location: Option<String>,
	pub fields: Vec<FieldDefinition>,
	pub inputs: Inputs,
	/// Result of the last calculation. Left stale until the next one lands.
	pub breakdown: Option<Breakdown>,
	latest_token: u64,
}

impl CalculationSection {
	fn new(id: SectionId) -> Self {
		Self {
			id,
			node: None,
			location: None,
			fields: Vec::new(),
			inputs: Inputs::new(),
			breakdown: None,
			latest_token: 0,
		}
	}

	pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
		self.fields.iter().find(|f| f.name == name)
	}

	fn selection(&self) -> SectionSelection {
		SectionSelection {
			node: self.node.clone().unwrap_or_default(),
			location: self.location.clone().unwrap_or_default(),
			inputs: self.inputs.clone(),
		}
	}
}

/// Why a resolution was requested.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResolveTrigger {
	NodeChanged,
	LocationChanged,
	/// A select field changed value.
	Differentiator { field: String },
}

/// A pending field resolution for one section.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolveTicket {
	pub section: SectionId,
	pub token: u64,
	pub trigger: ResolveTrigger,
	pub request: FieldRequest,
}

/// What happened to a resolution response.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApplyOutcome {
	Applied,
	/// A newer request for the section was issued after this one.
	Stale,
	/// The section was removed in the meantime.
	Missing,
}

/// Insertion-ordered sections, exclusively owned.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SectionStore {
	sections: Vec<CalculationSection>,
	next_id: u64,
	next_token: u64,
}

impl SectionStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Append an empty section.
	pub fn add(&mut self) -> SectionId {
		self.next_id += 1;
		let id = SectionId(self.next_id);
		self.sections.push(CalculationSection::new(id));
		debug!("Added {}", id);
		id
	}

	pub fn remove(&mut self, id: SectionId) -> bool {
		let before = self.sections.len();
		self.sections.retain(|s| s.id != id);
		before != self.sections.len()
	}

	pub fn clear(&mut self) {
		self.sections.clear();
	}

	pub fn len(&self) -> usize {
		self.sections.len()
	}

	pub fn is_empty(&self) -> bool {
		self.sections.is_empty()
	}

	pub fn get(&self, id: SectionId) -> Option<&CalculationSection> {
		self.sections.iter().find(|s| s.id == id)
	}

	fn get_mut(&mut self, id: SectionId) -> Option<&mut CalculationSection> {
		self.sections.iter_mut().find(|s| s.id == id)
	}

	pub fn iter(&self) -> impl Iterator<Item = &CalculationSection> {
		self.sections.iter()
	}

	pub fn ids(&self) -> Vec<SectionId> {
		self.sections.iter().map(|s| s.id).collect()
	}

	pub fn position(&self, id: SectionId) -> Option<usize> {
		self.sections.iter().position(|s| s.id == id)
	}

	/// Node names used by at least one section.
	pub fn active_nodes(&self) -> Vec<String> {
		let mut nodes: Vec<String> = self.sections.iter().filter_map(|s| s.node.clone()).collect();
		nodes.sort_unstable();
		nodes.dedup();
		nodes
	}

	pub fn is_node_in_use(&self, node: &str) -> bool {
		self.sections.iter().any(|s| s.node.as_deref() == Some(node))
	}

	/// Pick a node (or clear it with `None`). The location is corrected to
	/// one the node serves, then fields are re-resolved from scratch.
	pub fn select_node(
		&mut self,
		catalog: &RouteCatalog,
		id: SectionId,
		node: Option<&str>,
	) -> Option<ResolveTicket> {
		let token = self.mint_token();
		let section = self.get_mut(id)?;
		section.latest_token = token;
		section.node = node.map(str::to_string);
		if let Some(node) = node {
			section.location = catalog.location_for_node(node, section.location.as_deref());
		}
		Self::ticket(section, token, ResolveTrigger::NodeChanged, Inputs::new())
	}

	/// Pick a location (or clear it with `None`). The node is corrected to
	/// one serving it, then fields are re-resolved from scratch.
	pub fn select_location(
		&mut self,
		catalog: &RouteCatalog,
		id: SectionId,
		location: Option<&str>,
	) -> Option<ResolveTicket> {
		let token = self.mint_token();
		let section = self.get_mut(id)?;
		section.latest_token = token;
		section.location = location.map(str::to_string);
		if let Some(location) = location {
			section.node = catalog.node_for_location(location, section.node.as_deref());
		}
		Self::ticket(section, token, ResolveTrigger::LocationChanged, Inputs::new())
	}

	/// Write a raw field value immediately. Only a changed select value asks
	/// for re-resolution, carrying the full updated inputs.
	pub fn set_input(&mut self, id: SectionId, field: &str, value: &str) -> Option<ResolveTicket> {
		let section = self.get_mut(id)?;
		let Some(definition) = section.field(field) else {
			debug!("Ignoring value for unknown field {field:?} of {id}");
			return None;
		};
		let differentiator = definition.is_differentiator();
		let previous = section.inputs.insert(field.to_string(), value.to_string());
		if !differentiator || previous.as_deref() == Some(value) {
			return None;
		}
		info!(
			"Differentiator {:?} of {} changed from {:?} to {:?}",
			field,
			id,
			previous.unwrap_or_default(),
			value
		);

		let token = self.mint_token();
		let section = self.get_mut(id)?;
		section.latest_token = token;
		let inputs = section.inputs.clone();
		Self::ticket(
			section,
			token,
			ResolveTrigger::Differentiator {
				field: field.to_string(),
			},
			inputs,
		)
	}

	/// Write a resolution response back if it is still the newest request.
	///
	/// Values are merged from whatever the section holds now, whatever the
	/// trigger, so text typed while the request was in flight survives.
	pub fn apply_resolution(
		&mut self,
		ticket: &ResolveTicket,
		fields: Vec<FieldDefinition>,
	) -> ApplyOutcome {
		let Some(section) = self.get_mut(ticket.section) else {
			return ApplyOutcome::Missing;
		};
		if section.latest_token != ticket.token {
			debug!(
				"Discarding stale fields for {} (token {} < {})",
				ticket.section, ticket.token, section.latest_token
			);
			return ApplyOutcome::Stale;
		}
		section.inputs = merge_inputs(&fields, &section.inputs);
		section.fields = fields;
		ApplyOutcome::Applied
	}

	/// `{node, location, inputs}` per section, in store order.
	pub fn snapshot(&self) -> Vec<SectionSelection> {
		self.sections.iter().map(CalculationSection::selection).collect()
	}

	/// Hand breakdowns out by position. Surplus sections keep their old value.
	pub fn apply_breakdowns(&mut self, breakdowns: impl IntoIterator<Item = Breakdown>) -> usize {
		let mut applied = 0;
		for (section, breakdown) in self.sections.iter_mut().zip(breakdowns) {
			section.breakdown = Some(breakdown);
			applied += 1;
		}
		applied
	}

	fn mint_token(&mut self) -> u64 {
		self.next_token += 1;
		self.next_token
	}

	fn ticket(
		section: &CalculationSection,
		token: u64,
		trigger: ResolveTrigger,
		inputs: Inputs,
	) -> Option<ResolveTicket> {
		let (node, location) = (section.node.clone()?, section.location.clone()?);
		Some(ResolveTicket {
			section: section.id,
			token,
			trigger,
			request: FieldRequest {
				node,
				location,
				inputs,
			},
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::catalog::tests::sample_catalog;

	fn resolved(store: &mut SectionStore, id: SectionId, fields: Vec<FieldDefinition>) {
		let catalog = sample_catalog();
		let ticket = store.select_node(&catalog, id, Some("B")).unwrap();
		assert_eq!(store.apply_resolution(&ticket, fields), ApplyOutcome::Applied);
	}

	#[test]
	fn ids_are_stable_and_in_insertion_order() {
		let mut store = SectionStore::new();
		let a = store.add();
		let b = store.add();
		let c = store.add();
		assert!(a < b && b < c);
		assert!(store.remove(b));
		assert!(!store.remove(b));
		assert_eq!(store.ids(), [a, c]);
		let d = store.add();
		assert_ne!(d, b);
		assert_eq!(store.position(d), Some(2));
	}

	#[test]
	fn new_sections_start_empty() {
		let mut store = SectionStore::new();
		let id = store.add();
		let section = store.get(id).unwrap();
		assert!(section.node.is_none() && section.location.is_none());
		assert!(section.fields.is_empty() && section.inputs.is_empty());
		assert!(section.breakdown.is_none());
	}

	#[test]
	fn selecting_node_corrects_location_and_resolves_with_empty_inputs() {
		let catalog = sample_catalog();
		let mut store = SectionStore::new();
		let id = store.add();
		let ticket = store.select_node(&catalog, id, Some("B")).unwrap();
		assert_eq!(ticket.trigger, ResolveTrigger::NodeChanged);
		assert_eq!(ticket.request.location, "WADG -> Humen");
		assert!(ticket.request.inputs.is_empty());

		store.select_location(&catalog, id, Some("WADG -> HK3PL"));
		store.select_node(&catalog, id, Some("C"));
		assert_eq!(store.get(id).unwrap().location.as_deref(), Some("WADG -> HK3PL"));
	}

	#[test]
	fn selecting_node_without_locations_clears_location_and_skips_resolution() {
		let catalog = sample_catalog();
		let mut store = SectionStore::new();
		let id = store.add();
		store.select_node(&catalog, id, Some("A"));
		assert!(store.select_node(&catalog, id, Some("D")).is_none());
		assert_eq!(store.get(id).unwrap().location, None);
	}

	#[test]
	fn selecting_location_corrects_node() {
		let catalog = sample_catalog();
		let mut store = SectionStore::new();
		let id = store.add();
		store.select_node(&catalog, id, Some("A"));
		let ticket = store
			.select_location(&catalog, id, Some("WADG -> HK3PL"))
			.unwrap();
		assert_eq!(ticket.trigger, ResolveTrigger::LocationChanged);
		assert_eq!(ticket.request.node, "B");

		assert!(store.select_location(&catalog, id, Some("Nowhere")).is_none());
		assert_eq!(store.get(id).unwrap().node, None);
	}

	#[test]
	fn clearing_node_keeps_location_without_resolving() {
		let catalog = sample_catalog();
		let mut store = SectionStore::new();
		let id = store.add();
		store.select_node(&catalog, id, Some("A"));
		assert!(store.select_node(&catalog, id, None).is_none());
		let section = store.get(id).unwrap();
		assert_eq!(section.node, None);
		assert_eq!(section.location.as_deref(), Some("Vendor -> WADG"));
	}

	#[test]
	fn text_edits_never_trigger_resolution() {
		let mut store = SectionStore::new();
		let id = store.add();
		resolved(
			&mut store,
			id,
			vec![FieldDefinition::select("Own", &["N", "Y"]), FieldDefinition::text("CBM")],
		);
		assert!(store.set_input(id, "CBM", "12").is_none());
		assert!(store.set_input(id, "CBM", "13").is_none());
		assert_eq!(store.get(id).unwrap().inputs["CBM"], "13");
	}

	#[test]
	fn changed_select_triggers_one_resolution_with_full_inputs() {
		let mut store = SectionStore::new();
		let id = store.add();
		resolved(
			&mut store,
			id,
			vec![FieldDefinition::select("Own", &["N", "Y"]), FieldDefinition::text("CBM")],
		);
		store.set_input(id, "CBM", "5");

		assert!(store.set_input(id, "Own", "N").is_none(), "same value");
		let ticket = store.set_input(id, "Own", "Y").unwrap();
		assert_eq!(
			ticket.trigger,
			ResolveTrigger::Differentiator {
				field: "Own".into()
			}
		);
		assert_eq!(ticket.request.inputs["Own"], "Y");
		assert_eq!(ticket.request.inputs["CBM"], "5");
	}

	#[test]
	fn differentiator_response_keeps_surviving_values_and_drops_others() {
		let mut store = SectionStore::new();
		let id = store.add();
		resolved(
			&mut store,
			id,
			vec![
				FieldDefinition::select("Own", &["N", "Y"]),
				FieldDefinition::text("CBM"),
				FieldDefinition::text("pallet"),
			],
		);
		store.set_input(id, "pallet", "4");
		let ticket = store.set_input(id, "Own", "Y").unwrap();
		store.set_input(id, "CBM", "typed while waiting");

		let outcome = store.apply_resolution(
			&ticket,
			vec![
				FieldDefinition::select("Own", &["N", "Y"]),
				FieldDefinition::text("CBM"),
				FieldDefinition::text("Month Qty"),
			],
		);
		assert_eq!(outcome, ApplyOutcome::Applied);
		let inputs = &store.get(id).unwrap().inputs;
		assert_eq!(inputs["Own"], "Y");
		assert_eq!(inputs["CBM"], "typed while waiting");
		assert_eq!(inputs["Month Qty"], "");
		assert!(!inputs.contains_key("pallet"));
	}

	#[test]
	fn node_and_location_changes_keep_shared_field_values() {
		let catalog = sample_catalog();
		let mut store = SectionStore::new();
		let id = store.add();
		resolved(
			&mut store,
			id,
			vec![FieldDefinition::select("Own", &["N", "Y"]), FieldDefinition::text("CBM")],
		);
		store.set_input(id, "CBM", "12");
		store.set_input(id, "Own", "Y");

		let ticket = store
			.select_location(&catalog, id, Some("WADG -> HK3PL"))
			.unwrap();
		assert!(ticket.request.inputs.is_empty());
		store.apply_resolution(&ticket, vec![FieldDefinition::text("CBM")]);
		let inputs = &store.get(id).unwrap().inputs;
		assert_eq!(inputs["CBM"], "12");
		assert!(!inputs.contains_key("Own"));

		let ticket = store.select_node(&catalog, id, Some("C")).unwrap();
		assert!(ticket.request.inputs.is_empty());
		store.apply_resolution(
			&ticket,
			vec![FieldDefinition::text("CBM"), FieldDefinition::select("Own", &["N", "Y"])],
		);
		let inputs = &store.get(id).unwrap().inputs;
		assert_eq!(inputs["CBM"], "12");
		assert_eq!(inputs["Own"], "N");
	}

	#[test]
	fn unknown_field_names_are_not_stored() {
		let mut store = SectionStore::new();
		let id = store.add();
		resolved(&mut store, id, vec![FieldDefinition::text("CBM")]);
		assert!(store.set_input(id, "pallet", "4").is_none());
		let inputs = &store.get(id).unwrap().inputs;
		assert!(!inputs.contains_key("pallet"));
		assert_eq!(inputs.keys().collect::<Vec<_>>(), ["CBM"]);
	}

	#[test]
	fn stale_responses_are_discarded() {
		let catalog = sample_catalog();
		let mut store = SectionStore::new();
		let id = store.add();
		let first = store.select_node(&catalog, id, Some("A")).unwrap();
		let second = store.select_node(&catalog, id, Some("B")).unwrap();
		assert!(second.token > first.token);

		assert_eq!(
			store.apply_resolution(&second, vec![FieldDefinition::text("CBM")]),
			ApplyOutcome::Applied
		);
		assert_eq!(
			store.apply_resolution(&first, vec![FieldDefinition::text("Old")]),
			ApplyOutcome::Stale
		);
		assert_eq!(store.get(id).unwrap().fields[0].name, "CBM");
	}

	#[test]
	fn responses_for_removed_sections_are_ignored() {
		let catalog = sample_catalog();
		let mut store = SectionStore::new();
		let id = store.add();
		let ticket = store.select_node(&catalog, id, Some("A")).unwrap();
		store.remove(id);
		assert_eq!(store.apply_resolution(&ticket, vec![]), ApplyOutcome::Missing);
	}

	#[test]
	fn short_breakdown_list_leaves_trailing_sections_alone() {
		let mut store = SectionStore::new();
		let a = store.add();
		let b = store.add();
		let old = Breakdown::default();
		store.apply_breakdowns([old.clone(), old]);

		let fresh = Breakdown {
			base: vec![crate::aggregator::CostItem::new("Handling", "1", "2")],
			..Breakdown::default()
		};
		assert_eq!(store.apply_breakdowns([fresh.clone()]), 1);
		assert_eq!(store.get(a).unwrap().breakdown.as_ref(), Some(&fresh));
		assert_eq!(store.get(b).unwrap().breakdown, Some(Breakdown::default()));
	}
}
