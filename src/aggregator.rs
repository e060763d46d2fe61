//! Batch calculation of the whole pipeline and the result it leaves behind.

use std::fmt;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::CalculationError;
use crate::fields::Inputs;
use crate::sections::SectionStore;

/// What one section contributes to a calculation request.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SectionSelection {
	pub node: String,
	pub location: String,
	pub inputs: Inputs,
}

/// A breakdown cell; the service sends numbers or text.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
	Number(f64),
	Text(String),
	#[default]
	Empty,
}

impl fmt::Display for CellValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			CellValue::Number(n) => write!(f, "{n}"),
			CellValue::Text(s) => f.write_str(s),
			CellValue::Empty => Ok(()),
		}
	}
}

/// One itemized cost line.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct CostItem {
	pub name: String,
	#[serde(default)]
	pub row1: CellValue,
	#[serde(default)]
	pub row2: CellValue,
}

impl CostItem {
	pub fn new(name: &str, row1: &str, row2: &str) -> Self {
		Self {
			name: name.into(),
			row1: CellValue::Text(row1.into()),
			row2: CellValue::Text(row2.into()),
		}
	}
}

/// Itemized cost lines for one section.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct Breakdown {
	#[serde(default)]
	pub base: Vec<CostItem>,
	#[serde(default)]
	pub variable: Vec<CostItem>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct NodeResult {
	#[serde(default)]
	pub node: Option<String>,
	#[serde(default)]
	pub cost: Option<f64>,
	#[serde(default)]
	pub breakdown: Breakdown,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct CalculationResponse {
	pub total_cost: f64,
	#[serde(default)]
	pub node_results: Vec<NodeResult>,
	#[serde(default)]
	pub logs: Vec<String>,
}

/// Styling class of a diagnostic log line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLineKind {
	Header,
	Warning,
	Plain,
}

impl LogLineKind {
	pub fn classify(line: &str) -> Self {
		if line.contains("---") || line.contains("===") {
			LogLineKind::Header
		} else if line.contains("[WARNING]") {
			LogLineKind::Warning
		} else {
			LogLineKind::Plain
		}
	}
}

/// An issued calculation. Only the newest ticket may land.
#[derive(Clone, Debug, PartialEq)]
pub struct CalculationTicket {
	pub token: u64,
	pub request: Vec<SectionSelection>,
}

/// Holds the total and diagnostic log of the last successful calculation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Aggregator {
	total: Option<f64>,
	logs: Vec<String>,
	show_logs: bool,
	in_flight: Option<u64>,
	next_token: u64,
}

impl Aggregator {
	pub fn total(&self) -> Option<f64> {
		self.total
	}

	pub fn logs(&self) -> &[String] {
		&self.logs
	}

	pub fn is_running(&self) -> bool {
		self.in_flight.is_some()
	}

	pub fn logs_visible(&self) -> bool {
		self.show_logs && !self.logs.is_empty()
	}

	pub fn toggle_logs(&mut self) {
		self.show_logs = !self.show_logs;
	}

	/// Snapshot the store and mark a calculation as running.
	pub fn begin(&mut self, store: &SectionStore) -> Result<CalculationTicket, CalculationError> {
		if store.is_empty() {
			return Err(CalculationError::NoSections);
		}
		if self.in_flight.is_some() {
			return Err(CalculationError::InFlight);
		}
		self.next_token += 1;
		self.in_flight = Some(self.next_token);
		Ok(CalculationTicket {
			token: self.next_token,
			request: store.snapshot(),
		})
	}

	/// Land a response: breakdowns go to sections by position.
	///
	/// Returns `false` when the ticket was superseded (for example by a cost
	/// table swap) and nothing was written.
	pub fn complete(
		&mut self,
		ticket: &CalculationTicket,
		response: CalculationResponse,
		store: &mut SectionStore,
	) -> bool {
		if self.in_flight != Some(ticket.token) {
			warn!("Dropping superseded calculation {}", ticket.token);
			return false;
		}
		self.in_flight = None;

		let returned = response.node_results.len();
		if returned != ticket.request.len() {
			warn!(
				"Calculation returned {} results for {} sections; matching by position",
				returned,
				ticket.request.len()
			);
		}
		store.apply_breakdowns(response.node_results.into_iter().map(|r| r.breakdown));
		info!(
			"Calculated {} sections, total {:.2}",
			ticket.request.len(),
			response.total_cost
		);
		self.total = Some(response.total_cost);
		self.logs = response.logs;
		self.show_logs = true;
		true
	}

	/// Forget a failed calculation without touching any result.
	pub fn fail(&mut self, ticket: &CalculationTicket) {
		if self.in_flight == Some(ticket.token) {
			self.in_flight = None;
		}
	}

	/// Drop total, log and any in-flight calculation.
	pub fn reset(&mut self) {
		*self = Self {
			next_token: self.next_token,
			..Self::default()
		};
	}
}

#[cfg(test)]
pub(crate) mod tests {
	use super::*;

	pub(crate) fn response(results: usize, total: f64) -> CalculationResponse {
		CalculationResponse {
			total_cost: total,
			node_results: (0..results)
				.map(|i| NodeResult {
					node: None,
					cost: None,
					breakdown: Breakdown {
						base: vec![CostItem::new(&format!("item {i}"), "", "")],
						variable: Vec::new(),
					},
				})
				.collect(),
			logs: vec!["=== START ===".into(), "[WARNING] odd".into(), "ok".into()],
		}
	}

	#[test]
	fn decodes_service_response() {
		let json = r#"{
			"node_results": [
				{"node": "A", "cost": 12.5, "breakdown": {"base": [{"name": "Handling", "row1": "2 x 3", "row2": 6.0}], "variable": []}}
			],
			"total_cost": 12.5
		}"#;
		let parsed: CalculationResponse = serde_json::from_str(json).unwrap();
		let item = &parsed.node_results[0].breakdown.base[0];
		assert_eq!(item.row1.to_string(), "2 x 3");
		assert_eq!(item.row2, CellValue::Number(6.0));
		assert!(parsed.logs.is_empty());
	}

	#[test]
	fn classifies_log_lines() {
		assert_eq!(LogLineKind::classify("--- Processing SECTION 1 ---"), LogLineKind::Header);
		assert_eq!(LogLineKind::classify("=".repeat(60).as_str()), LogLineKind::Header);
		assert_eq!(LogLineKind::classify("[WARNING] missing"), LogLineKind::Warning);
		assert_eq!(LogLineKind::classify("  Selected Node: A"), LogLineKind::Plain);
	}

	#[test]
	fn empty_store_cannot_calculate() {
		let mut aggregator = Aggregator::default();
		assert_eq!(
			aggregator.begin(&SectionStore::new()),
			Err(CalculationError::NoSections)
		);
	}

	#[test]
	fn second_calculation_is_refused_while_running() {
		let mut store = SectionStore::new();
		store.add();
		let mut aggregator = Aggregator::default();
		let ticket = aggregator.begin(&store).unwrap();
		assert_eq!(aggregator.begin(&store), Err(CalculationError::InFlight));
		aggregator.fail(&ticket);
		assert!(!aggregator.is_running());
		assert!(aggregator.begin(&store).is_ok());
	}

	#[test]
	fn short_response_updates_only_leading_sections() {
		let mut store = SectionStore::new();
		let a = store.add();
		let b = store.add();
		let mut aggregator = Aggregator::default();

		let ticket = aggregator.begin(&store).unwrap();
		assert_eq!(ticket.request.len(), 2);
		assert!(aggregator.complete(&ticket, response(2, 10.0), &mut store));
		let previous_b = store.get(b).unwrap().breakdown.clone();

		let ticket = aggregator.begin(&store).unwrap();
		let mut short = response(1, 3.0);
		short.node_results[0].breakdown.base[0].name = "fresh".into();
		assert!(aggregator.complete(&ticket, short, &mut store));

		assert_eq!(store.get(a).unwrap().breakdown.as_ref().unwrap().base[0].name, "fresh");
		assert_eq!(store.get(b).unwrap().breakdown, previous_b);
		assert_eq!(aggregator.total(), Some(3.0));
		assert!(aggregator.logs_visible());
	}

	#[test]
	fn reset_supersedes_in_flight_calculation() {
		let mut store = SectionStore::new();
		store.add();
		let mut aggregator = Aggregator::default();
		let ticket = aggregator.begin(&store).unwrap();
		aggregator.reset();
		assert!(!aggregator.complete(&ticket, response(1, 5.0), &mut store));
		assert_eq!(aggregator.total(), None);
		assert!(store.iter().all(|s| s.breakdown.is_none()));
	}
}
