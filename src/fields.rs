//! Field definitions and the cascading resolution merge policy.

use indexmap::IndexMap;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::api::FieldService;
use crate::error::ResolutionError;

/// Field name → current raw value, in field order.
pub type Inputs = IndexMap<String, String>;

/// What kind of control a field needs.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldKind {
	/// Pick from a list. Changing the value can reshape the other fields.
	Select { options: Vec<String> },
	/// Free text. The service may send a sample value as a hint.
	Text { placeholder: Option<String> },
}

/// One cost-relevant field, as returned by the field service.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(from = "WireField")]
pub struct FieldDefinition {
	pub name: String,
	pub display_name: String,
	pub kind: FieldKind,
}

#[derive(Deserialize)]
struct WireField {
	name: String,
	#[serde(default)]
	display_name: Option<String>,
	#[serde(rename = "type", default)]
	kind: String,
	#[serde(default)]
	options: Vec<String>,
}

impl From<WireField> for FieldDefinition {
	fn from(wire: WireField) -> Self {
		// The service labels free-text fields "input"; anything but "select" is text.
		let kind = if wire.kind == "select" {
			FieldKind::Select {
				options: wire.options,
			}
		} else {
			FieldKind::Text {
				placeholder: wire.options.into_iter().next(),
			}
		};
		Self {
			display_name: wire.display_name.unwrap_or_else(|| wire.name.clone()),
			name: wire.name,
			kind,
		}
	}
}

impl FieldDefinition {
	pub fn select(name: &str, options: &[&str]) -> Self {
		Self {
			name: name.into(),
			display_name: name.into(),
			kind: FieldKind::Select {
				options: options.iter().map(|o| o.to_string()).collect(),
			},
		}
	}

	pub fn text(name: &str) -> Self {
		Self {
			name: name.into(),
			display_name: name.into(),
			kind: FieldKind::Text { placeholder: None },
		}
	}

	/// Only select fields can change which other fields exist.
	pub fn is_differentiator(&self) -> bool {
		matches!(self.kind, FieldKind::Select { .. })
	}

	pub fn options(&self) -> &[String] {
		match &self.kind {
			FieldKind::Select { options } => options,
			FieldKind::Text { .. } => &[],
		}
	}

	/// Value used when no prior value exists under this name.
	pub fn default_value(&self) -> String {
		self.options().first().cloned().unwrap_or_default()
	}
}

/// Rebuild an inputs map for a fresh field list.
///
/// Values survive only under an identical field name; fields missing from
/// `fields` are dropped together with their values.
pub fn merge_inputs(fields: &[FieldDefinition], prior: &Inputs) -> Inputs {
	fields
		.iter()
		.map(|field| {
			let value = prior
				.get(&field.name)
				.cloned()
				.unwrap_or_else(|| field.default_value());
			(field.name.clone(), value)
		})
		.collect()
}

/// Body of a field resolution request.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FieldRequest {
	pub node: String,
	pub location: String,
	pub inputs: Inputs,
}

/// Asks the field service which fields apply to a node/location pair.
pub struct FieldResolver<'a, S> {
	service: &'a S,
}

impl<'a, S: FieldService> FieldResolver<'a, S> {
	pub fn new(service: &'a S) -> Self {
		Self { service }
	}

	pub async fn resolve(
		&self,
		request: &FieldRequest,
	) -> Result<Vec<FieldDefinition>, ResolutionError> {
		debug!(
			"Resolving fields for {} / {} with {} known inputs",
			request.node,
			request.location,
			request.inputs.len()
		);
		self.service.fields(request).await.map_err(|source| {
			warn!(
				"Field resolution for {} / {} failed: {}",
				request.node, request.location, source
			);
			ResolutionError {
				node: request.node.clone(),
				location: request.location.clone(),
				source,
			}
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn decodes_select_and_input_fields() {
		let json = r#"[
			{"name": "Own", "display_name": "Own", "options": ["N", "Y"], "type": "select"},
			{"name": "CBM", "display_name": "CBM", "options": ["12.5"], "type": "input"},
			{"name": "pallet", "type": "text"}
		]"#;
		let fields: Vec<FieldDefinition> = serde_json::from_str(json).unwrap();
		assert_eq!(fields[0], FieldDefinition::select("Own", &["N", "Y"]));
		assert_eq!(
			fields[1].kind,
			FieldKind::Text {
				placeholder: Some("12.5".into())
			}
		);
		assert!(!fields[1].is_differentiator());
		assert_eq!(fields[2].display_name, "pallet");
	}

	#[test]
	fn merge_keeps_matching_names_and_drops_the_rest() {
		let fields = vec![
			FieldDefinition::select("Own", &["N", "Y"]),
			FieldDefinition::select("Method", &["Sea", "Air"]),
			FieldDefinition::text("CBM"),
		];
		let prior: Inputs = [("Own", "Y"), ("pallet", "3"), ("CBM", "7")]
			.into_iter()
			.map(|(k, v)| (k.to_string(), v.to_string()))
			.collect();

		let merged = merge_inputs(&fields, &prior);
		assert_eq!(merged.keys().collect::<Vec<_>>(), ["Own", "Method", "CBM"]);
		assert_eq!(merged["Own"], "Y");
		assert_eq!(merged["Method"], "Sea");
		assert_eq!(merged["CBM"], "7");
		assert!(!merged.contains_key("pallet"));
	}

	#[test]
	fn defaults_for_new_fields() {
		let fields = vec![
			FieldDefinition::select("Empty", &[]),
			FieldDefinition {
				name: "Qty".into(),
				display_name: "Qty".into(),
				kind: FieldKind::Text {
					placeholder: Some("10".into()),
				},
			},
		];
		let merged = merge_inputs(&fields, &Inputs::new());
		assert_eq!(merged["Empty"], "");
		assert_eq!(merged["Qty"], "");
	}
}
