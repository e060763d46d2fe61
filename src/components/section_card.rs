use leptos::prelude::*;
use leptos::task::spawn_local;
use log::error;
use web_sys::Event;

use crate::aggregator::{Breakdown, CostItem};
use crate::api::HttpApi;
use crate::fields::{FieldDefinition, FieldKind};
use crate::sections::SectionId;
use crate::session::{self, Session};

fn optional(value: String) -> Option<String> {
	(!value.is_empty()).then_some(value)
}

/// One calculation section: node and location pickers, its fields and the
/// last breakdown it received.
#[component]
pub fn SectionCard(id: SectionId, session: RwSignal<Session>, api: HttpApi) -> impl IntoView {
	let number = move || {
		session
			.with(|s| s.sections().position(id))
			.map(|p| p + 1)
			.unwrap_or_default()
	};
	let node = move || session.with(|s| s.sections().get(id).and_then(|c| c.node.clone()));
	let location = move || session.with(|s| s.sections().get(id).and_then(|c| c.location.clone()));
	let node_names = move || {
		session.with(|s| s.catalog().node_names().map(str::to_string).collect::<Vec<_>>())
	};
	let location_choices = move || {
		session.with(|s| {
			let node = s.sections().get(id).and_then(|c| c.node.as_deref());
			s.catalog()
				.location_choices(node)
				.into_iter()
				.map(str::to_string)
				.collect::<Vec<_>>()
		})
	};
	// Only the field list; input edits must not rebuild the controls.
	let fields = Memo::new(move |_| {
		session.with(|s| s.sections().get(id).map(|c| c.fields.clone()).unwrap_or_default())
	});
	let breakdown = move || session.with(|s| s.sections().get(id).and_then(|c| c.breakdown.clone()));

	let node_api = api.clone();
	let on_node = move |ev: Event| {
		let node = optional(event_target_value(&ev));
		let api = node_api.clone();
		spawn_local(async move {
			if let Err(err) = session::select_node(&session, &api, id, node).await {
				error!("{err}: {}", err.source);
			}
		});
	};

	let location_api = api.clone();
	let on_location = move |ev: Event| {
		let location = optional(event_target_value(&ev));
		let api = location_api.clone();
		spawn_local(async move {
			if let Err(err) = session::select_location(&session, &api, id, location).await {
				error!("{err}: {}", err.source);
			}
		});
	};

	let on_remove = move |_| {
		session.update(|s| {
			s.remove_section(id);
		});
	};

	view! {
		<div class="node-card glass">
			<div class="node-header">
				<h3>"Section " {number}</h3>
				<button class="remove-node" on:click=on_remove>"×"</button>
			</div>

			<div class="node-config">
				<label>
					"Node"
					<select on:change=on_node>
						<option value="" selected=move || node().is_none()>"Select node..."</option>
						{move || {
							let current = node();
							node_names()
								.into_iter()
								.map(|name| {
									let selected = current.as_deref() == Some(name.as_str());
									view! { <option value=name.clone() selected=selected>{name.clone()}</option> }
								})
								.collect_view()
						}}
					</select>
				</label>
				<label>
					"Location"
					<select on:change=on_location>
						<option value="" selected=move || location().is_none()>"Select location..."</option>
						{move || {
							let current = location();
							location_choices()
								.into_iter()
								.map(|choice| {
									let selected = current.as_deref() == Some(choice.as_str());
									view! { <option value=choice.clone() selected=selected>{choice.clone()}</option> }
								})
								.collect_view()
						}}
					</select>
				</label>
			</div>

			<div class="dynamic-inputs">
				{move || {
					fields
						.get()
						.into_iter()
						.map(|field| view! { <FieldInput id session api=api.clone() field /> })
						.collect_view()
				}}
			</div>

			{move || breakdown().map(|b| view! { <BreakdownTable breakdown=b /> })}
		</div>
	}
}

#[component]
fn FieldInput(
	id: SectionId,
	session: RwSignal<Session>,
	api: HttpApi,
	field: FieldDefinition,
) -> impl IntoView {
	let name = field.name.clone();
	let value = {
		let name = name.clone();
		move || {
			session.with(|s| {
				s.sections()
					.get(id)
					.and_then(|c| c.inputs.get(&name).cloned())
					.unwrap_or_default()
			})
		}
	};
	let commit = move |ev: Event| {
		let value = event_target_value(&ev);
		let field = name.clone();
		let api = api.clone();
		spawn_local(async move {
			if let Err(err) = session::set_input(&session, &api, id, field, value).await {
				error!("{err}: {}", err.source);
			}
		});
	};
	let list_id = format!("{id}-{}", field.name);

	match field.kind {
		// Selects accept typed values too, so they commit on change rather than per keystroke.
		FieldKind::Select { options } => view! {
			<label class="input-group">
				{field.display_name}
				<input type="text" list=list_id.clone() prop:value=value on:change=commit />
				<datalist id=list_id>
					{options
						.into_iter()
						.map(|o| view! { <option value=o></option> })
						.collect_view()}
				</datalist>
			</label>
		}
		.into_any(),
		FieldKind::Text { placeholder } => view! {
			<label class="input-group">
				{field.display_name}
				<input
					type="text"
					placeholder=placeholder.unwrap_or_default()
					prop:value=value
					on:input=commit
				/>
			</label>
		}
		.into_any(),
	}
}

fn cost_rows(items: Vec<CostItem>) -> impl IntoView {
	items
		.into_iter()
		.map(|item| {
			view! {
				<tr>
					<td>{item.name}</td>
					<td>{item.row1.to_string()}</td>
					<td>{item.row2.to_string()}</td>
				</tr>
			}
		})
		.collect_view()
}

#[component]
fn BreakdownTable(breakdown: Breakdown) -> impl IntoView {
	view! {
		<div class="breakdown">
			<table class="breakdown-table">
				<tbody>
					<tr class="breakdown-heading">
						<th colspan="3">"Base"</th>
					</tr>
					{cost_rows(breakdown.base)}
					<tr class="breakdown-heading">
						<th colspan="3">"Variable"</th>
					</tr>
					{cost_rows(breakdown.variable)}
				</tbody>
			</table>
		</div>
	}
}
