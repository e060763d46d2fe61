use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::api::HttpApi;
use crate::components::{Controls, Results, RouteMap, SectionCard};
use crate::config::AppConfig;
use crate::layout::{LayoutEngine, LocalLayoutStore, MapEditor};
use crate::session::{self, Session};

/// The cost planner: route map on top, calculation sections below.
#[component]
pub fn Home() -> impl IntoView {
	let config = use_context::<AppConfig>().unwrap_or_default();
	let api = HttpApi::new(config.api.clone());
	let session = RwSignal::new(Session::default());
	let store = LocalLayoutStore::new(config.storage.clone());
	let editor = RwSignal::new(MapEditor::load(&store));

	let engine = LayoutEngine::new(config.layout.clone());
	let layout = Memo::new(move |_| {
		session.with(|s| editor.with(|e| engine.layout(s.catalog(), e.overrides())))
	});
	let active_nodes = Memo::new(move |_| session.with(|s| s.sections().active_nodes()));

	{
		let api = api.clone();
		spawn_local(async move {
			// Failures are logged and leave an empty catalog.
			let _ = session::load_catalog(&session, &api).await;
		});
	}

	let card_api = api.clone();

	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>
			<div class="wh-calculator">
				<header class="planner-header">
					<h1>"Warehouse Cost Planner"</h1>
					<Controls session api=api.clone() />
				</header>

				<RouteMap layout active_nodes editor store config=config.layout.clone() />

				<div class="route-flow">
					<For
						each=move || session.with(|s| s.sections().ids())
						key=|id| *id
						children=move |id| view! { <SectionCard id session api=card_api.clone() /> }
					/>
					<button
						class="add-node-btn glass"
						on:click=move |_| {
							session.update(|s| {
								s.add_section();
							});
						}
					>
						"Add Calculation Section"
					</button>
				</div>

				<Results session api />
			</div>
		</ErrorBoundary>
	}
}
