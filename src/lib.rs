//! Warehouse route cost planner: a Leptos client-side app for assembling
//! multi-stage warehouse cost estimates over a route map.

use leptos::prelude::*;
use leptos_meta::*;
use leptos_router::components::*;
use leptos_router::path;
use log::{Level, info};

pub mod aggregator;
pub mod api;
pub mod catalog;
pub mod config;
pub mod error;
pub mod fields;
pub mod layout;
pub mod sections;
pub mod session;

mod components;
mod pages;

#[cfg(test)]
mod testing;

use crate::config::AppConfig;
use crate::pages::home::Home;
use crate::pages::not_found::NotFound;

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("Logging initialized");
}

/// An app router which renders the planner and handles 404's
#[component]
pub fn App() -> impl IntoView {
	provide_meta_context();
	provide_context(AppConfig::for_browser());

	view! {
		<Html attr:lang="en" attr:dir="ltr" attr:data-theme="dark" />

		<Title text="Warehouse Cost Planner" />

		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<Router>
			<Routes fallback=|| view! { <NotFound /> }>
				<Route path=path!("/") view=Home />
				<Route path=path!("/warehouse-calculator") view=Home />
			</Routes>
		</Router>
	}
}
