use std::time::Duration;

use leptos::leptos_dom::helpers::{TimeoutHandle, set_timeout_with_handle};
use leptos::prelude::*;
use leptos::task::spawn_local;
use log::{error, warn};
use web_sys::{Event, File};

use super::notify;
use crate::api::HttpApi;
use crate::error::ConfigurationSwapError;
use crate::session::{self, Session};

const MESSAGE_TIMEOUT: Duration = Duration::from_secs(5);

/// Hide the swap message after a while. A newer swap restarts the timer.
fn schedule_dismiss(session: RwSignal<Session>, timer: StoredValue<Option<TimeoutHandle>>) {
	let Some(message) = session.with_untracked(|s| s.table().message.clone()) else {
		return;
	};
	if let Some(previous) = timer.get_value() {
		previous.clear();
	}
	let handle = set_timeout_with_handle(
		move || session.update(|s| s.dismiss_table_message(&message)),
		MESSAGE_TIMEOUT,
	);
	match handle {
		Ok(handle) => timer.set_value(Some(handle)),
		Err(err) => warn!("Could not schedule message dismissal: {err:?}"),
	}
}

fn report(
	session: RwSignal<Session>,
	timer: StoredValue<Option<TimeoutHandle>>,
	result: Result<(), ConfigurationSwapError>,
	failure: &str,
) {
	match result {
		Ok(()) => schedule_dismiss(session, timer),
		Err(ConfigurationSwapError::NoFile) => {}
		Err(err @ ConfigurationSwapError::Reload(_)) => {
			error!("{err}");
			schedule_dismiss(session, timer);
			notify("The cost table was loaded, but its routes could not be fetched");
		}
		Err(err) => {
			error!("{err}");
			if let ConfigurationSwapError::Service(source) = &err {
				error!("{source}");
			}
			notify(failure);
		}
	}
}

/// Cost table switcher: upload a workbook, restore or download the built-in one.
#[component]
pub fn Controls(session: RwSignal<Session>, api: HttpApi) -> impl IntoView {
	let file_input = NodeRef::<leptos::html::Input>::new();
	let timer = StoredValue::new(None::<TimeoutHandle>);
	let table_name = move || session.with(|s| s.table().name.clone());
	let message = move || session.with(|s| s.table().message.clone());

	let upload_api = api.clone();
	let on_file = move |_: Event| {
		let Some(input) = file_input.get() else {
			return;
		};
		let file: Option<File> = input.files().and_then(|files| files.get(0));
		// Let the same file be chosen again later.
		input.set_value("");
		let api = upload_api.clone();
		spawn_local(async move {
			let result = session::upload_table(&session, &api, file.as_ref()).await;
			report(session, timer, result, "Error uploading file");
		});
	};

	let restore_api = api.clone();
	let on_restore = move |_| {
		let api = restore_api.clone();
		spawn_local(async move {
			let result = session::restore_builtin(&session, &api).await;
			report(session, timer, result, "Error loading built-in template");
		});
	};

	let on_download = move |_| {
		if let Err(err) = api.open_builtin_download() {
			error!("{err}");
			notify("Could not open the template download");
		}
	};

	view! {
		<div class="config-controls glass">
			<input
				type="file"
				accept=".xlsx,.xls"
				style="display: none"
				node_ref=file_input
				on:change=on_file
			/>
			<button
				class="control-btn"
				on:click=move |_| {
					if let Some(input) = file_input.get() {
						input.click();
					}
				}
			>
				"Upload Excel"
			</button>
			<button class="control-btn" on:click=on_restore>"Restore Built-in"</button>
			<button class="control-btn" on:click=on_download>"Download Template"</button>
			<span class="current-file">"Current: " {table_name}</span>
			{move || message().map(|m| view! { <span class="upload-message">{m}</span> })}
		</div>
	}
}
