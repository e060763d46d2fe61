use leptos::prelude::*;
use leptos::task::spawn_local;
use log::error;

use super::notify;
use crate::aggregator::LogLineKind;
use crate::api::HttpApi;
use crate::error::CalculationError;
use crate::session::{self, Session};

/// Two decimals with thousands separators, e.g. `12,345.60`.
fn format_amount(amount: f64) -> String {
	let fixed = format!("{:.2}", amount.abs());
	let (whole, cents) = fixed.split_once('.').unwrap_or((&fixed, "00"));
	let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
	for (i, digit) in whole.chars().enumerate() {
		if i > 0 && (whole.len() - i) % 3 == 0 {
			grouped.push(',');
		}
		grouped.push(digit);
	}
	let sign = if amount < 0.0 && fixed != "0.00" { "-" } else { "" };
	format!("{sign}{grouped}.{cents}")
}

fn line_class(line: &str) -> &'static str {
	match LogLineKind::classify(line) {
		LogLineKind::Header => "log-line log-header",
		LogLineKind::Warning => "log-line log-warning",
		LogLineKind::Plain => "log-line",
	}
}

/// Calculate button, grand total and the collapsible log panel.
#[component]
pub fn Results(session: RwSignal<Session>, api: HttpApi) -> impl IntoView {
	let running = move || session.with(|s| s.aggregator().is_running());
	let total = move || session.with(|s| s.aggregator().total());
	let logs = move || session.with(|s| s.aggregator().logs().to_vec());
	let logs_visible = move || session.with(|s| s.aggregator().logs_visible());

	let on_calculate = move |_| {
		let api = api.clone();
		spawn_local(async move {
			match session::calculate(&session, &api).await {
				Ok(_) => {}
				Err(err @ (CalculationError::NoSections | CalculationError::InFlight)) => {
					error!("{err}");
				}
				Err(err) => {
					error!("{err}");
					notify("Calculation failed");
				}
			}
		});
	};

	view! {
		<div class="results-area">
			<button
				class="calculate-btn"
				disabled=move || !session.with(Session::can_calculate)
				on:click=on_calculate
			>
				{move || if running() { "Calculating..." } else { "Calculate Total Warehouse Cost" }}
			</button>

			<Show when=move || total().is_some()>
				<div class="total-cost-display glass">
					<span>"Total Estimated Cost: "</span>
					<span class="total-value">
						{move || total().map(format_amount).unwrap_or_default()}
					</span>
				</div>
			</Show>

			<Show when=move || !logs().is_empty()>
				<div class="logs-panel glass">
					<button
						class="logs-toggle"
						on:click=move |_| session.update(|s| s.aggregator_mut().toggle_logs())
					>
						{move || if logs_visible() { "▼ Calculation Log" } else { "▶ Calculation Log" }}
					</button>
					<Show when=logs_visible>
						<pre class="logs-content">
							{move || {
								logs()
									.into_iter()
									.map(|line| view! { <div class=line_class(&line)>{line.clone()}</div> })
									.collect_view()
							}}
						</pre>
					</Show>
				</div>
			</Show>
		</div>
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn amounts_are_grouped_with_two_decimals() {
		assert_eq!(format_amount(0.0), "0.00");
		assert_eq!(format_amount(999.5), "999.50");
		assert_eq!(format_amount(1234.567), "1,234.57");
		assert_eq!(format_amount(1_234_567.0), "1,234,567.00");
		assert_eq!(format_amount(-4200.0), "-4,200.00");
	}

	#[test]
	fn log_lines_get_classes() {
		assert_eq!(line_class("=== Node A ==="), "log-line log-header");
		assert_eq!(line_class("[WARNING] missing rate"), "log-line log-warning");
		assert_eq!(line_class("rate 1.2"), "log-line");
	}
}
