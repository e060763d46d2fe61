mod controls;
mod results;
pub mod route_map;
mod section_card;

use log::warn;

pub use controls::Controls;
pub use results::Results;
pub use route_map::RouteMap;
pub use section_card::SectionCard;

/// Blocking user notice.
pub fn notify(message: &str) {
	let shown = web_sys::window().map(|w| w.alert_with_message(message).is_ok());
	if shown != Some(true) {
		warn!("Could not show notice: {message}");
	}
}
