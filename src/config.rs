//! Runtime configuration: service endpoints, layout geometry and the
//! storage keys used for persisted map overrides.

/// Fallback origin when no browser window is available.
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";

/// Where the cost service lives.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiConfig {
	/// Scheme, host and port, without a trailing slash.
	pub base_url: String,
	/// Path prefix shared by every endpoint.
	pub prefix: String,
}

impl Default for ApiConfig {
	fn default() -> Self {
		Self {
			base_url: DEFAULT_BASE_URL.into(),
			prefix: "/api/wh".into(),
		}
	}
}

impl ApiConfig {
	/// Use the page's own origin so the app works behind any host.
	pub fn from_window() -> Self {
		let base_url = web_sys::window()
			.and_then(|w| w.location().origin().ok())
			.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
		Self {
			base_url,
			..Self::default()
		}
	}

	fn endpoint(&self, name: &str) -> String {
		format!(
			"{}{}/{}",
			self.base_url.trim_end_matches('/'),
			self.prefix,
			name
		)
	}

	pub fn routes_url(&self) -> String {
		self.endpoint("routes")
	}

	pub fn fields_url(&self) -> String {
		self.endpoint("fields")
	}

	pub fn calculate_url(&self) -> String {
		self.endpoint("calculate")
	}

	pub fn upload_url(&self) -> String {
		self.endpoint("upload")
	}

	pub fn load_builtin_url(&self) -> String {
		self.endpoint("load-builtin")
	}

	pub fn download_builtin_url(&self) -> String {
		self.endpoint("download-builtin")
	}
}

/// Geometry of the route map, in view-box units.
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutConfig {
	/// x of the source column.
	pub left_x: f64,
	/// x of the sink column.
	pub right_x: f64,
	/// y of the first box in each column.
	pub start_y: f64,
	/// Vertical step between consecutive boxes.
	pub base_spacing: f64,
	/// Extra step for each edge beyond the first touching a box.
	pub extra_spacing_per_edge: f64,
	/// Space below the lowest box.
	pub bottom_padding: f64,
	/// Smallest canvas height ever produced.
	pub min_canvas_height: f64,
	/// Logical width of the view box.
	pub canvas_width: f64,
	pub box_width: f64,
	pub box_height: f64,
	/// Lateral distance between fanned-out sibling edges.
	pub fan_spacing: f64,
	/// Pull-in of the edge start from the source centre (x, y).
	pub source_padding: (f64, f64),
	/// Pull-in of the edge end from the target centre (x, y).
	pub target_padding: (f64, f64),
	/// Distance of an edge label above its midpoint.
	pub label_lift: f64,
}

impl Default for LayoutConfig {
	fn default() -> Self {
		Self {
			left_x: 200.0,
			right_x: 800.0,
			start_y: 80.0,
			base_spacing: 100.0,
			extra_spacing_per_edge: 40.0,
			bottom_padding: 100.0,
			min_canvas_height: 400.0,
			canvas_width: 1000.0,
			box_width: 120.0,
			box_height: 50.0,
			fan_spacing: 18.0,
			source_padding: (60.0, 30.0),
			target_padding: (70.0, 35.0),
			label_lift: 10.0,
		}
	}
}

/// `localStorage` keys for persisted overrides.
#[derive(Clone, Debug, PartialEq)]
pub struct StorageKeys {
	pub positions: String,
	pub labels: String,
}

impl Default for StorageKeys {
	fn default() -> Self {
		Self {
			positions: "wh-map-positions".into(),
			labels: "wh-map-labels".into(),
		}
	}
}

/// Everything the component tree needs, provided as context.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AppConfig {
	pub api: ApiConfig,
	pub layout: LayoutConfig,
	pub storage: StorageKeys,
}

impl AppConfig {
	/// Configuration for the running page.
	pub fn for_browser() -> Self {
		Self {
			api: ApiConfig::from_window(),
			..Self::default()
		}
	}
}
