//! Error types for every failure the planner can surface.
//!
//! Transport failures are captured once as [`ApiError`]; each user-facing
//! category wraps it so the UI can decide whether to log or alert.

use thiserror::Error;

/// Failure talking to the cost service.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
	/// The browser API needed for the request is unavailable.
	#[error("browser API unavailable: {0}")]
	Unavailable(&'static str),
	/// The request never produced a response.
	#[error("network request to {url} failed: {message}")]
	Network { url: String, message: String },
	/// The service answered with a non-success status.
	#[error("{url} returned HTTP {status}: {message}")]
	Status {
		url: String,
		status: u16,
		message: String,
	},
	/// The body could not be decoded into the expected shape.
	#[error("malformed response from {url}: {message}")]
	Decode { url: String, message: String },
}

/// The route catalog could not be fetched. The catalog is emptied.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("failed to load route catalog")]
pub struct CatalogFetchError(#[from] pub ApiError);

/// The field service rejected or failed a resolution request.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("failed to resolve fields for {node} / {location}")]
pub struct ResolutionError {
	/// Node the request was made for.
	pub node: String,
	/// Location the request was made for.
	pub location: String,
	/// Underlying transport failure.
	#[source]
	pub source: ApiError,
}

/// The calculation request failed. No section was touched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalculationError {
	/// There is nothing to calculate.
	#[error("no sections to calculate")]
	NoSections,
	/// A calculation is already in flight.
	#[error("a calculation is already running")]
	InFlight,
	/// The service call failed.
	#[error("calculation failed")]
	Service(#[from] ApiError),
}

/// Uploading or restoring a cost table failed.
///
/// `NoFile` and `Service` leave everything as it was. `Reload` means the
/// table did swap and the old state is gone, but the new catalog is empty.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationSwapError {
	/// No file was chosen.
	#[error("no file selected")]
	NoFile,
	/// The service refused the table.
	#[error("failed to swap cost table")]
	Service(#[from] ApiError),
	/// The table swapped but its route catalog did not load.
	#[error("cost table swapped but its routes could not be loaded")]
	Reload(#[from] CatalogFetchError),
}

/// Persisting layout overrides failed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LayoutStoreError {
	/// `localStorage` is not reachable in this context.
	#[error("local storage unavailable")]
	Unavailable,
	/// The storage call threw.
	#[error("local storage rejected {key}")]
	Write { key: String },
	/// Stored JSON did not decode.
	#[error("stored layout under {key} is corrupt: {message}")]
	Corrupt { key: String, message: String },
}
