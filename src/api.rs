//! Service seams and the browser `fetch` client that implements them.
#![allow(async_fn_in_trait)]

use log::debug;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{FormData, Headers, Request, RequestInit, Response};

use crate::aggregator::{CalculationResponse, SectionSelection};
use crate::catalog::RouteCatalog;
use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::fields::{FieldDefinition, FieldRequest};

/// Supplies the node → route topology.
pub trait CatalogService {
	async fn routes(&self) -> Result<RouteCatalog, ApiError>;
}

/// Resolves the field set for a node/location and known inputs.
pub trait FieldService {
	async fn fields(&self, request: &FieldRequest) -> Result<Vec<FieldDefinition>, ApiError>;
}

/// Prices a whole ordered list of sections in one call.
pub trait CalculationService {
	async fn calculate(
		&self,
		sections: &[SectionSelection],
	) -> Result<CalculationResponse, ApiError>;
}

/// Swaps the active cost table.
pub trait TableService {
	/// Whatever the caller hands over as the uploaded file.
	type Upload;

	/// Replace the table; returns the name the table is now known by.
	async fn upload(&self, file: &Self::Upload) -> Result<String, ApiError>;

	async fn load_builtin(&self) -> Result<(), ApiError>;
}

#[derive(Deserialize)]
struct ServerError {
	error: String,
}

/// `fetch`-backed client for the cost service.
#[derive(Clone, Debug, PartialEq)]
pub struct HttpApi {
	config: ApiConfig,
}

impl HttpApi {
	pub fn new(config: ApiConfig) -> Self {
		Self { config }
	}

	pub fn config(&self) -> &ApiConfig {
		&self.config
	}

	async fn send(&self, url: &str, init: &RequestInit) -> Result<String, ApiError> {
		let window = web_sys::window().ok_or(ApiError::Unavailable("window"))?;
		let network = |err: JsValue| ApiError::Network {
			url: url.to_string(),
			message: js_message(&err),
		};

		let request = Request::new_with_str_and_init(url, init).map_err(network)?;
		let response: Response = JsFuture::from(window.fetch_with_request(&request))
			.await
			.map_err(network)?
			.dyn_into()
			.map_err(network)?;
		let body = JsFuture::from(response.text().map_err(network)?)
			.await
			.map_err(network)?
			.as_string()
			.unwrap_or_default();

		if !response.ok() {
			let message = serde_json::from_str::<ServerError>(&body)
				.map(|e| e.error)
				.unwrap_or(body);
			return Err(ApiError::Status {
				url: url.to_string(),
				status: response.status(),
				message,
			});
		}
		debug!("{} answered {} bytes", url, body.len());
		Ok(body)
	}

	async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ApiError> {
		let init = RequestInit::new();
		init.set_method("GET");
		let body = self.send(url, &init).await?;
		decode(url, &body)
	}

	async fn post_json<B: serde::Serialize, T: DeserializeOwned>(
		&self,
		url: &str,
		payload: &B,
	) -> Result<T, ApiError> {
		let json = serde_json::to_string(payload).map_err(|e| ApiError::Decode {
			url: url.to_string(),
			message: e.to_string(),
		})?;
		let headers = Headers::new().map_err(|e| ApiError::Network {
			url: url.to_string(),
			message: js_message(&e),
		})?;
		headers
			.set("Content-Type", "application/json")
			.map_err(|e| ApiError::Network {
				url: url.to_string(),
				message: js_message(&e),
			})?;

		let init = RequestInit::new();
		init.set_method("POST");
		init.set_headers(&headers);
		init.set_body(&JsValue::from_str(&json));
		let body = self.send(url, &init).await?;
		decode(url, &body)
	}

	/// Open the built-in workbook download in a new tab.
	pub fn open_builtin_download(&self) -> Result<(), ApiError> {
		let window = web_sys::window().ok_or(ApiError::Unavailable("window"))?;
		let url = self.config.download_builtin_url();
		window
			.open_with_url_and_target(&url, "_blank")
			.map(|_| ())
			.map_err(|e| ApiError::Network {
				url,
				message: js_message(&e),
			})
	}
}

fn decode<T: DeserializeOwned>(url: &str, body: &str) -> Result<T, ApiError> {
	serde_json::from_str(body).map_err(|e| ApiError::Decode {
		url: url.to_string(),
		message: e.to_string(),
	})
}

fn js_message(value: &JsValue) -> String {
	value
		.as_string()
		.or_else(|| {
			value
				.dyn_ref::<js_sys::Error>()
				.map(|e| String::from(e.message()))
		})
		.unwrap_or_else(|| format!("{value:?}"))
}

impl CatalogService for HttpApi {
	async fn routes(&self) -> Result<RouteCatalog, ApiError> {
		self.get_json(&self.config.routes_url()).await
	}
}

impl FieldService for HttpApi {
	async fn fields(&self, request: &FieldRequest) -> Result<Vec<FieldDefinition>, ApiError> {
		self.post_json(&self.config.fields_url(), request).await
	}
}

impl CalculationService for HttpApi {
	async fn calculate(
		&self,
		sections: &[SectionSelection],
	) -> Result<CalculationResponse, ApiError> {
		self.post_json(&self.config.calculate_url(), &sections).await
	}
}

impl TableService for HttpApi {
	type Upload = web_sys::File;

	async fn upload(&self, file: &web_sys::File) -> Result<String, ApiError> {
		let url = self.config.upload_url();
		let form = FormData::new().map_err(|e| ApiError::Network {
			url: url.clone(),
			message: js_message(&e),
		})?;
		form.append_with_blob_and_filename("file", file, &file.name())
			.map_err(|e| ApiError::Network {
				url: url.clone(),
				message: js_message(&e),
			})?;

		let init = RequestInit::new();
		init.set_method("POST");
		init.set_body(&form);
		self.send(&url, &init).await?;
		Ok(file.name())
	}

	async fn load_builtin(&self) -> Result<(), ApiError> {
		let init = RequestInit::new();
		init.set_method("POST");
		self.send(&self.config.load_builtin_url(), &init).await?;
		Ok(())
	}
}
