//! In-memory service fakes for driver tests.
#![allow(missing_docs)]

use std::cell::{Cell, RefCell};

use indexmap::IndexMap;

use crate::aggregator::{CalculationResponse, SectionSelection};
use crate::api::{CalculationService, CatalogService, FieldService, TableService};
use crate::catalog::RouteCatalog;
use crate::config::StorageKeys;
use crate::error::{ApiError, LayoutStoreError};
use crate::fields::{FieldDefinition, FieldRequest};
use crate::layout::{LayoutOverrides, LayoutStore};
use crate::layout::overrides::{decode, encode};

fn refused(url: &str) -> ApiError {
	ApiError::Status {
		url: url.into(),
		status: 500,
		message: "refused".into(),
	}
}

/// Records every request and answers from canned data.
#[derive(Default)]
pub struct FakeBackend {
	pub catalog: RefCell<RouteCatalog>,
	pub fields: RefCell<Vec<FieldDefinition>>,
	pub calculation: RefCell<Option<CalculationResponse>>,
	pub fail_catalog: Cell<bool>,
	pub fail_fields: Cell<bool>,
	pub fail_tables: Cell<bool>,
	pub field_requests: RefCell<Vec<FieldRequest>>,
	pub calculation_requests: RefCell<Vec<Vec<SectionSelection>>>,
}

impl FakeBackend {
	pub fn with_catalog(catalog: RouteCatalog) -> Self {
		Self {
			catalog: RefCell::new(catalog),
			..Self::default()
		}
	}

	pub fn respond_with(&self, fields: Vec<FieldDefinition>) {
		*self.fields.borrow_mut() = fields;
	}
}

impl CatalogService for FakeBackend {
	async fn routes(&self) -> Result<RouteCatalog, ApiError> {
		if self.fail_catalog.get() {
			return Err(refused("/routes"));
		}
		Ok(self.catalog.borrow().clone())
	}
}

impl FieldService for FakeBackend {
	async fn fields(&self, request: &FieldRequest) -> Result<Vec<FieldDefinition>, ApiError> {
		self.field_requests.borrow_mut().push(request.clone());
		if self.fail_fields.get() {
			return Err(refused("/fields"));
		}
		Ok(self.fields.borrow().clone())
	}
}

impl CalculationService for FakeBackend {
	async fn calculate(
		&self,
		sections: &[SectionSelection],
	) -> Result<CalculationResponse, ApiError> {
		self.calculation_requests.borrow_mut().push(sections.to_vec());
		self.calculation.borrow().clone().ok_or_else(|| refused("/calculate"))
	}
}

impl TableService for FakeBackend {
	type Upload = String;

	async fn upload(&self, file: &String) -> Result<String, ApiError> {
		if self.fail_tables.get() {
			return Err(refused("/upload"));
		}
		Ok(file.clone())
	}

	async fn load_builtin(&self) -> Result<(), ApiError> {
		if self.fail_tables.get() {
			return Err(refused("/load-builtin"));
		}
		Ok(())
	}
}

/// In-process store with the same encoding as [`crate::layout::LocalLayoutStore`].
#[derive(Debug, Default)]
pub struct MemoryLayoutStore {
	keys: StorageKeys,
	items: RefCell<IndexMap<String, String>>,
}

impl MemoryLayoutStore {
	pub fn raw(&self, key: &str) -> Option<String> {
		self.items.borrow().get(key).cloned()
	}

	pub fn insert_raw(&self, key: &str, value: &str) {
		self.items.borrow_mut().insert(key.to_string(), value.to_string());
	}
}

impl LayoutStore for MemoryLayoutStore {
	fn load(&self) -> Result<LayoutOverrides, LayoutStoreError> {
		let keys = &self.keys;
		Ok(LayoutOverrides {
			positions: decode(&keys.positions, self.raw(&keys.positions))?,
			labels: decode(&keys.labels, self.raw(&keys.labels))?,
		})
	}

	fn save(&self, overrides: &LayoutOverrides) -> Result<(), LayoutStoreError> {
		let keys = &self.keys;
		self.insert_raw(&keys.positions, &encode(&keys.positions, &overrides.positions)?);
		self.insert_raw(&keys.labels, &encode(&keys.labels, &overrides.labels)?);
		Ok(())
	}

	fn clear(&self) -> Result<(), LayoutStoreError> {
		self.items.borrow_mut().clear();
		Ok(())
	}
}
