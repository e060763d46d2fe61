use indexmap::IndexMap;
use log::debug;
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::Position;
use crate::config::StorageKeys;
use crate::error::LayoutStoreError;

/// User-authored positions and labels, keyed by location id.
///
/// Independent of the catalog: entries for locations that disappear are
/// kept and apply again if the location comes back.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LayoutOverrides {
	pub(crate) positions: IndexMap<String, Position>,
	pub(crate) labels: IndexMap<String, String>,
}

impl LayoutOverrides {
	pub fn position(&self, id: &str) -> Option<Position> {
		self.positions.get(id).copied()
	}

	pub fn label(&self, id: &str) -> Option<&str> {
		self.labels.get(id).map(String::as_str)
	}

	pub fn set_position(&mut self, id: &str, position: Position) {
		self.positions.insert(id.to_string(), position);
	}

	/// A blank label removes the override.
	pub fn set_label(&mut self, id: &str, label: &str) {
		let label = label.trim();
		if label.is_empty() {
			self.labels.shift_remove(id);
		} else {
			self.labels.insert(id.to_string(), label.to_string());
		}
	}

	pub fn is_empty(&self) -> bool {
		self.positions.is_empty() && self.labels.is_empty()
	}

	pub fn clear(&mut self) {
		self.positions.clear();
		self.labels.clear();
	}
}

/// Where overrides live between sessions.
pub trait LayoutStore {
	fn load(&self) -> Result<LayoutOverrides, LayoutStoreError>;
	fn save(&self, overrides: &LayoutOverrides) -> Result<(), LayoutStoreError>;
	fn clear(&self) -> Result<(), LayoutStoreError>;
}

pub(crate) fn encode<T: Serialize>(key: &str, value: &T) -> Result<String, LayoutStoreError> {
	serde_json::to_string(value).map_err(|e| LayoutStoreError::Corrupt {
		key: key.to_string(),
		message: e.to_string(),
	})
}

pub(crate) fn decode<T: DeserializeOwned + Default>(
	key: &str,
	raw: Option<String>,
) -> Result<T, LayoutStoreError> {
	match raw {
		None => Ok(T::default()),
		Some(raw) => serde_json::from_str(&raw).map_err(|e| LayoutStoreError::Corrupt {
			key: key.to_string(),
			message: e.to_string(),
		}),
	}
}

/// Browser `localStorage` under two stable keys.
#[derive(Clone, Debug, Default)]
pub struct LocalLayoutStore {
	keys: StorageKeys,
}

impl LocalLayoutStore {
	pub fn new(keys: StorageKeys) -> Self {
		Self { keys }
	}

	fn storage(&self) -> Result<web_sys::Storage, LayoutStoreError> {
		web_sys::window()
			.and_then(|w| w.local_storage().ok().flatten())
			.ok_or(LayoutStoreError::Unavailable)
	}

	fn get(&self, storage: &web_sys::Storage, key: &str) -> Option<String> {
		storage.get_item(key).ok().flatten()
	}

	fn set(&self, storage: &web_sys::Storage, key: &str, value: &str) -> Result<(), LayoutStoreError> {
		storage.set_item(key, value).map_err(|_| LayoutStoreError::Write {
			key: key.to_string(),
		})
	}
}

impl LayoutStore for LocalLayoutStore {
	fn load(&self) -> Result<LayoutOverrides, LayoutStoreError> {
		let storage = self.storage()?;
		let keys = &self.keys;
		Ok(LayoutOverrides {
			positions: decode(&keys.positions, self.get(&storage, &keys.positions))?,
			labels: decode(&keys.labels, self.get(&storage, &keys.labels))?,
		})
	}

	fn save(&self, overrides: &LayoutOverrides) -> Result<(), LayoutStoreError> {
		let storage = self.storage()?;
		let keys = &self.keys;
		self.set(&storage, &keys.positions, &encode(&keys.positions, &overrides.positions)?)?;
		self.set(&storage, &keys.labels, &encode(&keys.labels, &overrides.labels)?)?;
		debug!("Saved {} position overrides", overrides.positions.len());
		Ok(())
	}

	fn clear(&self) -> Result<(), LayoutStoreError> {
		let storage = self.storage()?;
		for key in [&self.keys.positions, &self.keys.labels] {
			storage
				.remove_item(key)
				.map_err(|_| LayoutStoreError::Write { key: key.clone() })?;
		}
		Ok(())
	}
}
