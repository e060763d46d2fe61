//! Process-wide planner state and the async drivers behind every user
//! action.
//!
//! Drivers never hold the state across an `await`: they take a ticket, call
//! the service, then feed the answer back through [`SessionCell`]. That keeps
//! the interaction thread free and lets the same code run against a Leptos
//! signal or a plain `RefCell` in tests.

use std::cell::RefCell;

use leptos::prelude::{RwSignal, Update, With};
use log::{error, info, warn};

use crate::aggregator::Aggregator;
use crate::api::{CalculationService, CatalogService, FieldService, TableService};
use crate::catalog::RouteCatalog;
use crate::error::{CatalogFetchError, CalculationError, ConfigurationSwapError, ResolutionError};
use crate::fields::FieldResolver;
use crate::sections::{ApplyOutcome, ResolveTicket, SectionId, SectionStore};

/// Name shown for the cost table shipped with the service.
pub const BUILTIN_TABLE: &str = "Built-in Template";

/// Which cost table is active and what the last swap said.
#[derive(Clone, Debug, PartialEq)]
pub struct CostTable {
	pub name: String,
	pub message: Option<String>,
}

impl Default for CostTable {
	fn default() -> Self {
		Self {
			name: BUILTIN_TABLE.into(),
			message: None,
		}
	}
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Session {
	catalog: RouteCatalog,
	sections: SectionStore,
	aggregator: Aggregator,
	table: CostTable,
}

impl Session {
	pub fn catalog(&self) -> &RouteCatalog {
		&self.catalog
	}

	pub fn sections(&self) -> &SectionStore {
		&self.sections
	}

	pub fn aggregator(&self) -> &Aggregator {
		&self.aggregator
	}

	pub fn aggregator_mut(&mut self) -> &mut Aggregator {
		&mut self.aggregator
	}

	pub fn table(&self) -> &CostTable {
		&self.table
	}

	pub fn add_section(&mut self) -> SectionId {
		self.sections.add()
	}

	pub fn remove_section(&mut self, id: SectionId) -> bool {
		self.sections.remove(id)
	}

	pub fn can_calculate(&self) -> bool {
		!self.sections.is_empty() && !self.aggregator.is_running()
	}

	/// Replace the catalog; a failed fetch leaves it empty, never stale.
	pub fn set_catalog(&mut self, catalog: Result<RouteCatalog, &CatalogFetchError>) {
		self.catalog = match catalog {
			Ok(catalog) => {
				info!("Loaded route catalog with {} nodes", catalog.len());
				catalog
			}
			Err(err) => {
				error!("{err}: {}", err.0);
				RouteCatalog::default()
			}
		};
	}

	/// A new cost table is active: everything derived from the old one goes.
	pub fn table_swapped(&mut self, name: String, message: String) {
		self.sections.clear();
		self.aggregator.reset();
		self.catalog = RouteCatalog::default();
		self.table = CostTable {
			name,
			message: Some(message),
		};
	}

	/// Drop the swap message, unless a later swap already replaced it.
	pub fn dismiss_table_message(&mut self, message: &str) {
		if self.table.message.as_deref() == Some(message) {
			self.table.message = None;
		}
	}

	fn select_node(&mut self, id: SectionId, node: Option<&str>) -> Option<ResolveTicket> {
		self.sections.select_node(&self.catalog, id, node)
	}

	fn select_location(&mut self, id: SectionId, location: Option<&str>) -> Option<ResolveTicket> {
		self.sections.select_location(&self.catalog, id, location)
	}
}

/// Shared handle to a [`Session`].
pub trait SessionCell {
	/// Run `f` against the session; `None` if the session is gone.
	fn update<R>(&self, f: impl FnOnce(&mut Session) -> R) -> Option<R>;
	fn read<R>(&self, f: impl FnOnce(&Session) -> R) -> Option<R>;
}

impl SessionCell for RefCell<Session> {
	fn update<R>(&self, f: impl FnOnce(&mut Session) -> R) -> Option<R> {
		Some(f(&mut self.borrow_mut()))
	}

	fn read<R>(&self, f: impl FnOnce(&Session) -> R) -> Option<R> {
		Some(f(&self.borrow()))
	}
}

impl SessionCell for RwSignal<Session> {
	fn update<R>(&self, f: impl FnOnce(&mut Session) -> R) -> Option<R> {
		self.try_update(f)
	}

	fn read<R>(&self, f: impl FnOnce(&Session) -> R) -> Option<R> {
		self.try_with(f)
	}
}

/// Fetch the catalog. On failure the catalog is emptied.
pub async fn load_catalog<C, S>(cell: &C, service: &S) -> Result<(), CatalogFetchError>
where
	C: SessionCell,
	S: CatalogService,
{
	match service.routes().await {
		Ok(catalog) => {
			cell.update(|s| s.set_catalog(Ok(catalog)));
			Ok(())
		}
		Err(err) => {
			let err = CatalogFetchError(err);
			cell.update(|s| s.set_catalog(Err(&err)));
			Err(err)
		}
	}
}

async fn resolve<C, S>(cell: &C, service: &S, ticket: ResolveTicket) -> Result<(), ResolutionError>
where
	C: SessionCell,
	S: FieldService,
{
	info!(
		"Resolving {} after {:?} (token {})",
		ticket.section, ticket.trigger, ticket.token
	);
	let fields = FieldResolver::new(service).resolve(&ticket.request).await?;
	let outcome = cell.update(|s| s.sections.apply_resolution(&ticket, fields));
	if outcome == Some(ApplyOutcome::Stale) {
		info!("Ignored out-of-date fields for {}", ticket.section);
	}
	Ok(())
}

pub async fn select_node<C, S>(
	cell: &C,
	service: &S,
	id: SectionId,
	node: Option<String>,
) -> Result<(), ResolutionError>
where
	C: SessionCell,
	S: FieldService,
{
	match cell.update(|s| s.select_node(id, node.as_deref())).flatten() {
		Some(ticket) => resolve(cell, service, ticket).await,
		None => Ok(()),
	}
}

pub async fn select_location<C, S>(
	cell: &C,
	service: &S,
	id: SectionId,
	location: Option<String>,
) -> Result<(), ResolutionError>
where
	C: SessionCell,
	S: FieldService,
{
	match cell
		.update(|s| s.select_location(id, location.as_deref()))
		.flatten()
	{
		Some(ticket) => resolve(cell, service, ticket).await,
		None => Ok(()),
	}
}

/// Store a raw field value; a changed select value re-resolves.
pub async fn set_input<C, S>(
	cell: &C,
	service: &S,
	id: SectionId,
	field: String,
	value: String,
) -> Result<(), ResolutionError>
where
	C: SessionCell,
	S: FieldService,
{
	match cell
		.update(|s| s.sections.set_input(id, &field, &value))
		.flatten()
	{
		Some(ticket) => resolve(cell, service, ticket).await,
		None => Ok(()),
	}
}

/// Price every section in one request. Returns the new total.
pub async fn calculate<C, S>(cell: &C, service: &S) -> Result<f64, CalculationError>
where
	C: SessionCell,
	S: CalculationService,
{
	let ticket = cell
		.update(|s| s.aggregator.begin(&s.sections))
		.ok_or(CalculationError::NoSections)??;
	match service.calculate(&ticket.request).await {
		Ok(response) => {
			let total = response.total_cost;
			cell.update(|s| s.aggregator.complete(&ticket, response, &mut s.sections));
			Ok(total)
		}
		Err(err) => {
			warn!("Calculation failed: {err}");
			cell.update(|s| s.aggregator.fail(&ticket));
			Err(err.into())
		}
	}
}

/// Upload a replacement cost table, then start over from a fresh catalog.
pub async fn upload_table<C, S>(
	cell: &C,
	service: &S,
	file: Option<&S::Upload>,
) -> Result<(), ConfigurationSwapError>
where
	C: SessionCell,
	S: TableService + CatalogService,
{
	let file = file.ok_or(ConfigurationSwapError::NoFile)?;
	let name = service.upload(file).await?;
	info!("Cost table {name} uploaded");
	let message = format!("Loaded custom table: {name}");
	cell.update(|s| s.table_swapped(name, message));
	load_catalog(cell, service).await?;
	Ok(())
}

/// Switch back to the built-in cost table.
pub async fn restore_builtin<C, S>(cell: &C, service: &S) -> Result<(), ConfigurationSwapError>
where
	C: SessionCell,
	S: TableService + CatalogService,
{
	service.load_builtin().await?;
	info!("Built-in cost table restored");
	cell.update(|s| s.table_swapped(BUILTIN_TABLE.into(), "Loaded built-in template".into()));
	load_catalog(cell, service).await?;
	Ok(())
}
