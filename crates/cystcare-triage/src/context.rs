//! Immutable serving context and the handle that swaps it.

use parking_lot::RwLock;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use cystcare_common::error::{CareError, Result};
use cystcare_common::reference::ReferenceTables;
use cystcare_model::ModelBundle;
use cystcare_tables::{ChargesTable, InventoryTable};

/// Model bundle plus every table a request reads. Built once, never mutated.
#[derive(Debug)]
pub struct CareContext {
    bundle: ModelBundle,
    tables: ReferenceTables,
    inventory: InventoryTable,
    charges: ChargesTable,
}

/// Where a context is loaded from.
#[derive(Debug, Clone)]
pub struct ContextSources {
    pub bundle: PathBuf,
    pub inventory_csv: PathBuf,
    pub charges_csv: PathBuf,
    /// YAML override of the built-in reference tables
    pub reference_tables: Option<PathBuf>,
}

impl CareContext {
    /// Validate the reference tables and index the collaborators for the
    /// fragments they name.
    pub fn build(
        bundle: ModelBundle,
        tables: ReferenceTables,
        inventory: InventoryTable,
        charges: ChargesTable,
    ) -> Result<Self> {
        tables.validate()?;
        let inventory = inventory.with_index(tables.all_required_items());
        let charges = charges.with_index(tables.all_service_fragments());

        info!(
            "Care context ready: bundle {} ({} inventory items, {} charges)",
            bundle.version(),
            inventory.len(),
            charges.len()
        );
        Ok(Self { bundle, tables, inventory, charges })
    }

    pub fn load(sources: &ContextSources) -> Result<Self> {
        let bundle = ModelBundle::load(&sources.bundle)?;
        let tables = match &sources.reference_tables {
            Some(path) => {
                info!("Loading reference tables from {:?}", path);
                ReferenceTables::from_yaml(path)?
            }
            None => ReferenceTables::default(),
        };
        let inventory = InventoryTable::from_csv(&sources.inventory_csv)?;
        let charges = ChargesTable::from_csv(&sources.charges_csv)?;
        Self::build(bundle, tables, inventory, charges)
    }

    pub fn bundle(&self) -> &ModelBundle {
        &self.bundle
    }

    pub fn tables(&self) -> &ReferenceTables {
        &self.tables
    }

    pub fn inventory(&self) -> &InventoryTable {
        &self.inventory
    }

    pub fn charges(&self) -> &ChargesTable {
        &self.charges
    }
}

/// Shared slot for the live context. Readers take an `Arc` snapshot and keep
/// using it for the whole request; `install` replaces the context as a unit.
#[derive(Debug, Default)]
pub struct ContextHandle {
    slot: RwLock<Option<Arc<CareContext>>>,
}

impl ContextHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_context(context: CareContext) -> Self {
        Self { slot: RwLock::new(Some(Arc::new(context))) }
    }

    /// Swap in a new context; returns the one it replaced.
    pub fn install(&self, context: CareContext) -> Option<Arc<CareContext>> {
        let version = context.bundle().version().to_string();
        let previous = self.slot.write().replace(Arc::new(context));
        info!("Installed care context with bundle {}", version);
        previous
    }

    pub fn current(&self) -> Result<Arc<CareContext>> {
        self.slot
            .read()
            .clone()
            .ok_or_else(|| CareError::ModelUnavailable("no model bundle is installed".to_string()))
    }

    pub fn is_installed(&self) -> bool {
        self.slot.read().is_some()
    }
}
