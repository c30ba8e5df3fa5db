//! Inventory resolver: required supplies for a plan and their stock bands.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use cystcare_common::entities::TreatmentLabel;
use cystcare_common::reference::{ReferenceTables, StockEntry};
use cystcare_tables::InventoryTable;

/// Stock above this is available; 1..=LOW_STOCK_LIMIT is low.
pub const LOW_STOCK_LIMIT: u32 = 10;

const TABLE_UNIT: &str = "pieces";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryLine {
    pub item: String,
    pub stock: u32,
    pub unit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl InventoryLine {
    fn new(item: &str, stock: u32, unit: &str, note: Option<&str>) -> Self {
        Self {
            item: item.to_string(),
            stock,
            unit: unit.to_string(),
            note: note.map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InventoryStatus {
    pub available: Vec<InventoryLine>,
    pub low_stock: Vec<InventoryLine>,
    pub out_of_stock: Vec<InventoryLine>,
}

impl InventoryStatus {
    fn push(&mut self, item: &str, stock: u32, unit: &str) {
        match stock {
            0 => self.out_of_stock.push(InventoryLine::new(item, 0, unit, Some("Contact supplier"))),
            s if s <= LOW_STOCK_LIMIT => {
                self.low_stock.push(InventoryLine::new(item, s, unit, Some("Stock running low")))
            }
            s => self.available.push(InventoryLine::new(item, s, unit, None)),
        }
    }

    fn push_missing(&mut self, item: &str) {
        self.out_of_stock
            .push(InventoryLine::new(item, 0, TABLE_UNIT, Some("Item not in inventory")));
    }
}

/// Resolve the supplies for `label`. Read-only; never fails.
///
/// Required items are searched in the inventory table (every match counts),
/// then the standing ward kit for the label is banded the same way, and
/// finally the general supplies are appended to `available`.
pub fn resolve(label: &TreatmentLabel, tables: &ReferenceTables, inventory: &InventoryTable) -> InventoryStatus {
    let mut status = InventoryStatus::default();

    for required in tables.required_items_for(label) {
        let hits = inventory.search(required);
        if hits.is_empty() {
            warn!("Required item `{}` not found in inventory", required);
            status.push_missing(required);
            continue;
        }
        for record in hits {
            status.push(&record.item, record.available_stock, TABLE_UNIT);
        }
    }

    for StockEntry { item, stock, unit } in tables.standing_stock_for(label) {
        status.push(item, *stock, unit);
    }

    status.available.extend(
        tables
            .general_supplies
            .iter()
            .map(|s| InventoryLine::new(&s.item, s.stock, &s.unit, None)),
    );

    debug!(
        available = status.available.len(),
        low = status.low_stock.len(),
        out = status.out_of_stock.len(),
        "Inventory resolved for {}",
        label
    );
    status
}
