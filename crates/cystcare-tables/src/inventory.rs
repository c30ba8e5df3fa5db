//! Ward and pharmacy inventory.

use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

use cystcare_common::error::Result;

use crate::index::{FragmentIndex, MatchMode};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryRecord {
    #[serde(rename = "Item", alias = "item")]
    pub item: String,
    #[serde(rename = "Available Stock", alias = "available_stock")]
    pub available_stock: u32,
}

#[derive(Debug, Clone)]
pub struct InventoryTable {
    records: Vec<InventoryRecord>,
    index: FragmentIndex,
}

impl InventoryTable {
    pub fn new(records: Vec<InventoryRecord>) -> Self {
        Self {
            records,
            index: FragmentIndex::empty(MatchMode::CaseInsensitive),
        }
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let records = csv
            .deserialize()
            .collect::<std::result::Result<Vec<InventoryRecord>, _>>()?;
        Ok(Self::new(records))
    }

    pub fn from_csv(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading inventory from {:?}", path);
        let file = std::fs::File::open(path)?;
        let table = Self::from_reader(file)?;
        info!("Loaded {} inventory records", table.len());
        Ok(table)
    }

    /// Index the supply names that will be searched.
    pub fn with_index<'a>(mut self, fragments: impl IntoIterator<Item = &'a str>) -> Self {
        self.index = FragmentIndex::build(
            MatchMode::CaseInsensitive,
            fragments,
            self.records.iter().map(|r| r.item.as_str()),
        );
        self
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[InventoryRecord] {
        &self.records
    }

    /// Every record whose item name contains `fragment`, ignoring case,
    /// in table order.
    pub fn search(&self, fragment: &str) -> Vec<&InventoryRecord> {
        match self.index.get(fragment) {
            Some(positions) => positions.iter().filter_map(|&i| self.records.get(i)).collect(),
            None => self
                .records
                .iter()
                .filter(|r| MatchMode::CaseInsensitive.contains(&r.item, fragment))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const CSV: &str = "\
Item,Available Stock
Speculum (Graves),25
Speculum (Pederson),4
Laparoscope,0
Examination Gloves,300
";

    #[test]
    fn test_search_returns_all_matches_ignoring_case() {
        let table = InventoryTable::from_reader(CSV.as_bytes()).unwrap();
        let hits: Vec<&str> = table.search("SPECULUM").iter().map(|r| r.item.as_str()).collect();
        assert_eq!(hits, vec!["Speculum (Graves)", "Speculum (Pederson)"]);
        assert!(table.search("Anesthesia supplies").is_empty());
    }

    #[test]
    fn test_indexed_search_matches_scan() {
        let scanned = InventoryTable::from_reader(CSV.as_bytes()).unwrap();
        let indexed = scanned.clone().with_index(["Speculum", "Laparoscope", "Ultrasound gel"]);
        for fragment in ["Speculum", "laparoscope", "Ultrasound gel", "gloves"] {
            assert_eq!(indexed.search(fragment), scanned.search(fragment));
        }
    }

    #[test]
    fn test_zero_stock_is_kept() {
        let table = InventoryTable::from_reader(CSV.as_bytes()).unwrap();
        assert_eq!(table.search("Laparoscope")[0].available_stock, 0);
    }

    #[test]
    fn test_negative_stock_is_a_load_error() {
        let csv = "Item,Available Stock\nGauze,-3\n";
        assert!(InventoryTable::from_reader(csv.as_bytes()).is_err());
    }
}
