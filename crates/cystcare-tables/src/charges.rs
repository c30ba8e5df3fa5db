//! Hospital charges schedule.

use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

use cystcare_common::entities::Lookup;
use cystcare_common::error::{CareError, Result};

use crate::index::{FragmentIndex, MatchMode};

/// One service line of the charges export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChargeRecord {
    #[serde(rename = "Service", alias = "service")]
    pub service: String,
    #[serde(rename = "Base Cost (KES)", alias = "base_cost")]
    pub base_cost: f64,
    #[serde(rename = "Out-of-Pocket (KES)", alias = "out_of_pocket")]
    pub out_of_pocket: f64,
}

#[derive(Debug, Clone)]
pub struct ChargesTable {
    records: Vec<ChargeRecord>,
    index: FragmentIndex,
}

impl ChargesTable {
    /// Costs must be finite and non-negative.
    pub fn new(records: Vec<ChargeRecord>) -> Result<Self> {
        for (row, record) in records.iter().enumerate() {
            let costs = [record.base_cost, record.out_of_pocket];
            if costs.iter().any(|c| !c.is_finite() || *c < 0.0) {
                return Err(CareError::Config(format!(
                    "charges row {} (`{}`) has a negative or non-numeric cost",
                    row + 1,
                    record.service
                )));
            }
        }
        Ok(Self {
            records,
            index: FragmentIndex::empty(MatchMode::CaseSensitive),
        })
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let records = csv
            .deserialize()
            .collect::<std::result::Result<Vec<ChargeRecord>, _>>()?;
        Self::new(records)
    }

    pub fn from_csv(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading charges from {:?}", path);
        let file = std::fs::File::open(path)?;
        let table = Self::from_reader(file)?;
        info!("Loaded {} charge records", table.len());
        Ok(table)
    }

    /// Index the service-name fragments that will be searched.
    pub fn with_index<'a>(mut self, fragments: impl IntoIterator<Item = &'a str>) -> Self {
        self.index = FragmentIndex::build(
            MatchMode::CaseSensitive,
            fragments,
            self.records.iter().map(|r| r.service.as_str()),
        );
        self
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[ChargeRecord] {
        &self.records
    }

    /// First record whose service name contains `fragment` (case-sensitive).
    pub fn find_service(&self, fragment: &str) -> Lookup<&ChargeRecord> {
        let hit = match self.index.get(fragment) {
            Some(positions) => positions.first().and_then(|&i| self.records.get(i)),
            None => self.records.iter().find(|r| r.service.contains(fragment)),
        };
        Lookup::from_option(hit)
    }
}
