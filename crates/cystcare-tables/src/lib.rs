//! cystcare-tables: read-only tabular collaborators.
//!
//! Two CSV exports are consumed: the pharmacy/ward inventory (item name ->
//! stock count) and the hospital charges schedule (service name -> base and
//! out-of-pocket cost). Both are loaded once into typed tables. The name
//! fragments the reference tables search for are indexed at load time so a
//! request never rescans the table.
//!
//! # Example
//!
//! ```rust,no_run
//! use cystcare_tables::{ChargesTable, InventoryTable};
//!
//! let charges = ChargesTable::from_csv("data/hospital_charges.csv")?
//!     .with_index(["Ovarian Cystec", "Pain Managem"]);
//! let surgery = charges.find_service("Ovarian Cystec");
//!
//! let inventory = InventoryTable::from_csv("data/inventory.csv")?
//!     .with_index(["Speculum"]);
//! for hit in inventory.search("speculum") {
//!     println!("{} {}", hit.item, hit.available_stock);
//! }
//! # Ok::<(), cystcare_common::CareError>(())
//! ```

pub mod index;
pub mod charges;
pub mod inventory;

pub use charges::{ChargeRecord, ChargesTable};
pub use index::{FragmentIndex, MatchMode};
pub use inventory::{InventoryRecord, InventoryTable};
