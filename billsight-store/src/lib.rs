// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # `BillSight` Store
//!
//! Everything `BillSight` keeps on disk:
//!
//! - **`BillStore`**: SQLite database of processed bills and line items
//! - **`SettingsStore`**: User preferences as a JSON file
//! - **Persistence**: Default paths and JSON file helpers
//!
//! ## Usage
//!
//! ```ignore
//! use billsight_store::{BillRepository, BillStore, SettingsStore};
//!
//! let settings = SettingsStore::load_default().await.get().await;
//! let store = BillStore::open(settings.database_path())?;
//!
//! let (bill_id, _) = store.save_bill_with_items(&new_bill, &items)?;
//! let stats = store.statistics()?;
//! ```

pub mod bills;
pub mod error;
pub mod persistence;
pub mod settings_store;

pub use bills::{BillRepository, BillStore, NewBill, Statistics, StoredBill, StoredLineItem};
pub use error::StoreError;
pub use persistence::{
    default_config_dir, default_data_dir, default_database_path, default_output_dir,
    default_settings_path, ensure_dir, load_json, save_json,
};
pub use settings_store::{
    DEFAULT_FALLBACK_MODEL, DEFAULT_PRIMARY_MODEL, LogLevel, Settings, SettingsStore,
};

#[cfg(test)]
mod bills_tests;
