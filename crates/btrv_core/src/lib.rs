//! # Btrv Core
//!
//! Read-only decoder for Btrieve v5 and v6 data files.
//!
//! This crate provides:
//! - FCR validation and version detection ([`Header`])
//! - Page allocation table translation for v6 files
//! - Alternate collating sequence and key definition loading
//! - Fixed and variable-length record recovery
//! - Typed key extraction and comparison ([`Key`], [`KeyValue`])
//!
//! Index pages are never traversed; records are recovered by scanning data
//! pages in order.
//!
//! ## Example
//!
//! ```rust,no_run
//! use btrv_core::{BtrieveFile, LoadOptions};
//!
//! let file = BtrieveFile::open("USERS.DAT", &LoadOptions::default())?;
//! for record in file.records() {
//!     let value = file.key(0).map(|key| key.extract(record.data()));
//!     println!("{:#x}: {value:?}", record.offset());
//! }
//! # Ok::<(), btrv_core::BtrieveError>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod acs;
mod bytes;
mod cache;
mod config;
mod error;
mod file;
pub mod header;
pub mod key;
pub mod page;
pub mod record;
mod types;

pub use acs::AcsTable;
pub use cache::RecordCache;
pub use config::LoadOptions;
pub use error::{BtrieveError, BtrieveResult};
pub use file::{BtrieveFile, LoadWarning};
pub use header::Header;
pub use key::{Key, KeyAttributes, KeyDataType, KeyValue, Segment};
pub use record::Record;
pub use types::FormatVersion;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
