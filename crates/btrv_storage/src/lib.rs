//! # Btrv Storage
//!
//! Read-only byte sources for the Btrieve decoder.
//!
//! Storage backends are **opaque byte stores** - they do not interpret
//! the data they hold. All page, record and key interpretation lives in
//! `btrv_core`.
//!
//! ## Design Principles
//!
//! - Backends only read (`read_at`, `size`, `read_all`)
//! - No knowledge of the Btrieve page layout
//! - Must be `Send + Sync` so a loaded source can be shared
//!
//! ## Available Backends
//!
//! - [`InMemoryBackend`] - For tests and bytes that are already resident
//! - [`FileBackend`] - For files opened through OS file APIs
//!
//! ## Example
//!
//! ```rust
//! use btrv_storage::{StorageBackend, InMemoryBackend};
//!
//! let backend = InMemoryBackend::with_data(b"hello world".to_vec());
//! let data = backend.read_at(6, 5).unwrap();
//! assert_eq!(&data, b"world");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod memory;

pub use backend::StorageBackend;
pub use error::{StorageError, StorageResult};
pub use file::FileBackend;
pub use memory::InMemoryBackend;
