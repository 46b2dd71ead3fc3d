//! # Btrv Testkit
//!
//! Test utilities for the Btrieve decoder.
//!
//! This crate provides:
//! - [`FileBuilder`] for byte-exact synthetic v5 and v6 files
//! - Canned fixtures modelled on real databases
//! - Temporary-directory helpers
//! - Property-based test generators using proptest
//!
//! It deliberately does not depend on `btrv_core`, so the decoder is
//! checked against an independent encoder.
//!
//! ## Usage
//!
//! ```rust
//! use btrv_testkit::prelude::*;
//!
//! let bytes = FileBuilder::v5(512)
//!     .record_length(8)
//!     .key(KeySpec::single(SegmentSpec::new(codes::INTEGER, 0, 4)))
//!     .record(vec![1u8; 8])
//!     .build();
//! assert_eq!(bytes.len(), 1024);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod builder;
pub mod codes;
pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::builder::*;
    pub use crate::codes;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use builder::*;
pub use fixtures::*;
pub use generators::*;
