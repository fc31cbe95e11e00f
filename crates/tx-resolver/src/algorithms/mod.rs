//! # Algorithms Module
//!
//! Pure functions used by the application services.

pub mod confirmation;
pub mod enrichment;

pub use confirmation::{derive_status, derive_status_with_threshold};
pub use enrichment::{build_lookup, collect_source_ids};
