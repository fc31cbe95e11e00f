//! # Application Module
//!
//! Application services orchestrating the domain and outbound ports.

pub mod enricher;
pub mod resolver;
pub mod tracker;

pub use enricher::InputEnricher;
pub use resolver::TransactionResolver;
pub use tracker::{current_status, ConfirmationTracker};
