//! # VAT Recon Core
//!
//! A reconciliation library for marketplace VAT transaction reports. It
//! loads a monthly CSV export, classifies rows into tax categories,
//! normalizes non-EUR amounts into euros with fixed exchange rates, and
//! compares the jurisdiction-level VAT total against a reference figure.
//!
//! ## Features
//!
//! - **Tolerant loading**: delimiter detection, encoding fallback, and
//!   zero-defaulting numeric coercion for monthly report exports
//! - **Tax classification**: eight ordered business rules, first match wins
//! - **Currency normalization**: fixed-rate conversion into EUR with
//!   two-decimal rounding, unknown currencies passed through unchanged
//! - **Reconciliation**: derived VAT totals per jurisdiction compared
//!   against an expected reference, rendered as a diagnostic report
//!
//! ## Quick Start
//!
//! ```rust
//! use vat_recon_core::{reconcile_records, ReconcileConfig};
//!
//! let config = ReconcileConfig::default();
//! let report = reconcile_records(Vec::new(), &config);
//! assert_eq!(report.jurisdiction, "POLAND");
//! ```

pub mod classifier;
pub mod currency;
pub mod loader;
pub mod reconcile;
pub mod types;

// Re-export commonly used types
pub use classifier::*;
pub use currency::*;
pub use loader::*;
pub use reconcile::*;
pub use types::*;
