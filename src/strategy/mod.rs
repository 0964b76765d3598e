//! Selection-policy derivation and lookup.
//!
//! The derivation step reduces evaluation samples to per-variant means,
//! min-max normalizes them across variants, and ranks the variants under
//! four weighted optimization profiles. The resulting document is what
//! the routing handlers consume.

pub mod derive;
pub mod select;

pub use derive::{SelectionStrategy, VariantScore, derive_strategy};
pub use select::select_model;

/// Keys of the `use_case_models` map, matching what callers may send as
/// `use_case` in an invoke request.
pub const USE_CASE_PERFORMANCE: &str = "performance_optimized";
pub const USE_CASE_ACCURACY: &str = "accuracy_optimized";
pub const USE_CASE_BALANCED: &str = "balanced";
pub const USE_CASE_COST: &str = "cost_optimized";
