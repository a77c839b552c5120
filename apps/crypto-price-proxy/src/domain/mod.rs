//! Domain Layer - Quote types and fetch outcomes.
//!
//! Pure types with serialization support and no I/O. Everything here can
//! be exercised without a runtime.

/// Fetch outcomes and upstream payload classification.
pub mod outcome;

/// Asset quotes and quote sets.
pub mod quotes;
