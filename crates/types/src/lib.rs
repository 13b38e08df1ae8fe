/// Shared types for the q/acc valuation engine
///
/// This crate provides the curve data model, project and market records,
/// constants and the error type used by the math and valuator crates.

pub mod constants;
pub mod curve;
pub mod errors;
pub mod market;

// Re-export all public types
pub use constants::*;
pub use curve::*;
pub use errors::*;
pub use market::*;

/// Result type alias using the shared error type
pub type ValuationResult<T> = std::result::Result<T, ValuationError>;
