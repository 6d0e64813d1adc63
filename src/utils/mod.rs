//! Shared utilities

pub mod validation;

pub use validation::{ContactValidator, NumericValidator};
