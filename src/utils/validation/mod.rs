//! Input validation utilities

pub mod contact;
pub mod numeric;

pub use contact::ContactValidator;
pub use numeric::NumericValidator;
