//! CLI command implementations.

pub mod load;
pub mod urls;
pub mod validate;
