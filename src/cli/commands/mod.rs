//! Command implementations for the secretscan CLI

pub mod patterns;
pub mod scan;
pub mod validate;
