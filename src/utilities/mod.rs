//! Shared utilities: error taxonomy and score parsing.

pub mod errors;
pub mod score;
