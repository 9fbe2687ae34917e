//! Domain layer types and invariants.

pub mod error;
pub mod filter;
pub mod menu;
pub mod options;
pub mod vocab;
