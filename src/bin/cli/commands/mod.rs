//! Command implementations

pub mod location;
pub mod parse;
