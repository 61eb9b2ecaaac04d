//! Subcommand implementations.

pub mod key;
pub mod params;
pub mod submit;
