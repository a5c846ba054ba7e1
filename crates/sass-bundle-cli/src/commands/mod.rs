//! Command implementations for the sass-bundle CLI
//!
//! Each command module handles the CLI interface and delegates to
//! sass-bundle for the actual bundling.

pub mod build;
pub mod bundle;
pub mod hash;
