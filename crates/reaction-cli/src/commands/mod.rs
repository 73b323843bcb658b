//! Subcommand implementations

pub mod aggregate;
pub mod channels;
pub mod status;
