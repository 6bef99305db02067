//! vport: binary crate wiring CLI, logging, and the relay together.

pub mod cli;

pub use cli::Cli;
