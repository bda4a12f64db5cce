//! Command-line interface

pub mod archive;
pub mod error;

pub use archive::Cli;
pub use error::CliError;
