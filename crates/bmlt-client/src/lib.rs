//! bmlt command-line front end
//!
//! Loads configuration, drives a root server session and renders the
//! results for the terminal or as JSON.

pub mod cli;
pub mod commands;
pub mod config;
pub mod driver;
pub mod error;
pub mod render;
pub mod secret;

pub use cli::Cli;
pub use error::{ClientError, ClientResult};
