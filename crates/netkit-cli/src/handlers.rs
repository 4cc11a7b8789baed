//! Command handlers for CLI subcommands
//!
//! This module contains the implementation logic for each CLI subcommand.

mod call;
mod config;
mod utils;

pub use call::{build_request, client_builder, handle_call};
pub use config::handle_config;
