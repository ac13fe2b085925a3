//! Restbridge CLI
//!
//! This crate provides the command-line interface for Restbridge including:
//! - find, create, update, destroy: CRUD calls against a configured connection
//! - describe: Show a collection's attribute definitions
//! - validate: Check a configuration file
//! - init: Write a starter configuration

pub mod commands;

pub use commands::{Cli, Commands};
