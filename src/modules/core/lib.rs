//! Core domain logic for Restbridge
//!
//! This crate contains the connection and collection models, query options,
//! JSON merge helpers, and error types shared by the Restbridge runtime.

pub mod domain;
pub mod error;
pub mod merge;

pub use domain::*;
pub use error::{RestError, Result};
