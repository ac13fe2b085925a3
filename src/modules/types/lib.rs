//! Type definitions for Restbridge
//!
//! This crate contains shared type definitions used across the Restbridge codebase,
//! including HTTP verbs, CRUD method names, wire descriptors, and naming helpers.

pub mod inflect;
pub mod method;
pub mod verb;
pub mod wire;

pub use inflect::pluralize;
pub use method::CrudMethod;
pub use verb::HttpVerb;
pub use wire::{HttpRequest, HttpResponse, Record};
