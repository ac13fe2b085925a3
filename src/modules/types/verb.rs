//! HTTP verb definitions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// HTTP verbs a connection may map CRUD methods onto
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpVerb {
    /// Read a resource or collection
    Get,
    /// Create a resource
    Post,
    /// Replace a resource
    Put,
    /// Partially update a resource
    Patch,
    /// Remove a resource
    #[serde(alias = "del")]
    Delete,
}

impl fmt::Display for HttpVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpVerb::Get => write!(f, "get"),
            HttpVerb::Post => write!(f, "post"),
            HttpVerb::Put => write!(f, "put"),
            HttpVerb::Patch => write!(f, "patch"),
            HttpVerb::Delete => write!(f, "delete"),
        }
    }
}

impl FromStr for HttpVerb {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "get" => Ok(HttpVerb::Get),
            "post" => Ok(HttpVerb::Post),
            "put" => Ok(HttpVerb::Put),
            "patch" => Ok(HttpVerb::Patch),
            // `del` is the spelling older connection configs use
            "delete" | "del" => Ok(HttpVerb::Delete),
            _ => Err(format!("Unknown HTTP verb: {}", s)),
        }
    }
}

impl HttpVerb {
    /// Returns all supported verbs
    pub fn all() -> &'static [HttpVerb] {
        &[
            HttpVerb::Get,
            HttpVerb::Post,
            HttpVerb::Put,
            HttpVerb::Patch,
            HttpVerb::Delete,
        ]
    }

    /// Returns true if requests with this verb carry their parameters in the query string
    pub fn is_read(&self) -> bool {
        matches!(self, HttpVerb::Get)
    }

    /// Returns true if this verb mutates server state
    pub fn is_mutation(&self) -> bool {
        !self.is_read()
    }

    /// Upper-case method token as sent on the wire
    pub fn as_wire(&self) -> &'static str {
        match self {
            HttpVerb::Get => "GET",
            HttpVerb::Post => "POST",
            HttpVerb::Put => "PUT",
            HttpVerb::Patch => "PATCH",
            HttpVerb::Delete => "DELETE",
        }
    }
}
