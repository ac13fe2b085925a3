//! CRUD method names

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The storage operations a caller can request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrudMethod {
    Create,
    Find,
    Update,
    Destroy,
}

impl fmt::Display for CrudMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CrudMethod::Create => write!(f, "create"),
            CrudMethod::Find => write!(f, "find"),
            CrudMethod::Update => write!(f, "update"),
            CrudMethod::Destroy => write!(f, "destroy"),
        }
    }
}

impl FromStr for CrudMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "create" => Ok(CrudMethod::Create),
            "find" => Ok(CrudMethod::Find),
            "update" => Ok(CrudMethod::Update),
            "destroy" => Ok(CrudMethod::Destroy),
            _ => Err(format!("Unknown CRUD method: {}", s)),
        }
    }
}

impl CrudMethod {
    /// Returns all CRUD methods
    pub fn all() -> &'static [CrudMethod] {
        &[
            CrudMethod::Create,
            CrudMethod::Find,
            CrudMethod::Update,
            CrudMethod::Destroy,
        ]
    }

    /// Returns true for methods that change stored data
    pub fn is_mutation(&self) -> bool {
        !matches!(self, CrudMethod::Find)
    }

    /// Returns true for methods that fan out over every record matched by a `where` clause
    pub fn fans_out(&self) -> bool {
        matches!(self, CrudMethod::Update | CrudMethod::Destroy)
    }
}
