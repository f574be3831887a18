//! Tenant identifiers
//!
//! Every operation in Stratum is keyed by a validated `TenantId`. Validation
//! happens once at the boundary; the rest of the system can assume any
//! `TenantId` it holds is well-formed.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// Minimum accepted tenant id length.
pub const MIN_TENANT_ID_LEN: usize = 6;
/// Maximum accepted tenant id length.
pub const MAX_TENANT_ID_LEN: usize = 20;

/// Unique identifier for a tenant.
///
/// A tenant id is 6-20 ASCII alphanumeric characters. Construction goes
/// through [`TenantId::parse`], which rejects anything else with
/// `Error::InvalidTenantId`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TenantId(String);

impl TenantId {
    /// Parse and validate a tenant id.
    pub fn parse(s: impl AsRef<str>) -> Result<Self> {
        let s = s.as_ref();
        if !Self::is_valid(s) {
            return Err(Error::InvalidTenantId(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }

    /// Check whether a string is a well-formed tenant id without allocating.
    pub fn is_valid(s: &str) -> bool {
        (MIN_TENANT_ID_LEN..=MAX_TENANT_ID_LEN).contains(&s.len())
            && s.chars().all(|c| c.is_ascii_alphanumeric())
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for TenantId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TenantId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for TenantId {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}

impl From<TenantId> for String {
    fn from(id: TenantId) -> String {
        id.0
    }
}
