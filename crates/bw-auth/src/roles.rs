use std::str::FromStr;

use thiserror::Error;

use crate::models::Role;

/// Role names the storefront understands
///
/// Role checks go through this closed vocabulary instead of comparing raw
/// strings at every call site. Parsing is case-insensitive because the
/// backend has served both `ADMIN` and `admin` historically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleName {
    Admin,
    Seller,
    User,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Unknown role name: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for RoleName {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ADMIN" => Ok(Self::Admin),
            "SELLER" => Ok(Self::Seller),
            "USER" => Ok(Self::User),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// Canonical admin membership check
///
/// The derived flag callers cache must always come from here, recomputed
/// whenever the role list changes. Recomputation is idempotent.
pub fn is_admin(roles: &[Role]) -> bool {
    roles
        .iter()
        .any(|role| matches!(role.name.parse(), Ok(RoleName::Admin)))
}
