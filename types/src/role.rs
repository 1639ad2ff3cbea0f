//! Role hierarchy for directory users.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Access level of a directory user, ordered from least to most privileged.
///
/// The derived `Ord` is the authorization hierarchy: `User < Admin < Chief`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
    Chief,
}

impl Role {
    /// Parse from the lowercase wire form. Returns `None` for unknown roles.
    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "user" => Some(Role::User),
            "admin" => Some(Role::Admin),
            "chief" => Some(Role::Chief),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
            Role::Chief => "chief",
        }
    }

    /// The next rank up, or `None` if this is already the top rank.
    pub fn promoted(&self) -> Option<Role> {
        match self {
            Role::User => Some(Role::Admin),
            Role::Admin => Some(Role::Chief),
            Role::Chief => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
