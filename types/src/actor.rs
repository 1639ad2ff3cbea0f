//! The authenticated caller and role-based access checks.

use thiserror::Error;
use uuid::Uuid;

use crate::Role;

/// Who is making a request.
///
/// Resolved once per request from the session cookie; every service method
/// takes the actor and decides whether the operation is allowed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Actor {
    /// No valid session accompanied the request.
    Anonymous,
    /// A logged-in directory user.
    User { id: Uuid, role: Role },
}

#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum AccessError {
    #[error("caller is not logged in")]
    Unauthenticated,

    #[error("operation requires the {required} role")]
    Forbidden { required: Role },
}

impl Actor {
    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            Actor::Anonymous => None,
            Actor::User { id, .. } => Some(*id),
        }
    }

    /// Whether this actor is the given user.
    pub fn is(&self, subject: Uuid) -> bool {
        self.user_id() == Some(subject)
    }

    /// Require at least the given rank.
    pub fn require(&self, required: Role) -> Result<(), AccessError> {
        match self {
            Actor::Anonymous => Err(AccessError::Unauthenticated),
            Actor::User { role, .. } if *role >= required => Ok(()),
            Actor::User { .. } => Err(AccessError::Forbidden { required }),
        }
    }

    /// Allow the subject acting on themselves, or anyone of at least the
    /// given rank.
    pub fn require_self_or(&self, subject: Uuid, required: Role) -> Result<(), AccessError> {
        if self.is(subject) {
            return Ok(());
        }
        self.require(required)
    }
}
