//! The user directory and its flows.
//!
//! Users are durable entities (unlike sessions and promotion passes, which
//! expire): a badge number, a name, an email, an argon2id credential, and a
//! role. This crate holds the entity and its validation rules, the indexed
//! user store with optional JSON persistence, and the `Directory` service
//! that enforces who may do what.

mod directory;
mod error;
mod store;
mod user;

pub use directory::{Directory, UserPatch};
pub use error::IdentityError;
pub use store::{UserStore, UserUpdate};
pub use user::{hash_password, validate_email, validate_name, validate_password, User};
