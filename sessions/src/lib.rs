//! Login sessions.
//!
//! A session ties a client to a directory user for a short window. The
//! machinery (indexes, lazy expiry, background reaping) lives in
//! `wicket-store`; this crate fixes the record type and the lifetime
//! policy.

mod error;
mod session;

pub use error::SessionError;
pub use session::{Session, Sessions, SESSION_TTL};
