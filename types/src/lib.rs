//! Fundamental types for wicket.
//!
//! This crate defines the core types shared across every other crate in the
//! workspace: timestamps, roles, and the authenticated actor used for
//! authorization decisions.

pub mod actor;
pub mod role;
pub mod time;

pub use actor::{AccessError, Actor};
pub use role::Role;
pub use time::Timestamp;
