//! In-memory expiring indexed store.
//!
//! The authoritative table for short-lived records (login sessions,
//! promotion passes): indexed both by record id and by owner, holding at
//! most one live record per owner. Expired records become unreachable to
//! reads immediately and are physically removed by a single background
//! reaper driven by a deadline min-heap — no per-record timers.

pub mod error;
pub mod expiring;
pub mod heap;
pub mod page;

pub use error::StoreError;
pub use expiring::{Expiring, ExpiringStore};
pub use heap::{Deadline, DeadlineHeap};
pub use page::Page;
