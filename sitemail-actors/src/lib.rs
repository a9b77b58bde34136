//! Minimal mailbox actors and the progress broadcaster built on them.
//!
//! - [`actor`]: `Actor` trait, typed `Addr`, bounded-mailbox spawning
//! - [`progress`]: single-owner hub that fans status lines out to observers
pub mod actor;
pub mod progress;
