//! Run orchestration for sitemail.
//!
//! A run reads an input table, visits every website in order with a
//! [`SiteProber`](sitemail_web::SiteProber), falls back to the usual contact
//! pages, and splits the outcome into a matched CSV and an unmatched domain
//! list. Progress lines are pushed to a
//! [`ProgressBroadcaster`](sitemail_actors::progress::ProgressBroadcaster)
//! and a stop request is honoured between records.
//!
//! - [`RunControl`]: at most one run at a time, plus artifact lookup
//! - [`RunController`]: the record loop itself
//! - [`RunState`]: active flag and stop signal shared with the controller

pub mod control;
pub mod controller;
pub mod domain;
pub mod error;
pub mod input;
pub mod sink;
pub mod state;

pub use control::RunControl;
pub use controller::{RunController, RunSummary};
pub use error::{InputError, RunError};
pub use input::load_records;
pub use sink::{OutputSinks, RunArtifacts};
pub use state::RunState;
