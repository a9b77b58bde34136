//! Driver layer for browser automation.
//!
//! This crate exposes the WebDriver session wrapper and page helpers used to
//! load business sites in a stealthy, bounded way.
//!
//! - [`site_browser::driver::SiteDriver`]: one isolated WebDriver session
//! - [`site_browser::page::SitePage`]: a loaded document that can be queried
//! - [`site_browser::page::LoadedPage`]: the read-only query seam
//! - [`site_browser::behavioral::BehavioralEngine`]: human-like timings
//! - [`site_browser::stealth`]: stealth profiles and JS evasions
pub mod site_browser;
