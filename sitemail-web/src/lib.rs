//! Site visiting and address discovery.
//!
//! - `extract`: pulls `mailto:` addresses out of a loaded page
//! - `prober`: one isolated browser visit per URL, never fails
//! - `contact`: walks the usual contact sub-paths until one yields results

pub mod contact;
pub mod extract;
pub mod prober;

pub use contact::ContactPathFallback;
pub use extract::EmailExtractor;
pub use prober::{BrowserProber, SiteProber};
