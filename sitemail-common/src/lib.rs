//! Common types and utilities shared across sitemail crates.
//!
//! This crate defines the input/output data model, browser and scrape
//! settings, and observability helpers used throughout the sitemail
//! workspace. It is intentionally lightweight so that every crate can depend
//! on it without pulling in the browser or runtime stacks.
//!
//! # Overview
//!
//! - [`Record`]: one row of the input table
//! - [`EmailMatch`]: a record paired with one accepted address
//! - [`BrowserSettings`] / [`ScrapeSettings`]: runtime configuration
//! - [`observability`]: centralised tracing/logging initialisation
//! - [`StealthLevel`]: how hard the browser tries to look human
//!
//! # Examples
//!
//! ```rust
//! use sitemail_common::{EmailMatch, Record};
//!
//! let record = Record {
//!     business_name: "Acme".into(),
//!     website: "https://acme.example".into(),
//!     ..Record::default()
//! };
//! let found = EmailMatch::new(&record, "sales@acme.example?subject=hello").unwrap();
//! assert_eq!(found.email, "sales@acme.example");
//! assert!(EmailMatch::new(&record, "not-an-address").is_none());
//! ```
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub mod observability;

/// Column order of the matched-output table.
pub const MATCHED_HEADER: [&str; 7] = [
    "Business Name",
    "Category",
    "Address",
    "Postal Code",
    "Phone Number",
    "Website",
    "Email",
];

/// Sub-paths tried, in order, when a site's landing page has no address.
pub const DEFAULT_CONTACT_PATHS: [&str; 10] = [
    "/contact",
    "/contactus",
    "/contact-us",
    "/support",
    "/help",
    "/customer-service",
    "/get-in-touch",
    "/reach-us",
    "/about",
    "/about-us",
];

/// One business row read from the input table.
///
/// Every value is kept as the literal string found in the file so that
/// postal codes and phone numbers survive untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    #[serde(rename = "Business Name", alias = "business_name", default)]
    pub business_name: String,
    #[serde(rename = "Category", alias = "category", default)]
    pub category: String,
    #[serde(rename = "Address", alias = "address", default)]
    pub address: String,
    #[serde(rename = "Postal Code", alias = "postal_code", default)]
    pub postal_code: String,
    #[serde(rename = "Phone Number", alias = "phone_number", default)]
    pub phone_number: String,
    #[serde(rename = "Website", alias = "website", default)]
    pub website: String,
}

impl Record {
    /// Look a field up by its column header.
    pub fn field(&self, name: &str) -> Option<&str> {
        let value = match name {
            "Business Name" => &self.business_name,
            "Category" => &self.category,
            "Address" => &self.address,
            "Postal Code" => &self.postal_code,
            "Phone Number" => &self.phone_number,
            "Website" => &self.website,
            _ => return None,
        };
        Some(value.as_str())
    }

    /// The website with surrounding whitespace removed, or `None` when blank.
    pub fn site(&self) -> Option<&str> {
        let site = self.website.trim();
        (!site.is_empty()).then_some(site)
    }
}

/// A record paired with one address discovered on its website.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMatch {
    pub record: Record,
    pub email: String,
}

impl EmailMatch {
    /// Pair `record` with `raw` if the address passes [`accept_address`].
    pub fn new(record: &Record, raw: &str) -> Option<Self> {
        accept_address(raw).map(|email| Self {
            record: record.clone(),
            email,
        })
    }

    /// Output row in [`MATCHED_HEADER`] order.
    pub fn row(&self) -> [&str; 7] {
        [
            &self.record.business_name,
            &self.record.category,
            &self.record.address,
            &self.record.postal_code,
            &self.record.phone_number,
            &self.record.website,
            &self.email,
        ]
    }
}

/// Strip any `?query` suffix and require an `@`.
///
/// Returns `None` for values that cannot be written to the matched output.
pub fn accept_address(raw: &str) -> Option<String> {
    let address = raw.split('?').next().unwrap_or_default().trim();
    address.contains('@').then(|| address.to_string())
}

/// Browser automation stealth level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StealthLevel {
    Lightweight,
    #[default]
    Balanced,
    Maximum,
}

/// How the browser layer connects and navigates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    /// WebDriver endpoint (chromedriver by default).
    pub webdriver_url: String,
    /// Run without a visible window.
    pub headless: bool,
    pub stealth: StealthLevel,
    /// Upper bound for a single navigation.
    pub navigation_timeout_secs: u64,
    /// Overrides the user agent picked from the built-in profiles.
    pub user_agent: Option<String>,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            webdriver_url: "http://localhost:9515".to_string(),
            headless: true,
            stealth: StealthLevel::Balanced,
            navigation_timeout_secs: 30,
            user_agent: None,
        }
    }
}

impl BrowserSettings {
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs.max(1))
    }
}

/// Where results go and which fallback pages are tried.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapeSettings {
    pub output_dir: PathBuf,
    pub contact_paths: Vec<String>,
    /// Capacity of the progress hub mailbox.
    pub progress_mailbox: usize,
}

impl Default for ScrapeSettings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("outputs"),
            contact_paths: DEFAULT_CONTACT_PATHS.iter().map(|p| p.to_string()).collect(),
            progress_mailbox: 1024,
        }
    }
}
