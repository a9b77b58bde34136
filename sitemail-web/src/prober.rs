use crate::extract::EmailExtractor;
use anyhow::Result;
use async_trait::async_trait;
use sitemail_common::BrowserSettings;
use sitemail_drivers::site_browser::driver::SiteDriver;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

/// Visits one URL and reports the addresses found there.
///
/// Implementations swallow every failure: an unreachable or broken page is
/// indistinguishable from a page with no addresses.
#[async_trait]
pub trait SiteProber: Send + Sync {
    async fn probe(&self, url: &Url) -> BTreeSet<String>;
}

#[async_trait]
impl<P: SiteProber + ?Sized> SiteProber for Arc<P> {
    async fn probe(&self, url: &Url) -> BTreeSet<String> {
        (**self).probe(url).await
    }
}

/// Prober backed by a real browser. Every probe gets its own WebDriver
/// session, so cookies and storage never leak from one site to the next.
pub struct BrowserProber {
    settings: BrowserSettings,
    extractor: EmailExtractor,
}

impl BrowserProber {
    pub fn new(settings: BrowserSettings) -> Self {
        Self {
            settings,
            extractor: EmailExtractor::new(),
        }
    }

    async fn visit(&self, driver: &SiteDriver, url: &Url) -> Result<BTreeSet<String>> {
        let page = driver.open(url).await?;
        self.extractor.extract(&page).await
    }
}

#[async_trait]
impl SiteProber for BrowserProber {
    async fn probe(&self, url: &Url) -> BTreeSet<String> {
        let driver = match SiteDriver::connect(&self.settings).await {
            Ok(driver) => driver,
            Err(e) => {
                warn!(target: "sitemail.probe", %url, error = %e, "could not start browser session");
                return BTreeSet::new();
            }
        };

        let outcome = self.visit(&driver, url).await;

        if let Err(e) = driver.close().await {
            debug!(target: "sitemail.probe", %url, error = %e, "closing session failed");
        }

        match outcome {
            Ok(found) => {
                debug!(target: "sitemail.probe", %url, found = found.len(), "probe finished");
                found
            }
            Err(e) => {
                debug!(target: "sitemail.probe", %url, error = %e, "probe failed; treating as empty");
                BTreeSet::new()
            }
        }
    }
}
