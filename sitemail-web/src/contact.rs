use crate::prober::SiteProber;
use sitemail_common::DEFAULT_CONTACT_PATHS;
use std::collections::BTreeSet;
use tracing::debug;
use url::Url;

/// Ordered list of sub-paths tried when a site's landing page has no
/// addresses. The first path that yields anything wins.
#[derive(Debug, Clone)]
pub struct ContactPathFallback {
    paths: Vec<String>,
}

impl Default for ContactPathFallback {
    fn default() -> Self {
        Self::new(DEFAULT_CONTACT_PATHS)
    }
}

impl ContactPathFallback {
    pub fn new<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }

    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    /// Resolve every path against `base` with URL-join semantics, in order.
    /// Paths that do not resolve are skipped.
    pub fn candidates(&self, base: &Url) -> Vec<Url> {
        self.paths
            .iter()
            .filter_map(|path| match base.join(path) {
                Ok(url) => Some(url),
                Err(e) => {
                    debug!(target: "sitemail.probe", %base, %path, error = %e, "skipping unresolvable contact path");
                    None
                }
            })
            .collect()
    }

    /// Probe each candidate in order and return the first non-empty result.
    pub async fn probe_contact_pages<P>(&self, prober: &P, base: &Url) -> BTreeSet<String>
    where
        P: SiteProber + ?Sized,
    {
        for candidate in self.candidates(base) {
            let found = prober.probe(&candidate).await;
            if !found.is_empty() {
                debug!(target: "sitemail.probe", url = %candidate, found = found.len(), "contact page hit");
                return found;
            }
        }
        BTreeSet::new()
    }
}
