use anyhow::Result;
use sitemail_drivers::site_browser::page::LoadedPage;
use std::collections::BTreeSet;

const MAILTO: &str = "mailto:";

/// Collects the raw `href` of every anchor on the page, in document order.
pub const ANCHOR_HREFS_SCRIPT: &str = r#"
    return Array.from(document.querySelectorAll('a[href]'))
        .map(a => a.getAttribute('href'));
"#;

/// Reads `mailto:` links from a page. No validation happens here; the
/// caller decides which addresses are acceptable.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmailExtractor;

impl EmailExtractor {
    pub fn new() -> Self {
        Self
    }

    pub async fn extract(&self, page: &dyn LoadedPage) -> Result<BTreeSet<String>> {
        let hrefs = page.query_strings(ANCHOR_HREFS_SCRIPT).await?;
        Ok(emails_from_hrefs(hrefs))
    }
}

/// Keep hrefs starting with the literal, case-sensitive `mailto:` prefix,
/// strip it and surrounding whitespace, and drop what is left empty.
pub fn emails_from_hrefs<I, S>(hrefs: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    hrefs
        .into_iter()
        .filter_map(|href| {
            let address = href.as_ref().strip_prefix(MAILTO)?.trim();
            (!address.is_empty()).then(|| address.to_string())
        })
        .collect()
}
