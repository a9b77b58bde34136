use crate::site_browser::{
    fingerprint::UserAgentProfile,
    stealth::{StealthProfile, StealthScripts},
};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use fantoccini::Client;
use serde_json::Value;
use tracing::debug;

/// Read-only access to a document that has finished parsing.
///
/// The script must `return` an array; non-string entries are dropped.
#[async_trait]
pub trait LoadedPage: Send + Sync {
    async fn query_strings(&self, script: &str) -> Result<Vec<String>>;
}

/// A page loaded inside a [`SiteDriver`](super::driver::SiteDriver) session.
pub struct SitePage {
    pub(crate) client: Client,
    pub(crate) stealth_profile: StealthProfile,
    pub(crate) user_agent_profile: UserAgentProfile,
}

impl SitePage {
    pub(crate) fn new(
        client: Client,
        stealth_profile: StealthProfile,
        user_agent_profile: UserAgentProfile,
    ) -> Self {
        Self {
            client,
            stealth_profile,
            user_agent_profile,
        }
    }

    /// Inject the evasions for this session's stealth profile.
    pub(crate) async fn apply_stealth_and_fingerprint(&self) -> Result<()> {
        for script in StealthScripts::for_profile(&self.stealth_profile) {
            self.client.execute(script, vec![]).await?;
        }

        if let StealthProfile::Maximum = self.stealth_profile {
            self.client
                .execute(
                    &format!(
                        "Object.defineProperty(navigator, 'platform', {{ get: () => '{}' }});",
                        self.user_agent_profile.platform
                    ),
                    vec![],
                )
                .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl LoadedPage for SitePage {
    async fn query_strings(&self, script: &str) -> Result<Vec<String>> {
        let value = self.client.execute(script, vec![]).await?;
        let values = strings_from_value(value)?;
        debug!(target: "browser.page", count = values.len(), "document query returned");
        Ok(values)
    }
}

pub(crate) fn strings_from_value(value: Value) -> Result<Vec<String>> {
    match value {
        Value::Array(items) => Ok(items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect()),
        Value::Null => Ok(Vec::new()),
        other => Err(anyhow!("document query returned a non-array value: {other}")),
    }
}
