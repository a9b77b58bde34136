use crate::site_browser::{
    behavioral::BehavioralEngine,
    fingerprint::{UserAgentManager, UserAgentProfile},
    page::SitePage,
    stealth::{build_stealth_arguments, StealthProfile},
};
use anyhow::{anyhow, Context, Result};
use fantoccini::{Client, ClientBuilder};
use serde_json::json;
use sitemail_common::BrowserSettings;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;
use url::Url;
use webdriver::capabilities::Capabilities;

/// One WebDriver session. Each session has its own cookie jar and storage,
/// so a fresh driver per probe keeps sites isolated from each other.
pub struct SiteDriver {
    pub client: Client,
    pub behavioral_engine: BehavioralEngine,
    pub user_agent_profile: UserAgentProfile,
    pub stealth_profile: StealthProfile,
    pub navigation_timeout: Duration,
}

impl SiteDriver {
    /// Start a session on the WebDriver endpoint named in `settings`.
    ///
    /// Pages are considered loaded once the document has been parsed
    /// (`eager` page-load strategy); sub-resources are not awaited.
    pub async fn connect(settings: &BrowserSettings) -> Result<Self> {
        let stealth_profile = StealthProfile::from(settings.stealth);
        let user_agent_profile = UserAgentManager::new()
            .with_user_agent(settings.user_agent.clone())
            .session_profile();

        let caps = build_capabilities(settings.headless, &stealth_profile, &user_agent_profile);

        let client = ClientBuilder::native()
            .capabilities(caps)
            .connect(&settings.webdriver_url)
            .await
            .with_context(|| format!("failed to open WebDriver session at {}", settings.webdriver_url))?;

        debug!(
            target: "browser.driver",
            endpoint = %settings.webdriver_url,
            user_agent = %user_agent_profile.user_agent,
            "session opened"
        );

        Ok(Self {
            client,
            behavioral_engine: BehavioralEngine::new(),
            user_agent_profile,
            stealth_profile,
            navigation_timeout: settings.navigation_timeout(),
        })
    }

    /// Navigate to `url` within the navigation timeout and return the
    /// parsed page with stealth scripts applied.
    pub async fn open(&self, url: &Url) -> Result<SitePage> {
        self.behavioral_engine
            .before_navigation(&self.stealth_profile)
            .await;

        tokio::time::timeout(self.navigation_timeout, self.client.goto(url.as_str()))
            .await
            .map_err(|_| {
                anyhow!(
                    "navigation to {url} timed out after {}s",
                    self.navigation_timeout.as_secs()
                )
            })??;

        let page = SitePage::new(
            self.client.clone(),
            self.stealth_profile.clone(),
            self.user_agent_profile.clone(),
        );
        page.apply_stealth_and_fingerprint().await?;
        Ok(page)
    }

    /// Close the underlying browser session.
    pub async fn close(self) -> Result<()> {
        self.client.close().await?;
        Ok(())
    }
}

fn build_capabilities(
    headless: bool,
    stealth_profile: &StealthProfile,
    user_agent_profile: &UserAgentProfile,
) -> Capabilities {
    let mut args = build_stealth_arguments(stealth_profile, user_agent_profile);
    if headless {
        args.push("--headless=new".to_string());
        args.push("--disable-gpu".to_string());
    }

    let mut chrome_opts = HashMap::new();
    chrome_opts.insert("args".to_string(), json!(args));

    let mut caps = Capabilities::new();
    caps.insert("goog:chromeOptions".to_string(), json!(chrome_opts));
    caps.insert("pageLoadStrategy".to_string(), json!("eager"));
    caps
}
