use rand::prelude::SliceRandom;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Snapshot of user agent, viewport, and locale characteristics.
pub struct UserAgentProfile {
    pub user_agent: String,
    pub viewport: (u32, u32),
    pub platform: String,
    pub languages: Vec<String>,
    pub timezone: String,
}

impl Default for UserAgentProfile {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36".to_string(),
            viewport: (1920, 1080),
            platform: "Win32".to_string(),
            languages: vec!["en-US".to_string(), "en".to_string()],
            timezone: "America/New_York".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
/// Maintains a small pool of plausible desktop fingerprint profiles.
pub struct UserAgentManager {
    desktop_profiles: Vec<UserAgentProfile>,
    user_agent_override: Option<String>,
}

impl Default for UserAgentManager {
    fn default() -> Self {
        Self::new()
    }
}

impl UserAgentManager {
    /// Create a new manager with built-in desktop profiles.
    pub fn new() -> Self {
        Self {
            desktop_profiles: vec![
                UserAgentProfile::default(),
                UserAgentProfile {
                    user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36".to_string(),
                    viewport: (1440, 900),
                    platform: "MacIntel".to_string(),
                    languages: vec!["en-US".to_string(), "en".to_string()],
                    timezone: "America/Los_Angeles".to_string(),
                },
                UserAgentProfile {
                    user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36".to_string(),
                    viewport: (1366, 768),
                    platform: "Linux x86_64".to_string(),
                    languages: vec!["en-GB".to_string(), "en".to_string()],
                    timezone: "Europe/London".to_string(),
                },
            ],
            user_agent_override: None,
        }
    }

    /// Force a specific user-agent string onto every profile handed out.
    pub fn with_user_agent(mut self, user_agent: Option<String>) -> Self {
        self.user_agent_override = user_agent.filter(|ua| !ua.trim().is_empty());
        self
    }

    /// Pick a profile for one browser session.
    pub fn session_profile(&self) -> UserAgentProfile {
        let mut rng = rand::thread_rng();
        let mut profile = self
            .desktop_profiles
            .choose(&mut rng)
            .cloned()
            .unwrap_or_default();
        if let Some(ua) = &self.user_agent_override {
            profile.user_agent = ua.clone();
        }
        profile
    }
}
