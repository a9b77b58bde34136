use crate::site_browser::stealth::StealthProfile;
use rand::rngs::OsRng;
use rand::Rng;
use std::time::Duration;
use tokio::time::sleep;

#[derive(Debug, Clone, Default)]
/// Produces human-like pauses to reduce automation signals.
pub struct BehavioralEngine {}

impl BehavioralEngine {
    pub fn new() -> Self {
        Self {}
    }

    /// Sleep for a random duration between `min` and `max` milliseconds.
    pub async fn random_delay(&self, min: u64, max: u64) {
        let ms = if max > min {
            OsRng.gen_range(min..=max)
        } else {
            min
        };
        if ms > 0 {
            sleep(Duration::from_millis(ms)).await;
        }
    }

    /// Pause before a navigation; heavier profiles wait longer.
    pub async fn before_navigation(&self, profile: &StealthProfile) {
        let (min, max) = Self::navigation_window(profile);
        self.random_delay(min, max).await;
    }

    pub(crate) fn navigation_window(profile: &StealthProfile) -> (u64, u64) {
        match profile {
            StealthProfile::Lightweight => (0, 0),
            StealthProfile::Balanced => (300, 1200),
            StealthProfile::Maximum => (800, 2500),
        }
    }
}
