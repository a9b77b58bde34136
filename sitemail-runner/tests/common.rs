#![allow(dead_code)]

use async_trait::async_trait;
use sitemail_actors::progress::ProgressSubscription;
use sitemail_common::observability::{init_logging, LogConfig, LogFormat};
use sitemail_common::Record;
use sitemail_runner::RunState;
use sitemail_web::SiteProber;
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;
use tokio::sync::Semaphore;
use url::Url;

static INIT_PATH: OnceLock<PathBuf> = OnceLock::new();

pub fn init_test_tracing() {
    let _ = INIT_PATH.get_or_init(|| {
        let config = LogConfig {
            app_name: "sitemail-tests",
            log_dir: Some(std::env::temp_dir().join("sitemail-tests")),
            emit_stderr: true,
            format: if std::env::var("SITEMAIL_LOG_FORMAT")
                .map(|raw| raw.trim().eq_ignore_ascii_case("json"))
                .unwrap_or(false)
            {
                LogFormat::Json
            } else {
                LogFormat::Text
            },
            default_filter: "debug".to_string(),
        };

        init_logging(config).unwrap_or_default()
    });
}

fn key(url: &str) -> String {
    Url::parse(url).unwrap().to_string()
}

/// Deterministic prober answering from a URL table.
///
/// Optionally blocks on a semaphore or requests a stop when a given URL is
/// probed, so tests can place a stop request exactly between records.
#[derive(Default)]
pub struct StubProber {
    answers: HashMap<String, Vec<String>>,
    visits: Mutex<Vec<String>>,
    gate: Option<(String, Arc<Semaphore>)>,
    stop_on: Option<(String, Arc<RunState>)>,
}

impl StubProber {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answer(mut self, url: &str, emails: &[&str]) -> Self {
        self.answers
            .insert(key(url), emails.iter().map(|e| e.to_string()).collect());
        self
    }

    /// Hold the probe of `url` until a permit is added to `gate`.
    pub fn gate_on(mut self, url: &str, gate: Arc<Semaphore>) -> Self {
        self.gate = Some((key(url), gate));
        self
    }

    /// Request a stop on `state` while `url` is being probed.
    pub fn stop_on(mut self, url: &str, state: Arc<RunState>) -> Self {
        self.stop_on = Some((key(url), state));
        self
    }

    pub fn visits(&self) -> Vec<String> {
        self.visits.lock().unwrap().clone()
    }
}

#[async_trait]
impl SiteProber for StubProber {
    async fn probe(&self, url: &Url) -> BTreeSet<String> {
        let url = url.to_string();
        self.visits.lock().unwrap().push(url.clone());

        if let Some((gated, gate)) = &self.gate {
            if *gated == url {
                gate.acquire().await.unwrap().forget();
            }
        }
        if let Some((trigger, state)) = &self.stop_on {
            if *trigger == url {
                state.request_stop();
            }
        }

        self.answers
            .get(&url)
            .map(|emails| emails.iter().cloned().collect())
            .unwrap_or_default()
    }
}

pub fn record(name: &str, website: &str) -> Record {
    Record {
        business_name: name.to_string(),
        category: "Cafe".to_string(),
        address: "1 Main St".to_string(),
        postal_code: "02139".to_string(),
        phone_number: "555-0100".to_string(),
        website: website.to_string(),
    }
}

/// Write an input table with the standard header.
pub fn write_input(dir: &Path, records: &[Record]) -> PathBuf {
    let path = dir.join("input.csv");
    let mut writer = csv::Writer::from_path(&path).unwrap();
    for record in records {
        writer.serialize(record).unwrap();
    }
    writer.flush().unwrap();
    path
}

/// Data rows of a matched artifact, header excluded.
pub fn matched_rows(path: &Path) -> Vec<Vec<String>> {
    let mut reader = csv::Reader::from_path(path).unwrap();
    reader
        .records()
        .map(|row| row.unwrap().iter().map(str::to_string).collect())
        .collect()
}

pub fn unmatched_lines(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

/// Read progress lines until the run reports that it is over.
pub async fn progress_until_done(progress: &mut ProgressSubscription) -> Vec<String> {
    let mut seen = Vec::new();
    loop {
        let line = tokio::time::timeout(Duration::from_secs(5), progress.recv())
            .await
            .expect("timed out waiting for progress")
            .expect("progress channel closed");
        let done = line == "Scraping complete." || line.starts_with("Scraping failed:");
        seen.push(line);
        if done {
            return seen;
        }
    }
}

/// Wait for one specific progress line, discarding anything before it.
pub async fn progress_until(progress: &mut ProgressSubscription, wanted: &str) {
    loop {
        let line = tokio::time::timeout(Duration::from_secs(5), progress.recv())
            .await
            .expect("timed out waiting for progress")
            .expect("progress channel closed");
        if line == wanted {
            return;
        }
    }
}
