use crate::domain::{normalized_domain, parse_site};
use crate::error::RunError;
use crate::sink::OutputSinks;
use crate::state::RunState;
use sitemail_actors::progress::ProgressBroadcaster;
use sitemail_common::{accept_address, EmailMatch, Record};
use sitemail_web::{ContactPathFallback, SiteProber};
use std::collections::BTreeSet;
use std::io::Write;
use tracing::{debug, error, info, warn};

pub const COMPLETE_MESSAGE: &str = "Scraping complete.";
pub const ABORTED_MESSAGE: &str = "Scraping failed: run aborted";

/// What a run did, reported once the loop has stopped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Records with a non-blank website that were classified.
    pub processed: usize,
    pub matched: usize,
    pub unmatched: usize,
    /// Records with a blank website.
    pub skipped: usize,
    pub rows_written: usize,
    pub cancelled: bool,
}

enum Outcome {
    Matched(usize),
    Unmatched,
    /// Addresses were found but none passed the acceptance filter.
    Rejected,
}

/// Sequential record loop: probe each site, fall back to contact pages,
/// and split the result between the two sinks.
pub struct RunController<P> {
    prober: P,
    fallback: ContactPathFallback,
    progress: ProgressBroadcaster,
}

impl<P: SiteProber> RunController<P> {
    pub fn new(prober: P, fallback: ContactPathFallback, progress: ProgressBroadcaster) -> Self {
        Self {
            prober,
            fallback,
            progress,
        }
    }

    /// Process `records` in order until they run out or `state` is no
    /// longer active. The stop flag is read once before each record; a
    /// record already being probed always finishes.
    ///
    /// On return `state` is inactive and finished, and observers have been
    /// told the run is over. The same holds if the future is dropped or a
    /// prober panics part way through.
    pub async fn run<W: Write>(
        &self,
        records: &[Record],
        state: &RunState,
        sinks: &mut OutputSinks<W>,
    ) -> Result<RunSummary, RunError> {
        let mut guard = FinishGuard {
            state,
            progress: &self.progress,
            reported: false,
        };

        let outcome = self.process(records, state, sinks).await;
        state.deactivate();

        match &outcome {
            Ok(summary) => {
                info!(
                    target: "sitemail.run",
                    processed = summary.processed,
                    matched = summary.matched,
                    unmatched = summary.unmatched,
                    skipped = summary.skipped,
                    rows = summary.rows_written,
                    cancelled = summary.cancelled,
                    "run finished"
                );
                self.progress.publish_reliable(COMPLETE_MESSAGE).await;
            }
            Err(e) => {
                warn!(target: "sitemail.run", error = %e, "run halted");
                self.progress.publish_reliable(format!("Scraping failed: {e}")).await;
            }
        }

        guard.reported = true;
        outcome
    }

    async fn process<W: Write>(
        &self,
        records: &[Record],
        state: &RunState,
        sinks: &mut OutputSinks<W>,
    ) -> Result<RunSummary, RunError> {
        let total = records.len();
        let mut summary = RunSummary::default();

        for (index, record) in records.iter().enumerate() {
            if !state.is_active() {
                info!(target: "sitemail.run", index, total, "stop requested; leaving record loop");
                summary.cancelled = true;
                break;
            }

            let Some(site) = record.site() else {
                summary.skipped += 1;
                continue;
            };
            summary.processed += 1;

            match self.classify(record, site, index, total, sinks).await? {
                Outcome::Matched(rows) => {
                    summary.matched += 1;
                    summary.rows_written += rows;
                }
                Outcome::Unmatched => summary.unmatched += 1,
                Outcome::Rejected => {}
            }
        }

        Ok(summary)
    }

    async fn classify<W: Write>(
        &self,
        record: &Record,
        site: &str,
        index: usize,
        total: usize,
        sinks: &mut OutputSinks<W>,
    ) -> Result<Outcome, RunError> {
        let url = match parse_site(site) {
            Ok(url) => url,
            Err(e) => {
                warn!(target: "sitemail.run", index, %site, error = %e, "website is not an absolute URL; listing as not found");
                sinks.write_unmatched(site)?;
                return Ok(Outcome::Unmatched);
            }
        };

        self.progress
            .publish(format!("Scraping: {site} ({}/{total})", index + 1));

        let mut found = self.prober.probe(&url).await;
        if found.is_empty() {
            found = self.fallback.probe_contact_pages(&self.prober, &url).await;
        }

        if found.is_empty() {
            sinks.write_unmatched(&normalized_domain(&url))?;
            debug!(target: "sitemail.run", index, %site, "no address found");
            return Ok(Outcome::Unmatched);
        }

        let accepted: BTreeSet<String> = found.iter().filter_map(|raw| accept_address(raw)).collect();
        if accepted.is_empty() {
            debug!(target: "sitemail.run", index, %site, found = found.len(), "every address rejected");
            return Ok(Outcome::Rejected);
        }

        let rows: Vec<EmailMatch> = accepted
            .into_iter()
            .map(|email| EmailMatch {
                record: record.clone(),
                email,
            })
            .collect();

        sinks.write_matches(&rows)?;
        debug!(target: "sitemail.run", index, %site, found = found.len(), rows = rows.len(), "addresses written");
        Ok(Outcome::Matched(rows.len()))
    }
}

/// Ends the run on every exit path out of [`RunController::run`].
struct FinishGuard<'a> {
    state: &'a RunState,
    progress: &'a ProgressBroadcaster,
    reported: bool,
}

impl Drop for FinishGuard<'_> {
    fn drop(&mut self) {
        if !self.reported {
            error!(target: "sitemail.run", "run aborted before reporting an outcome");
            self.progress.publish(ABORTED_MESSAGE);
        }
        self.state.mark_finished();
    }
}
