mod common;

use common::{
    init_test_tracing, matched_rows, progress_until_done, record, unmatched_lines, StubProber,
};
use sitemail_actors::progress::ProgressBroadcaster;
use sitemail_common::Record;
use sitemail_runner::{OutputSinks, RunArtifacts, RunController, RunError, RunState, RunSummary};
use sitemail_web::{ContactPathFallback, SiteProber};
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

fn artifacts(tag: &str) -> RunArtifacts {
    RunArtifacts {
        matched: format!("emails_{tag}.csv"),
        unmatched: format!("not_found_{tag}.txt"),
    }
}

/// Run `records` to completion against `prober`, returning the summary and
/// every progress line.
async fn run_once<P: SiteProber>(
    dir: &Path,
    tag: &str,
    prober: P,
    records: &[Record],
    state: &RunState,
) -> (Result<RunSummary, RunError>, Vec<String>) {
    init_test_tracing();
    let progress = ProgressBroadcaster::spawn(64);
    let mut observer = progress.subscribe().await.unwrap();
    let controller = RunController::new(prober, ContactPathFallback::default(), progress);
    let mut sinks = OutputSinks::create(dir, artifacts(tag)).unwrap();

    let result = controller.run(records, state, &mut sinks).await;
    let lines = progress_until_done(&mut observer).await;
    (result, lines)
}

#[tokio::test]
async fn query_suffix_is_stripped_from_written_addresses() {
    let dir = tempfile::tempdir().unwrap();
    let prober = StubProber::new().answer("https://a.example", &["Info@A.example?subject=hi"]);
    let records = [record("A Co", "https://a.example")];

    let (result, lines) = run_once(dir.path(), "a", prober, &records, &RunState::new()).await;

    let summary = result.unwrap();
    assert_eq!(summary.matched, 1);
    assert_eq!(summary.rows_written, 1);
    let rows = matched_rows(&dir.path().join("emails_a.csv"));
    assert_eq!(
        rows,
        vec![vec![
            "A Co",
            "Cafe",
            "1 Main St",
            "02139",
            "555-0100",
            "https://a.example",
            "Info@A.example",
        ]]
    );
    assert_eq!(
        lines,
        vec!["Scraping: https://a.example (1/1)", "Scraping complete."]
    );
}

#[tokio::test]
async fn nothing_found_lists_the_bare_domain() {
    let dir = tempfile::tempdir().unwrap();
    let prober = Arc::new(StubProber::new());
    let records = [
        record("B", "https://b.example"),
        record("C", "https://www.c.example/shop"),
    ];

    let (result, _) = run_once(dir.path(), "b", prober.clone(), &records, &RunState::new()).await;

    assert_eq!(result.unwrap().unmatched, 2);
    assert!(matched_rows(&dir.path().join("emails_b.csv")).is_empty());
    assert_eq!(
        unmatched_lines(&dir.path().join("not_found_b.txt")),
        vec!["b.example", "c.example"]
    );
    // Landing page plus the ten contact paths, for each site.
    assert_eq!(prober.visits().len(), 22);
}

#[tokio::test]
async fn blank_websites_leave_no_trace() {
    let dir = tempfile::tempdir().unwrap();
    let prober = Arc::new(StubProber::new().answer("https://a.example", &["a@a.example"]));
    let records = [
        record("Blank", ""),
        record("Spaces", "   "),
        record("A", " https://a.example "),
    ];

    let (result, lines) = run_once(dir.path(), "blank", prober.clone(), &records, &RunState::new()).await;

    let summary = result.unwrap();
    assert_eq!(summary.skipped, 2);
    assert_eq!(summary.processed, 1);
    let rows = matched_rows(&dir.path().join("emails_blank.csv"));
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0][0], "A");
    assert!(unmatched_lines(&dir.path().join("not_found_blank.txt")).is_empty());
    assert_eq!(prober.visits(), vec!["https://a.example/"]);
    assert_eq!(
        lines,
        vec!["Scraping: https://a.example (3/3)", "Scraping complete."]
    );
}

#[tokio::test]
async fn addresses_without_at_sign_are_never_written() {
    let dir = tempfile::tempdir().unwrap();
    let prober = StubProber::new()
        .answer("https://a.example", &["sales@a.example", "not-an-address", "sales@a.example?cc=x", " team@a.example"])
        .answer("https://d.example", &["nobody", "?x@y"]);
    let records = [record("A", "https://a.example"), record("D", "https://d.example")];

    let (result, _) = run_once(dir.path(), "filter", prober, &records, &RunState::new()).await;

    let summary = result.unwrap();
    assert_eq!(summary.matched, 1);
    assert_eq!(summary.rows_written, 2);
    assert_eq!(summary.unmatched, 0);

    let emails: Vec<String> = matched_rows(&dir.path().join("emails_filter.csv"))
        .into_iter()
        .map(|row| row[6].clone())
        .collect();
    assert_eq!(emails, vec!["sales@a.example", "team@a.example"]);
    assert!(emails.iter().all(|e| e.contains('@') && !e.contains('?')));
    // Found-but-rejected is not the same as not found.
    assert!(unmatched_lines(&dir.path().join("not_found_filter.txt")).is_empty());
}

#[tokio::test]
async fn fallback_result_is_used_when_landing_page_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let prober = Arc::new(StubProber::new().answer("https://e.example/contact-us", &["hi@e.example"]));
    let records = [record("E", "https://e.example/home")];

    let (result, _) = run_once(dir.path(), "fallback", prober.clone(), &records, &RunState::new()).await;

    assert_eq!(result.unwrap().rows_written, 1);
    assert_eq!(
        prober.visits(),
        vec![
            "https://e.example/home",
            "https://e.example/contact",
            "https://e.example/contactus",
            "https://e.example/contact-us",
        ]
    );
}

#[tokio::test]
async fn malformed_site_is_listed_verbatim_and_the_run_continues() {
    let dir = tempfile::tempdir().unwrap();
    let prober = Arc::new(StubProber::new().answer("https://a.example", &["a@a.example"]));
    let records = [record("Bad", " not a url "), record("A", "https://a.example")];

    let (result, lines) = run_once(dir.path(), "malformed", prober.clone(), &records, &RunState::new()).await;

    let summary = result.unwrap();
    assert_eq!(summary.unmatched, 1);
    assert_eq!(summary.matched, 1);
    assert_eq!(
        unmatched_lines(&dir.path().join("not_found_malformed.txt")),
        vec!["not a url"]
    );
    assert_eq!(prober.visits(), vec!["https://a.example/"]);
    assert_eq!(
        lines,
        vec!["Scraping: https://a.example (2/2)", "Scraping complete."]
    );
}

#[tokio::test]
async fn stop_between_records_keeps_earlier_results_only() {
    let dir = tempfile::tempdir().unwrap();
    let state = Arc::new(RunState::new());
    let prober = Arc::new(
        StubProber::new()
            .answer("https://one.example", &["one@one.example"])
            .answer("https://three.example", &["three@three.example"])
            .stop_on("https://two.example", state.clone()),
    );
    let records = [
        record("One", "https://one.example"),
        record("Two", "https://two.example"),
        record("Three", "https://three.example"),
    ];

    let (result, lines) = run_once(dir.path(), "stop", prober.clone(), &records, &state).await;

    let summary = result.unwrap();
    assert!(summary.cancelled);
    assert_eq!(summary.processed, 2);
    // Record two finished its probe, fallback included, before the stop took effect.
    assert_eq!(
        unmatched_lines(&dir.path().join("not_found_stop.txt")),
        vec!["two.example"]
    );
    let rows = matched_rows(&dir.path().join("emails_stop.csv"));
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0][6], "one@one.example");
    assert!(!prober.visits().iter().any(|v| v.contains("three.example")));

    assert_eq!(lines.last().map(String::as_str), Some("Scraping complete."));
    assert!(!state.is_active());
    assert!(!state.is_running());
}

#[tokio::test]
async fn same_input_twice_yields_identical_rows() {
    let dir = tempfile::tempdir().unwrap();
    let prober = Arc::new(
        StubProber::new()
            .answer("https://a.example", &["z@a.example", "a@a.example", "m@a.example?x=1"])
            .answer("https://c.example/about", &["c@c.example"]),
    );
    let records = [
        record("A", "https://a.example"),
        record("B", "https://b.example"),
        record("C", "https://c.example"),
    ];

    let (first, _) = run_once(dir.path(), "first", prober.clone(), &records, &RunState::new()).await;
    let (second, _) = run_once(dir.path(), "second", prober.clone(), &records, &RunState::new()).await;

    assert_eq!(first.unwrap(), second.unwrap());
    assert_eq!(
        matched_rows(&dir.path().join("emails_first.csv")),
        matched_rows(&dir.path().join("emails_second.csv"))
    );
    assert_eq!(
        unmatched_lines(&dir.path().join("not_found_first.txt")),
        unmatched_lines(&dir.path().join("not_found_second.txt"))
    );
}

#[tokio::test]
async fn completion_reaches_observers_through_a_tiny_mailbox() {
    init_test_tracing();
    let dir = tempfile::tempdir().unwrap();
    let progress = ProgressBroadcaster::spawn(2);
    let mut observer = progress.subscribe().await.unwrap();
    let controller = RunController::new(StubProber::new(), ContactPathFallback::default(), progress);
    let mut sinks = OutputSinks::create(dir.path(), artifacts("tiny")).unwrap();
    let records: Vec<Record> = (0..5)
        .map(|i| record(&format!("S{i}"), &format!("https://s{i}.example")))
        .collect();
    let state = RunState::new();

    let summary = controller.run(&records, &state, &mut sinks).await.unwrap();

    assert_eq!(summary.unmatched, 5);
    let lines = progress_until_done(&mut observer).await;
    assert_eq!(lines.last().map(String::as_str), Some("Scraping complete."));
    assert!(!state.is_running());
}

/// Accepts writes until `budget` bytes have gone through, then fails.
struct BrokenDisk {
    budget: usize,
}

impl Write for BrokenDisk {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.len() > self.budget {
            return Err(io::Error::other("disk full"));
        }
        self.budget -= buf.len();
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn write_failure_halts_the_run_and_is_reported() {
    init_test_tracing();
    let prober = Arc::new(StubProber::new());
    let progress = ProgressBroadcaster::spawn(16);
    let mut observer = progress.subscribe().await.unwrap();
    let controller = RunController::new(prober.clone(), ContactPathFallback::default(), progress);
    let mut sinks = OutputSinks::from_writers(
        artifacts("broken"),
        BrokenDisk { budget: 1024 },
        BrokenDisk { budget: 0 },
    )
    .unwrap();
    let state = RunState::new();
    let records = [record("B", "https://b.example"), record("C", "https://c.example")];

    let result = controller.run(&records, &state, &mut sinks).await;

    match result {
        Err(RunError::Output { artifact, .. }) => assert_eq!(artifact, "not_found_broken.txt"),
        other => panic!("expected an output error, got {other:?}"),
    }
    let lines = progress_until_done(&mut observer).await;
    assert!(lines.last().unwrap().starts_with("Scraping failed:"));
    assert!(!state.is_active());
    assert!(!prober.visits().iter().any(|v| v.contains("c.example")));
}
