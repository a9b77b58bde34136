use anyhow::{Context, Result};
use clap::Parser;
use sitemail_actors::progress::ProgressBroadcaster;
use sitemail_common::observability::init_logging;
use sitemail_config::{SitemailConfig, SitemailConfigLoader};
use sitemail_runner::controller::COMPLETE_MESSAGE;
use sitemail_runner::RunControl;
use sitemail_web::{BrowserProber, ContactPathFallback};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;

const DEFAULT_CONFIG_FILE: &str = "sitemail.yaml";
const DRAIN_GRACE: Duration = Duration::from_millis(250);

fn is_final(line: &str) -> bool {
    line == COMPLETE_MESSAGE || line.starts_with("Scraping failed:")
}

/// Collect contact email addresses from a list of business websites.
#[derive(Parser, Debug)]
#[command(name = "sitemail", version)]
struct Cli {
    /// YAML configuration file. `sitemail.yaml` is read when present.
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Directory for the matched and not-found artifacts.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// WebDriver endpoint, e.g. a running chromedriver.
    #[arg(long)]
    webdriver_url: Option<String>,

    /// Show the browser window.
    #[arg(long)]
    headed: bool,

    /// Input table with a `Website` column.
    input: PathBuf,
}

impl Cli {
    fn apply(&self, cfg: &mut SitemailConfig) {
        if let Some(dir) = &self.output_dir {
            cfg.scrape.output_dir = dir.clone();
        }
        if let Some(url) = &self.webdriver_url {
            cfg.browser.webdriver_url = url.clone();
        }
        if self.headed {
            cfg.browser.headless = false;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1) Load config (env wins), then let flags override both
    let loader = SitemailConfigLoader::new();
    let loader = match &cli.config {
        Some(path) => loader.with_file(path),
        None => loader.with_optional_file(DEFAULT_CONFIG_FILE),
    };
    let mut cfg = loader.load().context("failed to load configuration")?;
    cli.apply(&mut cfg);

    let log_path = init_logging(cfg.logging.log_config("sitemail"))?;
    info!(
        target: "sitemail.app",
        log = %log_path.display(),
        webdriver = %cfg.browser.webdriver_url,
        output_dir = %cfg.scrape.output_dir.display(),
        "starting"
    );

    // 2) Wire the run surface
    let progress = ProgressBroadcaster::spawn(cfg.scrape.progress_mailbox);
    let control = Arc::new(RunControl::new(
        Arc::new(BrowserProber::new(cfg.browser.clone())),
        ContactPathFallback::new(cfg.scrape.contact_paths.clone()),
        progress,
        cfg.scrape.output_dir.clone(),
    ));

    // Cancelled once `wait` returns, whatever the progress stream said.
    let done = CancellationToken::new();

    let mut updates = control.subscribe().await?;
    let printer = {
        let done = done.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    line = updates.recv() => match line {
                        Some(line) => {
                            println!("{line}");
                            if is_final(&line) {
                                return;
                            }
                        }
                        None => return,
                    },
                    _ = done.cancelled() => break,
                }
            }
            // The closing line may still be on its way through the hub.
            while let Ok(Some(line)) = tokio::time::timeout(DRAIN_GRACE, updates.recv()).await {
                println!("{line}");
                if is_final(&line) {
                    break;
                }
            }
        })
    };

    // 3) Run until done or Ctrl-C
    let artifacts = control
        .begin(&cli.input)
        .await
        .with_context(|| format!("could not start a run for {}", cli.input.display()))?;

    let stopper = {
        let control = control.clone();
        let done = done.clone();
        tokio::spawn(async move {
            tokio::select! {
                signal = tokio::signal::ctrl_c() => {
                    if signal.is_ok() && control.stop().await {
                        eprintln!("Stopping after the current site...");
                    }
                }
                _ = done.cancelled() => {}
            }
        })
    };

    let outcome = control.wait().await;
    done.cancel();
    let _ = stopper.await;
    let _ = printer.await;

    let summary = outcome.context("run did not finish")?;
    let dir = control.output_dir();
    println!("Matched:   {}", dir.join(&artifacts.matched).display());
    println!("Not found: {}", dir.join(&artifacts.unmatched).display());
    println!(
        "{} sites checked, {} with addresses ({} rows), {} without, {} blank{}",
        summary.processed,
        summary.matched,
        summary.rows_written,
        summary.unmatched,
        summary.skipped,
        if summary.cancelled { ", stopped early" } else { "" }
    );
    Ok(())
}
