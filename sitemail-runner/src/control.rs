use crate::controller::{RunController, RunSummary};
use crate::error::RunError;
use crate::input::load_records;
use crate::sink::{OutputSinks, RunArtifacts};
use crate::state::RunState;
use sitemail_actors::progress::{ProgressBroadcaster, ProgressSubscription};
use sitemail_web::{ContactPathFallback, SiteProber};
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::info;

struct CurrentRun {
    state: Arc<RunState>,
    artifacts: RunArtifacts,
    task: Option<JoinHandle<Result<RunSummary, RunError>>>,
}

/// Entry point for starting, stopping and inspecting runs.
///
/// Holds at most one run. A new run is refused until the previous one has
/// fully wound down, even if a stop was already requested.
pub struct RunControl {
    prober: Arc<dyn SiteProber>,
    fallback: ContactPathFallback,
    progress: ProgressBroadcaster,
    output_dir: PathBuf,
    current: Mutex<Option<CurrentRun>>,
}

impl RunControl {
    pub fn new(
        prober: Arc<dyn SiteProber>,
        fallback: ContactPathFallback,
        progress: ProgressBroadcaster,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            prober,
            fallback,
            progress,
            output_dir: output_dir.into(),
            current: Mutex::new(None),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Load `input` and start a run in the background.
    ///
    /// Input problems are reported here, before any progress is published
    /// or any artifact is created. Returns the names of the new artifacts.
    pub async fn begin(&self, input: impl AsRef<Path>) -> Result<RunArtifacts, RunError> {
        let input = input.as_ref().to_path_buf();
        let records = {
            let input = input.clone();
            tokio::task::spawn_blocking(move || load_records(input)).await??
        };

        let mut current = self.current.lock().await;
        if current.as_ref().is_some_and(|run| run.state.is_running()) {
            return Err(RunError::AlreadyRunning);
        }

        let artifacts = RunArtifacts::now();
        let mut sinks = {
            let dir = self.output_dir.clone();
            let artifacts = artifacts.clone();
            tokio::task::spawn_blocking(move || OutputSinks::create(&dir, artifacts)).await??
        };

        let state = Arc::new(RunState::new());
        let controller = RunController::new(
            self.prober.clone(),
            self.fallback.clone(),
            self.progress.clone(),
        );

        info!(
            target: "sitemail.run",
            input = %input.display(),
            records = records.len(),
            matched = %artifacts.matched,
            unmatched = %artifacts.unmatched,
            "run started"
        );

        let task_state = state.clone();
        let task = tokio::spawn(async move { controller.run(&records, &task_state, &mut sinks).await });

        *current = Some(CurrentRun {
            state,
            artifacts: artifacts.clone(),
            task: Some(task),
        });
        Ok(artifacts)
    }

    /// Ask the current run to stop before its next record. Returns `true`
    /// if there was an active run to stop.
    pub async fn stop(&self) -> bool {
        let current = self.current.lock().await;
        match current.as_ref() {
            Some(run) => {
                let stopped = run.state.request_stop();
                if stopped {
                    info!(target: "sitemail.run", "stop requested");
                }
                stopped
            }
            None => false,
        }
    }

    pub async fn is_active(&self) -> bool {
        self.current
            .lock()
            .await
            .as_ref()
            .is_some_and(|run| run.state.is_active())
    }

    /// Artifact names of the most recent run, finished or not.
    pub async fn latest_artifacts(&self) -> Option<RunArtifacts> {
        self.current
            .lock()
            .await
            .as_ref()
            .map(|run| run.artifacts.clone())
    }

    /// Bytes of an artifact in the output directory. Only bare file names
    /// are accepted.
    pub async fn read_artifact(&self, name: &str) -> Result<Vec<u8>, RunError> {
        let mut components = Path::new(name).components();
        let file_name = match (components.next(), components.next()) {
            (Some(Component::Normal(file_name)), None) => file_name,
            _ => return Err(RunError::UnknownArtifact(name.to_string())),
        };

        match tokio::fs::read(self.output_dir.join(file_name)).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(RunError::UnknownArtifact(name.to_string())),
            Err(source) => Err(RunError::Output {
                artifact: name.to_string(),
                source,
            }),
        }
    }

    /// Receive progress lines published from now on.
    pub async fn subscribe(&self) -> Result<ProgressSubscription, RunError> {
        self.progress
            .subscribe()
            .await
            .map_err(|_| RunError::ProgressClosed)
    }

    /// Wait for the current run to end and return its summary. Only the
    /// first caller gets the summary; later calls report [`RunError::NoRun`].
    pub async fn wait(&self) -> Result<RunSummary, RunError> {
        let task = {
            let mut current = self.current.lock().await;
            current
                .as_mut()
                .and_then(|run| run.task.take())
                .ok_or(RunError::NoRun)?
        };
        task.await?
    }
}
