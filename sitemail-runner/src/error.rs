use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum RunError {
    #[error("Input error in {}: {source}", .path.display())]
    Input {
        path: PathBuf,
        #[source]
        source: InputError,
    },

    #[error("Output error writing {artifact}: {source}")]
    Output {
        artifact: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Output error writing {artifact}: {source}")]
    MatchedOutput {
        artifact: String,
        #[source]
        source: csv::Error,
    },

    #[error("A run is already in progress")]
    AlreadyRunning,

    #[error("No run has been started")]
    NoRun,

    #[error("Progress broadcaster has stopped")]
    ProgressClosed,

    #[error("Unknown artifact: {0}")]
    UnknownArtifact(String),

    #[error("Run task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Why an input table could not be turned into records.
#[derive(thiserror::Error, Debug)]
pub enum InputError {
    #[error("{0}")]
    Csv(#[from] csv::Error),

    #[error("header row has no Website column")]
    MissingWebsiteColumn,
}

impl RunError {
    pub(crate) fn input(path: impl Into<PathBuf>, source: impl Into<InputError>) -> Self {
        Self::Input {
            path: path.into(),
            source: source.into(),
        }
    }
}
