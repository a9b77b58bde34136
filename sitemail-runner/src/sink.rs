use crate::error::RunError;
use chrono::{DateTime, Local, TimeZone};
use sitemail_common::{EmailMatch, MATCHED_HEADER};
use std::fmt::Display;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

/// Millisecond precision keeps back-to-back runs from sharing a name.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S_%3f";

/// File names of the two outputs of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunArtifacts {
    pub matched: String,
    pub unmatched: String,
}

impl RunArtifacts {
    pub fn for_timestamp<Tz>(at: &DateTime<Tz>) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let stamp = at.format(TIMESTAMP_FORMAT);
        Self {
            matched: format!("emails_{stamp}.csv"),
            unmatched: format!("not_found_{stamp}.txt"),
        }
    }

    pub fn now() -> Self {
        Self::for_timestamp(&Local::now())
    }
}

/// Append-only writers for the matched table and the unmatched list.
///
/// Both are flushed after every write so a reader never sees a half row.
pub struct OutputSinks<W: Write = File> {
    artifacts: RunArtifacts,
    matched: csv::Writer<W>,
    unmatched: W,
}

impl OutputSinks<File> {
    /// Create both files inside `dir`. Existing files are never reused.
    pub fn create(dir: &Path, artifacts: RunArtifacts) -> Result<Self, RunError> {
        fs::create_dir_all(dir).map_err(|source| RunError::Output {
            artifact: dir.display().to_string(),
            source,
        })?;
        let matched = create_new(&dir.join(&artifacts.matched)).map_err(|source| RunError::Output {
            artifact: artifacts.matched.clone(),
            source,
        })?;
        let unmatched =
            create_new(&dir.join(&artifacts.unmatched)).map_err(|source| RunError::Output {
                artifact: artifacts.unmatched.clone(),
                source,
            })?;
        Self::from_writers(artifacts, matched, unmatched)
    }
}

impl<W: Write> OutputSinks<W> {
    /// Wrap two writers and emit the header row on the matched one.
    pub fn from_writers(artifacts: RunArtifacts, matched: W, unmatched: W) -> Result<Self, RunError> {
        let mut sinks = Self {
            artifacts,
            matched: csv::Writer::from_writer(matched),
            unmatched,
        };
        sinks
            .matched
            .write_record(MATCHED_HEADER)
            .map_err(|source| sinks.matched_error(source))?;
        sinks.flush_matched()?;
        Ok(sinks)
    }

    /// Append one row per match, then flush.
    pub fn write_matches(&mut self, matches: &[EmailMatch]) -> Result<(), RunError> {
        for found in matches {
            self.matched
                .write_record(found.row())
                .map_err(|source| self.matched_error(source))?;
        }
        self.flush_matched()
    }

    /// Append one line to the unmatched list, then flush.
    pub fn write_unmatched(&mut self, domain: &str) -> Result<(), RunError> {
        writeln!(self.unmatched, "{domain}")
            .and_then(|()| self.unmatched.flush())
            .map_err(|source| RunError::Output {
                artifact: self.artifacts.unmatched.clone(),
                source,
            })
    }

    fn flush_matched(&mut self) -> Result<(), RunError> {
        self.matched.flush().map_err(|source| RunError::Output {
            artifact: self.artifacts.matched.clone(),
            source,
        })
    }

    fn matched_error(&self, source: csv::Error) -> RunError {
        RunError::MatchedOutput {
            artifact: self.artifacts.matched.clone(),
            source,
        }
    }
}

fn create_new(path: &Path) -> io::Result<File> {
    OpenOptions::new().write(true).create_new(true).open(path)
}
