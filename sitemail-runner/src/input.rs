use crate::error::{InputError, RunError};
use sitemail_common::Record;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Read every record from a comma-delimited file with a header row.
///
/// The header must name a `Website` (or `website`) column. Values are kept
/// verbatim and row order is preserved. Any unreadable or malformed row
/// fails the whole load.
pub fn load_records(path: impl AsRef<Path>) -> Result<Vec<Record>, RunError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| RunError::input(path, csv::Error::from(e)))?;
    let records = records_from_reader(file).map_err(|e| RunError::input(path, e))?;
    debug!(target: "sitemail.run", path = %path.display(), records = records.len(), "input loaded");
    Ok(records)
}

pub fn records_from_reader<R: Read>(reader: R) -> Result<Vec<Record>, InputError> {
    let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);

    let headers = reader.headers()?;
    if !headers.iter().any(|h| h == "Website" || h == "website") {
        return Err(InputError::MissingWebsiteColumn);
    }

    reader
        .deserialize::<Record>()
        .map(|row| row.map_err(InputError::from))
        .collect()
}
