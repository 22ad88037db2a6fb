// SPDX-License-Identifier: Apache-2.0
// Copyright (C) 2025 Michael Dippery <michael@monkey-robot.com>

//! Exports word counts as CSV and JSON reports.

use crate::count::WordCount;
use log::info;
use serde_json::{Map, Value};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File written by [`write_to_csv()`] when no path is given.
pub const DEFAULT_CSV_PATH: &str = "twords_report.csv";

/// File written by [`write_to_json()`] when no path is given.
pub const DEFAULT_JSON_PATH: &str = "twords_report.json";

/// Formats word counts as CSV.
///
/// The first line is the header `word,count`. Each following line holds
/// one word and its count, in the order given. Words containing commas,
/// quotes, or line breaks are quoted.
///
/// # Examples
///
/// ```
/// use twords::report::to_csv;
///
/// let words = vec![("cat".to_string(), 2), ("dog".to_string(), 1)];
/// assert_eq!(to_csv(&words), "word,count\ncat,2\ndog,1\n");
/// ```
pub fn to_csv(words: &[WordCount]) -> String {
    let mut csv = String::from("word,count\n");
    for (word, count) in words {
        csv.push_str(&escape(word));
        csv.push(',');
        csv.push_str(&count.to_string());
        csv.push('\n');
    }
    csv
}

/// Formats word counts as a JSON object mapping each word to its count.
///
/// Keys appear in the order given.
///
/// # Examples
///
/// ```
/// use twords::report::to_json;
///
/// let words = vec![("cat".to_string(), 2), ("dog".to_string(), 1)];
/// assert_eq!(to_json(&words).unwrap(), r#"{"cat":2,"dog":1}"#);
/// ```
pub fn to_json(words: &[WordCount]) -> Result<String, Error> {
    let object: Map<String, Value> = words
        .iter()
        .map(|(word, count)| (word.clone(), Value::from(*count)))
        .collect();
    Ok(serde_json::to_string(&object)?)
}

/// Writes word counts as CSV to `path`, or to [`DEFAULT_CSV_PATH`] in the
/// current directory, and returns the path written to.
pub fn write_to_csv(words: &[WordCount], path: Option<&Path>) -> Result<PathBuf, Error> {
    let path = path.map_or_else(|| PathBuf::from(DEFAULT_CSV_PATH), Path::to_path_buf);
    write(&path, to_csv(words))?;
    Ok(path)
}

/// Writes word counts as JSON to `path`, or to [`DEFAULT_JSON_PATH`] in
/// the current directory, and returns the path written to.
pub fn write_to_json(words: &[WordCount], path: Option<&Path>) -> Result<PathBuf, Error> {
    let path = path.map_or_else(|| PathBuf::from(DEFAULT_JSON_PATH), Path::to_path_buf);
    write(&path, to_json(words)?)?;
    Ok(path)
}

fn write(path: &Path, contents: String) -> Result<(), Error> {
    fs::write(path, contents).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    info!("Wrote report to {}", path.display());
    Ok(())
}

fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// An error producing a report.
#[derive(Debug, Error)]
pub enum Error {
    /// The report could not be written.
    #[error("Could not write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The report could not be serialized.
    #[error("Could not serialize report: {0}")]
    Json(#[from] serde_json::Error),
}
