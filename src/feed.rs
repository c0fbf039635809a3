//! Loading the published spreadsheet export.

use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver};
use std::{fs, thread};

use reqwest::blocking::Client;

use crate::parser;
use crate::task::{Record, ID_FIELD};

#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("no feed configured: set csv_url in the config or pass --csv-url")]
    Unconfigured,
    #[error("could not reach the feed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("feed returned HTTP {0}")]
    Status(u16),
    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("feed returned an HTML page, not CSV; the sheet is probably not published as CSV")]
    HtmlDocument,
    #[error("feed has no {0} column; check that the export points at the task sheet")]
    MissingHeader(String),
}

/// Where the board reads its rows from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Url(String),
    File(PathBuf),
}

impl Source {
    /// `http://` and `https://` values are URLs, anything else a local path.
    pub fn from_setting(value: &str) -> Result<Self, FeedError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(FeedError::Unconfigured);
        }
        if value.starts_with("http://") || value.starts_with("https://") {
            Ok(Source::Url(value.to_string()))
        } else {
            Ok(Source::File(PathBuf::from(value)))
        }
    }
}

/// Fetches the raw feed body.
pub fn fetch(source: &Source) -> Result<String, FeedError> {
    match source {
        Source::Url(url) => {
            tracing::debug!("GET {}", url);
            let resp = Client::new().get(url).send()?;
            if !resp.status().is_success() {
                return Err(FeedError::Status(resp.status().as_u16()));
            }
            Ok(resp.text()?)
        }
        Source::File(path) => fs::read_to_string(path).map_err(|source| FeedError::Io {
            path: path.clone(),
            source,
        }),
    }
}

/// True when `body` opens like an HTML document.
pub fn looks_like_html(body: &str) -> bool {
    let head: String = body
        .trim_start()
        .chars()
        .take(16)
        .collect::<String>()
        .to_ascii_lowercase();
    head.starts_with("<!doctype html") || head.starts_with("<html")
}

/// Validates a feed body and parses it into records.
///
/// A leading byte-order mark is dropped. A feed without data rows is an
/// empty board, not an error.
pub fn decode(body: &str) -> Result<Vec<Record>, FeedError> {
    let body = body.strip_prefix('\u{feff}').unwrap_or(body);
    if looks_like_html(body) {
        return Err(FeedError::HtmlDocument);
    }
    let records = parser::parse(body);
    match records.first() {
        None => tracing::warn!("feed has no data rows"),
        // Every record carries every header, so the first one speaks for all.
        Some(first) if first.get(ID_FIELD).is_none() => {
            return Err(FeedError::MissingHeader(ID_FIELD.to_string()));
        }
        Some(_) => {}
    }
    Ok(records)
}

pub fn load(source: &Source) -> Result<Vec<Record>, FeedError> {
    let body = fetch(source)?;
    let records = decode(&body)?;
    tracing::info!(
        "loaded {} rows ({} columns) from {:?}",
        records.len(),
        records.first().map_or(0, Record::len),
        source
    );
    Ok(records)
}

/// Loads on a background thread; the result arrives on the returned channel.
pub fn spawn_load(source: Source) -> Receiver<Result<Vec<Record>, FeedError>> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let result = load(&source);
        if let Err(err) = &result {
            tracing::warn!("feed load failed: {}", err);
        }
        let _ = tx.send(result);
    });
    rx
}
