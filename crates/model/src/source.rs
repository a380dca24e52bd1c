use std::collections::HashMap;

use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use utility::id::HasId;

/// A date-windowed filename prefix, used to pick out the right file within an
/// incremental feed that republishes several overlapping archives (see
/// `ingest::arbitration::current_prefix`).
pub type PrefixWindow = (String, NaiveDate, NaiveDate);

/// The origin of a batch of schedule data: one archive, fetched from one URL,
/// at one point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    pub name: String,
    pub url: Option<String>,
    pub datetime: DateTime<Local>,
    /// SHA1 of the most recently ingested archive, used to deduplicate
    /// sources that republish byte-identical content under a new name.
    pub sha1: Option<String>,
    /// Date-windowed filename prefixes for incremental feeds that publish
    /// several files covering different date ranges under one source.
    pub settings: Option<HashMap<String, PrefixWindow>>,
    /// Whether this source is considered authoritative for every line of the
    /// operators it covers; an incomplete source defers to a complete one
    /// claiming the same line (see `ingest::arbitration`).
    pub complete: bool,
}

impl HasId for Source {
    type IdType = i32;
}

impl Source {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: None,
            datetime: Local::now(),
            sha1: None,
            settings: None,
            complete: false,
        }
    }
}
