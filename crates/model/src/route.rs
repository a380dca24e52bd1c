use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utility::id::{HasId, Id};

use crate::{service::Service, source::Source};

/// A concrete timetable version: one file, from one `Source`, for one
/// `Service`. `(source, code)` is the arbitration key: re-ingesting the
/// same file replaces this Route's Trips rather than creating a duplicate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Route {
    #[serde(skip)]
    pub source_id: Id<Source>,
    #[serde(skip)]
    pub service_id: Id<Service>,
    /// Stable across re-imports of the same file: the filename, or an
    /// equivalent key derived from the feed (e.g. GTFS `route_id`).
    pub code: String,
    pub line_name: String,
    pub line_brand: Option<String>,
    pub revision_number: Option<i32>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub outbound_description: Option<String>,
    pub inbound_description: Option<String>,
}

impl HasId for Route {
    type IdType = i32;
}

impl Route {
    /// Whether this route's publication window covers `today`. Combined
    /// with "referenced by at least one Trip" this is what makes a Route
    /// *current*.
    pub fn covers(&self, today: NaiveDate) -> bool {
        today >= self.start_date && self.end_date.is_none_or(|end| today <= end)
    }
}
