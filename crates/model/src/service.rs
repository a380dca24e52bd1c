use serde::{Deserialize, Serialize};
use utility::id::{HasId, Id};

use crate::operator::Operator;

/// A logical "bus line": the thing a passenger thinks of as a numbered
/// service, as opposed to a `Route`, which is one timetable version of it
/// published by one source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub line_name: String,
    pub description: Option<String>,
    #[serde(skip)]
    pub operator_id: Option<Id<Operator>>,
    /// Still referenced by a current Route.
    pub current: bool,
    /// The BODS-style registration code matched out of a TransXChange
    /// `ServiceCode`, e.g. `PB0000001:42`. See the resolution ladder in the
    /// TransXChange parser.
    pub unique_service_code: Option<String>,
}

impl HasId for Service {
    type IdType = i32;
}
