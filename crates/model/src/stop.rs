use serde::{Deserialize, Serialize};
use utility::id::HasId;

/// A physical stopping place, keyed by its NaPTAN ATCO code. Stops are
/// external to the ingestion pipeline proper; this is just enough to link
/// a StopTime to a place and to tell an inactive stop apart from a current
/// one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Stop {
    pub atco_code: String,
    pub common_name: Option<String>,
    pub latlong: Option<(f64, f64)>,
    pub active: bool,
}

impl HasId for Stop {
    type IdType = String;
}

impl Stop {
    pub fn latitude(&self) -> Option<f64> {
        self.latlong.map(|(lat, _)| lat)
    }

    pub fn longitude(&self) -> Option<f64> {
        self.latlong.map(|(_, lon)| lon)
    }
}
