use serde::{Deserialize, Serialize};
use utility::id::{HasId, Id};

/// An operator of public transport services, identified by a stable code
/// (typically a National Operator Code). Operator-contact details and
/// scraping are out of scope here; this is just enough to resolve a trip's
/// operator during ingestion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Operator {
    pub code: String,
    pub name: Option<String>,
    pub licence_number: Option<String>,
}

impl HasId for Operator {
    type IdType = String;
}

/// A region-local alias for an [`Operator`]: some feeds reference operators
/// by a code that is only meaningful within one region's documents, mapped
/// to the canonical operator through a lookup table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OperatorCode {
    pub code: String,
    #[serde(skip)]
    pub operator_id: Id<Operator>,
}

impl HasId for OperatorCode {
    type IdType = i32;
}
