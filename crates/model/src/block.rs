use serde::{Deserialize, Serialize};
use utility::id::HasId;

/// A vehicle working: the sequence of Trips one physical vehicle performs
/// back to back across a day, identified by the operator's own block code.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Block {
    pub code: String,
    pub description: Option<String>,
}

impl HasId for Block {
    type IdType = i32;
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Garage {
    pub code: String,
    pub name: Option<String>,
}

impl HasId for Garage {
    type IdType = i32;
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VehicleType {
    pub code: String,
    pub description: Option<String>,
}

impl HasId for VehicleType {
    type IdType = i32;
}
