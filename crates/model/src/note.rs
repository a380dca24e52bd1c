use serde::{Deserialize, Serialize};
use utility::id::{HasId, Id};

use crate::trip::Trip;

/// A textual footnote, e.g. "NS - does not run on school holidays",
/// attached to zero or more trips and surfaced under the matrix columns it
/// applies to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Note {
    pub code: String,
    pub text: String,
}

impl HasId for Note {
    type IdType = i32;
}

/// A `Note` bound to one `Trip`. Kept as a link table rather than a `Vec`
/// on `Trip` so the same Note row can be shared by many trips.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripNote {
    pub trip_id: Id<Trip>,
    pub note_id: Id<Note>,
}
