use std::fmt;

use crate::document::{Document, Map};
use crate::outcome::Outcome;

pub const RETURN: &str = "return";
pub const ERROR: &str = "error";
pub const ID: &str = "id";

/// A reply correlated to its request by id.
///
/// Successful replies read `{"return":<payload>,"id":N}`; failures replace the payload with an
/// empty array under `error`.
#[derive(Clone, Debug, PartialEq)]
pub struct Reply {
    id: i64,
    payload: Option<Document>,
}

impl Reply {
    pub fn new(id: i64, outcome: Outcome) -> Reply {
        Reply {
            id,
            payload: outcome.into_payload(),
        }
    }

    pub fn error(id: i64) -> Reply {
        Reply { id, payload: None }
    }

    pub fn is_error(&self) -> bool {
        self.payload.is_none()
    }

    pub fn to_document(&self) -> Document {
        let map = match &self.payload {
            Some(payload) => Map::new().with(RETURN, payload.clone()),
            None => Map::new().with(ERROR, Document::Array(Vec::new())),
        };
        Document::Map(map.with(ID, self.id))
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.to_document().fmt(f)
    }
}
