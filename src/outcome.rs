use crate::document::Document;

/// Text reply of commands that succeed without producing a value.
pub const SUCCESS: &str = "success";

/// Text reply of `exists` and `unbind` when the target path is absent.
pub const NOLSTAT: &str = "nolstat";

/// One device resource window as listed in a PCI `resource` file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResourceRange {
    pub start: u64,
    pub end: u64,
    pub flags: u64,
}

/// What executing a command produced.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    StringList(Vec<String>),
    ResourceRanges(Vec<ResourceRange>),
    /// `None` is reported as [`SUCCESS`].
    Text(Option<String>),
    Integer(i64),
    /// The reason is kept for logs only; the wire carries a bare error marker.
    Failure(String),
}

impl Outcome {
    pub fn success() -> Self {
        Outcome::Text(None)
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failure(_))
    }

    /// The value placed under `return`, or `None` for a failure.
    pub fn into_payload(self) -> Option<Document> {
        let payload = match self {
            Outcome::StringList(list) => {
                Document::Array(list.into_iter().map(Document::String).collect())
            }
            // Flattened as start, end, flags for each range in turn.
            Outcome::ResourceRanges(ranges) => Document::Array(
                ranges
                    .iter()
                    .flat_map(|r| [r.start, r.end, r.flags])
                    .map(unsigned)
                    .collect(),
            ),
            Outcome::Text(text) => Document::String(text.unwrap_or_else(|| SUCCESS.to_string())),
            Outcome::Integer(i) => Document::Integer(i),
            Outcome::Failure(_) => return None,
        };
        Some(payload)
    }
}

// Values past `i64::MAX` cannot be carried as integers; they degrade to doubles.
fn unsigned(value: u64) -> Document {
    i64::try_from(value).map_or(Document::Double(value as f64), Document::Integer)
}
