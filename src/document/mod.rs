mod builder;
mod encode;
mod tokenizer;

use thiserror::Error as ThisError;

use builder::Builder;
use tokenizer::Tokenizer;

pub const MAX_DEPTH: usize = 128;

#[derive(Debug, ThisError, PartialEq)]
pub enum ParseError {
    #[error("empty document")]
    Empty,
    #[error("document is not valid UTF-8")]
    InvalidUtf8,
    #[error("unexpected end of input")]
    UnexpectedEnd,
    #[error("unexpected byte {byte:#04x} at offset {offset}")]
    UnexpectedByte { byte: u8, offset: usize },
    #[error("invalid escape sequence at offset {0}")]
    InvalidEscape(usize),
    #[error("invalid number at offset {0}")]
    InvalidNumber(usize),
    #[error("number at offset {0} does not fit in a 64-bit signed integer")]
    NumberOutOfRange(usize),
    #[error("nesting deeper than {MAX_DEPTH} levels")]
    TooDeep,
    #[error("duplicate map key {0:?}")]
    DuplicateKey(String),
    #[error("map key {0:?} has no value")]
    KeyWithoutValue(String),
    #[error("map key {0:?} outside of a map")]
    KeyOutsideMap(String),
    #[error("value has no key to attach to")]
    ValueWithoutKey,
    #[error("more than one root value")]
    MultipleRoots,
    #[error("close without a matching open container")]
    UnbalancedClose,
    #[error("document ended with unclosed containers")]
    Unclosed,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Document {
    Null,
    Bool(bool),
    Integer(i64),
    Double(f64),
    String(String),
    Map(Map),
    Array(Vec<Document>),
}

impl Document {
    /// Parses exactly one document; surrounding whitespace is an error.
    pub fn parse(src: &[u8]) -> Result<Document, ParseError> {
        if src.is_empty() {
            return Err(ParseError::Empty);
        }

        let text = std::str::from_utf8(src).map_err(|_| ParseError::InvalidUtf8)?;

        let mut builder = Builder::new();
        Tokenizer::new(text).run(&mut builder)?;
        builder.finish()
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Document::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Document::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Document::Map(map) => Some(map),
            _ => None,
        }
    }
}

impl From<&str> for Document {
    fn from(s: &str) -> Self {
        Document::String(s.to_string())
    }
}

impl From<String> for Document {
    fn from(s: String) -> Self {
        Document::String(s)
    }
}

impl From<i64> for Document {
    fn from(i: i64) -> Self {
        Document::Integer(i)
    }
}

impl From<Map> for Document {
    fn from(map: Map) -> Self {
        Document::Map(map)
    }
}

impl From<Vec<Document>> for Document {
    fn from(array: Vec<Document>) -> Self {
        Document::Array(array)
    }
}

/// Entries keep insertion order; equality ignores it.
#[derive(Clone, Debug, Default)]
pub struct Map {
    entries: Vec<(String, Document)>,
}

impl Map {
    pub fn new() -> Map {
        Map::default()
    }

    /// Adds an entry, refusing keys that are already present.
    pub fn insert(&mut self, key: impl Into<String>, value: Document) -> Result<(), ParseError> {
        let key = key.into();
        if self.contains_key(&key) {
            return Err(ParseError::DuplicateKey(key));
        }
        self.entries.push((key, value));
        Ok(())
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Document>) -> Map {
        let key = key.into();
        self.entries.retain(|(k, _)| *k != key);
        self.entries.push((key, value.into()));
        self
    }

    pub fn get(&self, key: &str) -> Option<&Document> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, value)| value)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Document)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl PartialEq for Map {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(key, value)| other.get(key) == Some(value))
    }
}
