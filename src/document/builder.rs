use std::mem;

use super::tokenizer::{Event, Handler};
use super::{Document, Map, ParseError, MAX_DEPTH};

type NodeId = usize;

enum Node {
    Scalar(Document),
    // A `None` value marks a key whose value has not been attached yet.
    Map(Vec<(String, Option<NodeId>)>),
    Array(Vec<NodeId>),
}

/// Assembles tokenizer events into a [`Document`].
///
/// Nodes live in an arena and refer to their children by index. The stack holds the ids of the
/// containers that are open, its top being the container the next value attaches to.
pub(crate) struct Builder {
    nodes: Vec<Node>,
    stack: Vec<NodeId>,
    root: Option<NodeId>,
}

impl Builder {
    pub(crate) fn new() -> Self {
        Self {
            nodes: Vec::new(),
            stack: Vec::new(),
            root: None,
        }
    }

    pub(crate) fn finish(mut self) -> Result<Document, ParseError> {
        if !self.stack.is_empty() {
            return Err(ParseError::Unclosed);
        }
        let root = self.root.ok_or(ParseError::Empty)?;
        self.take(root)
    }

    fn attach(&mut self, node: Node) -> Result<NodeId, ParseError> {
        let id = self.nodes.len();

        match self.stack.last().copied() {
            None => {
                if self.root.is_some() {
                    return Err(ParseError::MultipleRoots);
                }
                self.root = Some(id);
            }
            Some(parent) => match &mut self.nodes[parent] {
                Node::Map(entries) => match entries.last_mut() {
                    Some((_, slot @ None)) => *slot = Some(id),
                    _ => return Err(ParseError::ValueWithoutKey),
                },
                Node::Array(children) => children.push(id),
                Node::Scalar(_) => return Err(ParseError::ValueWithoutKey),
            },
        }

        self.nodes.push(node);
        Ok(id)
    }

    fn open(&mut self, node: Node) -> Result<(), ParseError> {
        if self.stack.len() >= MAX_DEPTH {
            return Err(ParseError::TooDeep);
        }
        let id = self.attach(node)?;
        self.stack.push(id);
        Ok(())
    }

    fn key(&mut self, key: String) -> Result<(), ParseError> {
        let Some(&top) = self.stack.last() else {
            return Err(ParseError::KeyOutsideMap(key));
        };
        let Node::Map(entries) = &mut self.nodes[top] else {
            return Err(ParseError::KeyOutsideMap(key));
        };

        if let Some((pending, None)) = entries.last() {
            return Err(ParseError::KeyWithoutValue(pending.clone()));
        }
        if entries.iter().any(|(k, _)| *k == key) {
            return Err(ParseError::DuplicateKey(key));
        }

        entries.push((key, None));
        Ok(())
    }

    fn close_map(&mut self) -> Result<(), ParseError> {
        let top = self.stack.pop().ok_or(ParseError::UnbalancedClose)?;
        match &self.nodes[top] {
            Node::Map(entries) => match entries.last() {
                Some((pending, None)) => Err(ParseError::KeyWithoutValue(pending.clone())),
                _ => Ok(()),
            },
            _ => Err(ParseError::UnbalancedClose),
        }
    }

    fn close_array(&mut self) -> Result<(), ParseError> {
        let top = self.stack.pop().ok_or(ParseError::UnbalancedClose)?;
        match &self.nodes[top] {
            Node::Array(_) => Ok(()),
            _ => Err(ParseError::UnbalancedClose),
        }
    }

    /// Moves the subtree rooted at `id` out of the arena.
    fn take(&mut self, id: NodeId) -> Result<Document, ParseError> {
        match mem::replace(&mut self.nodes[id], Node::Scalar(Document::Null)) {
            Node::Scalar(doc) => Ok(doc),
            Node::Map(entries) => {
                let mut map = Map::new();
                for (key, value) in entries {
                    let value = value.ok_or_else(|| ParseError::KeyWithoutValue(key.clone()))?;
                    let value = self.take(value)?;
                    map.insert(key, value)?;
                }
                Ok(Document::Map(map))
            }
            Node::Array(children) => children
                .into_iter()
                .map(|child| self.take(child))
                .collect::<Result<Vec<_>, _>>()
                .map(Document::Array),
        }
    }
}

impl Handler for Builder {
    fn handle(&mut self, event: Event) -> Result<(), ParseError> {
        match event {
            Event::StartMap => self.open(Node::Map(Vec::new())),
            Event::StartArray => self.open(Node::Array(Vec::new())),
            Event::EndMap => self.close_map(),
            Event::EndArray => self.close_array(),
            Event::Key(key) => self.key(key),
            Event::Null => self.attach(Node::Scalar(Document::Null)).map(drop),
            Event::Bool(b) => self.attach(Node::Scalar(Document::Bool(b))).map(drop),
            Event::Integer(i) => self.attach(Node::Scalar(Document::Integer(i))).map(drop),
            Event::Double(d) => self.attach(Node::Scalar(Document::Double(d))).map(drop),
            Event::String(s) => self.attach(Node::Scalar(Document::String(s))).map(drop),
        }
    }
}
