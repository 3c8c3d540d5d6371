//! Depth-first traversal of nested GPMF records.

use crate::{support::iso8859_1, Mp4Error};

use super::{Element, Record, Records};

/// Leaf record with the keys of its ancestors,
/// outermost first, e.g. `[DEVC, STRM]` for `GPSU`.
#[derive(Debug, Clone, PartialEq)]
pub struct Node<'a> {
    pub record: Record<'a>,
    pub parents: Vec<[u8; 4]>,
}

impl <'a> Node<'a> {
    pub fn key(&self) -> [u8; 4] {
        self.record.key()
    }

    /// Nesting depth, 0 for top level records.
    pub fn depth(&self) -> usize {
        self.parents.len()
    }

    /// Key path as string, e.g. `DEVC/STRM/GPSU`.
    pub fn path(&self) -> String {
        self.parents.iter()
            .chain(std::iter::once(&self.record.header.key))
            .map(|k| iso8859_1(k, false))
            .collect::<Vec<_>>()
            .join("/")
    }
}

/// Pre-order, depth-first iterator over all leaf records
/// in a GPMF buffer. Nested records are descended into,
/// not yielded.
///
/// Traversal state is owned by the walker,
/// so concurrent walks over the same buffer are independent.
/// Stops after yielding the first decode error.
#[derive(Debug, Clone)]
pub struct Walker<'a> {
    stack: Vec<Records<'a>>,
    parents: Vec<[u8; 4]>,
}

impl <'a> Walker<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            stack: vec![Records::new(data)],
            parents: Vec::new(),
        }
    }
}

impl <'a> Iterator for Walker<'a> {
    type Item = Result<Node<'a>, Mp4Error>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let records = self.stack.last_mut()?;
            match records.next() {
                None => {
                    self.stack.pop();
                    self.parents.pop();
                },
                Some(Err(err)) => {
                    self.stack.clear();
                    return Some(Err(err))
                },
                Some(Ok(record)) => match record.element() {
                    Element::Nested(children) => {
                        self.parents.push(record.key());
                        self.stack.push(children);
                    },
                    Element::Value(record) => return Some(Ok(Node {
                        record,
                        parents: self.parents.clone()
                    }))
                }
            }
        }
    }
}

/// Walks all leaf records in `data`.
pub fn walk(data: &[u8]) -> Walker<'_> {
    Walker::new(data)
}
