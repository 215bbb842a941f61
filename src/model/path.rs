//! SymbolPath: the result of a path search.

use serde::{Deserialize, Serialize};

use super::SymbolId;
use crate::Error;

/// Symbols from a start to a target, both inclusive.
///
/// Never empty: a path to the start itself holds one symbol. Serialized as
/// the plain id sequence; an empty sequence is rejected on the way in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<SymbolId>", into = "Vec<SymbolId>")]
pub struct SymbolPath {
    symbols: Vec<SymbolId>,
}

impl SymbolPath {
    pub fn single(start: SymbolId) -> Self {
        Self { symbols: vec![start] }
    }

    /// Number of hops.
    pub fn len(&self) -> usize {
        self.symbols.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn start(&self) -> SymbolId {
        *self.symbols.first().expect("SymbolPath always has at least one symbol")
    }

    pub fn end(&self) -> SymbolId {
        *self.symbols.last().expect("SymbolPath always has at least one symbol")
    }

    pub fn contains(&self, id: SymbolId) -> bool {
        self.symbols.contains(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = SymbolId> + '_ {
        self.symbols.iter().copied()
    }

    pub fn as_slice(&self) -> &[SymbolId] {
        &self.symbols
    }
}

impl TryFrom<Vec<SymbolId>> for SymbolPath {
    type Error = Error;

    fn try_from(symbols: Vec<SymbolId>) -> Result<Self, Error> {
        if symbols.is_empty() {
            return Err(Error::EmptyPath);
        }
        Ok(Self { symbols })
    }
}

impl From<SymbolPath> for Vec<SymbolId> {
    fn from(path: SymbolPath) -> Self {
        path.symbols
    }
}
