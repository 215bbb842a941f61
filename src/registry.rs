//! # Identity Registry
//!
//! Maps a name to exactly one live [`Symbol`]. Symbols live in an arena of
//! generational slots; the name table maps names to slot ids. Nothing in the
//! arena owns anything else in it, so cyclic edges never form ownership
//! cycles.
//!
//! Liveness is explicit: each symbol holds an `Arc<()>` token that is cloned
//! into every [`SymbolRef`] handed out, and the registry never evicts on its
//! own. [`Graph::sweep`](crate::Graph::sweep) decides what to release.

use hashbrown::HashMap;

use crate::model::{Symbol, SymbolId, SymbolRef};

struct Slot {
    generation: u32,
    symbol: Option<Symbol>,
}

/// Arena of symbols plus the name → id table.
#[derive(Default)]
pub struct Registry {
    slots: Vec<Slot>,
    free: Vec<u32>,
    names: HashMap<String, SymbolId>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the live symbol for `name`, creating it if absent.
    /// The flag is `true` when a new symbol was created.
    pub fn intern(&mut self, name: &str) -> (SymbolRef, bool) {
        if let Some(symbol) = self.names.get(name).and_then(|id| self.get(*id)) {
            return (SymbolRef::new(symbol.id, symbol.token.clone()), false);
        }

        let id = match self.free.pop() {
            Some(index) => SymbolId::new(index, self.slots[index as usize].generation),
            None => {
                let index = u32::try_from(self.slots.len()).expect("symbol arena exceeds u32 slots");
                self.slots.push(Slot { generation: 0, symbol: None });
                SymbolId::new(index, 0)
            }
        };
        let symbol = Symbol::new(id, name);
        let handle = SymbolRef::new(id, symbol.token.clone());
        self.slots[id.index() as usize].symbol = Some(symbol);
        self.names.insert(name.to_owned(), id);
        (handle, true)
    }

    /// Id of the live symbol named `name`, without creating one.
    pub fn lookup(&self, name: &str) -> Option<SymbolId> {
        self.names.get(name).copied()
    }

    pub fn get(&self, id: SymbolId) -> Option<&Symbol> {
        self.slots
            .get(id.index() as usize)
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.symbol.as_ref())
    }

    pub fn get_mut(&mut self, id: SymbolId) -> Option<&mut Symbol> {
        self.slots
            .get_mut(id.index() as usize)
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.symbol.as_mut())
    }

    pub fn contains(&self, id: SymbolId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Live symbols in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &Symbol> + '_ {
        self.slots.iter().filter_map(|slot| slot.symbol.as_ref())
    }

    /// Take a symbol out of its slot and free the slot. Edges and index
    /// entries that still mention it are the caller's to sever.
    pub(crate) fn release(&mut self, id: SymbolId) -> Option<Symbol> {
        let slot = self
            .slots
            .get_mut(id.index() as usize)
            .filter(|slot| slot.generation == id.generation())?;
        let symbol = slot.symbol.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index());
        self.names.remove(&symbol.name);
        Some(symbol)
    }
}
