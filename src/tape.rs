//! A sparse, unbounded tape.

use crate::types::Symbol;
use std::collections::BTreeMap;
use std::fmt;

/// An infinite tape in both directions.
///
/// Only written cells are stored; every other cell reads as the blank symbol. The tape
/// remembers the leftmost and rightmost offsets ever visited, which bound what
/// [`Tape::symbols`] returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tape {
    cells: BTreeMap<i64, Symbol>,
    blank: Symbol,
    leftmost: i64,
    rightmost: i64,
}

impl Tape {
    /// Creates a tape holding `initial` at offsets `0..initial.len()`.
    pub fn new(initial: &[Symbol], blank: Symbol) -> Self {
        let cells = initial
            .iter()
            .enumerate()
            .map(|(offset, &symbol)| (offset as i64, symbol))
            .collect();

        Self {
            cells,
            blank,
            leftmost: 0,
            rightmost: (initial.len() as i64 - 1).max(0),
        }
    }

    /// Returns the symbol at `position`, or the blank symbol for an unwritten cell.
    pub fn read(&self, position: i64) -> Symbol {
        self.cells.get(&position).copied().unwrap_or(self.blank)
    }

    pub fn write(&mut self, position: i64, symbol: Symbol) {
        self.visit(position);
        self.cells.insert(position, symbol);
    }

    /// Marks `position` as visited, widening the observable range.
    pub fn visit(&mut self, position: i64) {
        self.leftmost = self.leftmost.min(position);
        self.rightmost = self.rightmost.max(position);
    }

    pub fn blank(&self) -> Symbol {
        self.blank
    }

    /// The inclusive range of offsets ever visited.
    pub fn bounds(&self) -> (i64, i64) {
        (self.leftmost, self.rightmost)
    }

    /// Returns every cell from the leftmost to the rightmost visited offset.
    pub fn symbols(&self) -> Vec<Symbol> {
        (self.leftmost..=self.rightmost)
            .map(|position| self.read(position))
            .collect()
    }
}

impl fmt::Display for Tape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.symbols()
            .into_iter()
            .try_for_each(|symbol| write!(f, "{symbol}"))
    }
}
