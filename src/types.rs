//! This module defines the core data structures and types used throughout the interpreter,
//! including the machine program representation, instructions, warnings and error types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

use crate::Rule;

/// A single tape symbol.
pub type Symbol = char;
/// Identifier of a state in the transition table.
pub type StateId = u32;

/// The identifier of the state every machine starts in.
pub const INITIAL_STATE: StateId = 0;
/// The maximum allowed size for a program file in bytes.
pub const MAX_PROGRAM_SIZE: usize = 65536; // 64KB
/// File extension of program files picked up by directory loading.
pub const PROGRAM_EXTENSION: &str = "tm";

/// Represents the possible directions the head can move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// Move the head one cell to the left.
    Left,
    /// Move the head one cell to the right.
    Right,
}

impl Direction {
    /// Offset applied to the head position.
    pub fn offset(self) -> i64 {
        match self {
            Direction::Left => -1,
            Direction::Right => 1,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Left => f.write_str("LEFT"),
            Direction::Right => f.write_str("RIGHT"),
        }
    }
}

/// Where an instruction sends the machine next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Target {
    /// Continue in another state.
    State(StateId),
    /// Terminate the run.
    Halt,
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::State(id) => write!(f, "{id}"),
            Target::Halt => f.write_str("HALT"),
        }
    }
}

/// A single transition rule of a state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    /// The symbol that must be under the head.
    pub read: Symbol,
    /// The symbol written into the current cell.
    pub write: Symbol,
    /// The direction the head moves after writing.
    pub direction: Direction,
    /// The state entered after moving.
    pub next: Target,
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "READ {} WRITE {} MOVE {} NEXT {}",
            self.read, self.write, self.direction, self.next
        )
    }
}

/// The instructions of one state, kept in declaration order with at most one
/// instruction per read symbol.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct State {
    instructions: Vec<Instruction>,
}

impl State {
    /// Adds an instruction unless one for the same read symbol already exists.
    ///
    /// Returns `false` when the instruction was discarded.
    pub(crate) fn insert(&mut self, instruction: Instruction) -> bool {
        if self.instruction(instruction.read).is_some() {
            return false;
        }

        self.instructions.push(instruction);
        true
    }

    /// Returns the instruction handling `read`, if any.
    pub fn instruction(&self, read: Symbol) -> Option<&Instruction> {
        self.instructions.iter().find(|i| i.read == read)
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}

/// The declared tape alphabet. The first declared symbol is the blank symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Alphabet {
    symbols: Vec<Symbol>,
}

impl Alphabet {
    /// Builds an alphabet from declared symbols, dropping repeated declarations.
    ///
    /// Returns `None` for an empty declaration.
    pub(crate) fn new(declared: impl IntoIterator<Item = Symbol>) -> Option<Self> {
        let mut symbols = Vec::new();
        for symbol in declared {
            if !symbols.contains(&symbol) {
                symbols.push(symbol);
            }
        }

        (!symbols.is_empty()).then_some(Self { symbols })
    }

    pub fn blank(&self) -> Symbol {
        self.symbols[0]
    }

    pub fn contains(&self, symbol: Symbol) -> bool {
        self.symbols.contains(&symbol)
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

/// A fully validated machine description.
///
/// Only the parser constructs it; once built it is never modified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MachineProgram {
    alphabet: Alphabet,
    states: BTreeMap<StateId, State>,
    initial_tape: Vec<Symbol>,
}

impl MachineProgram {
    pub(crate) fn new(
        alphabet: Alphabet,
        states: BTreeMap<StateId, State>,
        initial_tape: Vec<Symbol>,
    ) -> Self {
        Self {
            alphabet,
            states,
            initial_tape,
        }
    }

    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    /// Returns the blank symbol of the program's alphabet.
    pub fn blank(&self) -> Symbol {
        self.alphabet.blank()
    }

    pub fn states(&self) -> &BTreeMap<StateId, State> {
        &self.states
    }

    pub fn state(&self, id: StateId) -> Option<&State> {
        self.states.get(&id)
    }

    /// Looks up the instruction for `read` in state `id`.
    pub fn instruction(&self, id: StateId, read: Symbol) -> Option<&Instruction> {
        self.state(id).and_then(|state| state.instruction(read))
    }

    pub fn initial_tape(&self) -> &[Symbol] {
        &self.initial_tape
    }

    /// Total number of instructions across all states.
    pub fn instruction_count(&self) -> usize {
        self.states.values().map(State::len).sum()
    }
}

/// The result of a successful load: the program plus every non-fatal warning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedProgram {
    pub program: MachineProgram,
    pub warnings: Vec<Warning>,
}

/// Non-fatal findings collected while loading a program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
pub enum Warning {
    /// A state already has an instruction for this read symbol; the later one is ignored.
    #[error("line {line}: state {state} already has an instruction reading '{symbol}', ignoring redefinition")]
    ConflictingInstruction {
        line: usize,
        state: StateId,
        symbol: Symbol,
    },
    /// A state number was declared by more than one block; the blocks are merged.
    #[error("line {line}: state {state} is already declared, merging instructions")]
    DuplicateState { line: usize, state: StateId },
    /// A declared state can never be entered from state 0.
    #[error("state {state} is unreachable from state 0")]
    UnreachableState { state: StateId },
    /// No initial tape was given; the tape starts as a single blank cell.
    #[error("no initial tape given, defaulting to a tape of blanks")]
    NoInitialTape,
}

/// Fatal errors raised while loading a program.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoadError {
    /// A line does not have the expected shape.
    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },
    /// A symbol was used that the `SYMBOLS` section does not declare.
    #[error("line {line}: '{symbol}' is not a declared symbol")]
    UndeclaredSymbol { line: usize, symbol: String },
    /// A `MOVE` value other than `LEFT` or `RIGHT`.
    #[error("line {line}: '{direction}' is not a valid direction, expected LEFT or RIGHT")]
    InvalidDirection { line: usize, direction: String },
    /// A `NEXT` target that no `STATE` block declares.
    #[error("line {line}: jump to undefined state {state}")]
    UndefinedState { line: usize, state: StateId },
    /// The program has no `STATE 0` block.
    #[error("missing STATE 0")]
    MissingInitialState,
    /// The input could not be tokenized.
    #[error("grammar error: {0}")]
    Grammar(#[from] Box<pest::error::Error<Rule>>),
}

impl LoadError {
    pub(crate) fn syntax(line: usize, message: impl Into<String>) -> Self {
        LoadError::Syntax {
            line,
            message: message.into(),
        }
    }

    /// The 1-based source line the error refers to, if it has one.
    pub fn line(&self) -> Option<usize> {
        match self {
            LoadError::Syntax { line, .. }
            | LoadError::UndeclaredSymbol { line, .. }
            | LoadError::InvalidDirection { line, .. }
            | LoadError::UndefinedState { line, .. } => Some(*line),
            LoadError::Grammar(e) => match e.line_col {
                pest::error::LineColLocation::Pos((line, _))
                | pest::error::LineColLocation::Span((line, _), _) => Some(line),
            },
            LoadError::MissingInitialState => None,
        }
    }
}

/// Represents the outcome of a single execution step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// The machine performed a step and continues execution.
    Continue,
    /// The machine has reached HALT.
    Halt,
}

/// Represents the errors that can occur while loading or running a machine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TuringMachineError {
    /// Loading the program failed.
    #[error("Program load error: {0}")]
    Load(#[from] LoadError),
    /// The current state has no instruction for the symbol under the head.
    #[error("State {state} has no instruction reading '{symbol}' (step {step}, position {position})")]
    UndefinedTransition {
        state: StateId,
        symbol: Symbol,
        step: u64,
        position: i64,
    },
    /// The machine did not halt within the allowed number of steps.
    #[error("Machine did not halt within {0} steps")]
    StepLimitExceeded(u64),
    /// Reading program files failed.
    #[error("File error: {0}")]
    FileError(String),
    /// A request did not fit the program, e.g. a tape with undeclared symbols.
    #[error("Validation error: {0}")]
    ValidationError(String),
}
