//! This crate provides the core logic for a Turing machine description language.
//! It includes modules for parsing and validating machine programs, simulating their
//! execution on an unbounded tape, loading program files, and a small set of bundled programs.

pub mod analyzer;
pub mod loader;
pub mod machine;
pub mod parser;
pub mod programs;
pub mod tape;
pub mod types;

/// Re-exports the `Rule` enum from the parser module, used by the `pest` grammar.
pub use crate::parser::Rule;
/// Re-exports the `analyze` function and `AnalysisError` enum from the analyzer module.
pub use analyzer::{analyze, AnalysisError};
/// Re-exports the `ProgramLoader` struct from the loader module.
pub use loader::ProgramLoader;
/// Re-exports the `TuringMachine` struct and the `run` function from the machine module.
pub use machine::{run, TuringMachine};
/// Re-exports the parsing entry points from the parser module.
pub use parser::{parse, parse_with_logger};
/// Re-exports `ProgramInfo`, `ProgramManager`, and `PROGRAMS` from the programs module.
pub use programs::{ProgramInfo, ProgramManager, PROGRAMS};
/// Re-exports the `Tape` struct from the tape module.
pub use tape::Tape;
/// Re-exports the data model and error types from the types module.
pub use types::{
    Alphabet, Direction, Instruction, LoadError, MachineProgram, ParsedProgram, State, StateId,
    Step, Symbol, Target, TuringMachineError, Warning, MAX_PROGRAM_SIZE,
};
