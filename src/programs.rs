//! Sample programs bundled with the library.

use crate::parser::parse;
use crate::types::{ParsedProgram, StateId, Symbol, TuringMachineError};

// Embedded program sources, by name
const PROGRAM_TEXTS: [(&str, &str); 4] = [
    ("inverter", include_str!("../programs/inverter.tm")),
    ("binary-increment", include_str!("../programs/binary-increment.tm")),
    ("busy-beaver-2", include_str!("../programs/busy-beaver-2.tm")),
    ("unary-addition", include_str!("../programs/unary-addition.tm")),
];

lazy_static::lazy_static! {
    /// The bundled programs, parsed once on first use. The sources are compiled in, so a
    /// parse failure is a bug in the crate itself.
    pub static ref PROGRAMS: Vec<(&'static str, ParsedProgram)> = PROGRAM_TEXTS
        .iter()
        .map(|&(name, text)| match parse(text) {
            Ok(program) => (name, program),
            Err(e) => panic!("Bundled program '{name}' is invalid: {e}"),
        })
        .collect();
}

pub struct ProgramManager;

impl ProgramManager {
    /// Get the number of available programs
    pub fn count() -> usize {
        PROGRAMS.len()
    }

    /// List all program names
    pub fn list_program_names() -> Vec<&'static str> {
        PROGRAMS.iter().map(|(name, _)| *name).collect()
    }

    /// Get a program by its name
    pub fn get_program_by_name(name: &str) -> Result<&'static ParsedProgram, TuringMachineError> {
        PROGRAMS
            .iter()
            .find(|(candidate, _)| *candidate == name)
            .map(|(_, program)| program)
            .ok_or_else(|| TuringMachineError::ValidationError(format!("Program '{name}' not found")))
    }

    /// Get the original text of a program by its name
    pub fn get_program_text_by_name(name: &str) -> Result<&'static str, TuringMachineError> {
        PROGRAM_TEXTS
            .iter()
            .find(|(candidate, _)| *candidate == name)
            .map(|(_, text)| *text)
            .ok_or_else(|| TuringMachineError::ValidationError(format!("Program '{name}' not found")))
    }

    /// Get summary information about a program by its name
    pub fn get_program_info(name: &str) -> Result<ProgramInfo, TuringMachineError> {
        let program = &Self::get_program_by_name(name)?.program;

        Ok(ProgramInfo {
            name: name.to_string(),
            alphabet: program.alphabet().symbols().to_vec(),
            states: program.states().keys().copied().collect(),
            instruction_count: program.instruction_count(),
            initial_tape: program.initial_tape().iter().collect(),
        })
    }

    /// Search for programs whose name contains `query`, ignoring case
    pub fn search_programs(query: &str) -> Vec<&'static str> {
        let query = query.to_lowercase();

        PROGRAMS
            .iter()
            .map(|(name, _)| *name)
            .filter(|name| name.to_lowercase().contains(&query))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramInfo {
    pub name: String,
    pub alphabet: Vec<Symbol>,
    pub states: Vec<StateId>,
    pub instruction_count: usize,
    pub initial_tape: String,
}
