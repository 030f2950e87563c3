//! This module provides the `ProgramLoader` struct, responsible for loading machine
//! programs from files, directories and strings.

use crate::parser::{parse, parse_with_logger};
use crate::types::{ParsedProgram, TuringMachineError, MAX_PROGRAM_SIZE, PROGRAM_EXTENSION};
use slog::Logger;
use std::fs;
use std::path::{Path, PathBuf};

/// `ProgramLoader` is a utility struct for loading machine programs.
pub struct ProgramLoader;

impl ProgramLoader {
    /// Loads a single program from the specified file path.
    ///
    /// # Returns
    ///
    /// * `Ok(ParsedProgram)` if the file is read and parsed successfully.
    /// * `Err(TuringMachineError::FileError)` if the file cannot be read or exceeds
    ///   [`MAX_PROGRAM_SIZE`].
    /// * `Err(TuringMachineError::Load)` if the content is not a valid program.
    pub fn load_program(path: &Path) -> Result<ParsedProgram, TuringMachineError> {
        Self::load_program_with_logger(path, None)
    }

    /// Same as [`ProgramLoader::load_program`], passing `logger` on to the parser.
    pub fn load_program_with_logger<L>(
        path: &Path,
        logger: L,
    ) -> Result<ParsedProgram, TuringMachineError>
    where
        L: Into<Option<Logger>>,
    {
        let content = fs::read_to_string(path).map_err(|e| {
            TuringMachineError::FileError(format!("Failed to read file {}: {}", path.display(), e))
        })?;

        if content.len() > MAX_PROGRAM_SIZE {
            return Err(TuringMachineError::FileError(format!(
                "File {} is larger than {} bytes",
                path.display(),
                MAX_PROGRAM_SIZE
            )));
        }

        Ok(parse_with_logger(&content, logger)?)
    }

    /// Loads a single program from the provided string content.
    pub fn load_program_from_string(content: &str) -> Result<ParsedProgram, TuringMachineError> {
        Ok(parse(content)?)
    }

    /// Loads every program file (`.tm` extension) in a directory.
    ///
    /// Directories and files with other extensions are skipped. Each element of the result
    /// is either the path and its parsed program or the error that loading it produced.
    pub fn load_programs(
        directory: &Path,
    ) -> Vec<Result<(PathBuf, ParsedProgram), TuringMachineError>> {
        let entries = match fs::read_dir(directory) {
            Ok(entries) => entries,
            Err(e) => {
                return vec![Err(TuringMachineError::FileError(format!(
                    "Failed to read directory {}: {}",
                    directory.display(),
                    e
                )))]
            }
        };

        let mut results: Vec<_> = entries
            .filter_map(|entry| {
                let path = match entry {
                    Ok(entry) => entry.path(),
                    Err(e) => {
                        return Some(Err(TuringMachineError::FileError(format!(
                            "Failed to read directory entry: {}",
                            e
                        ))))
                    }
                };

                if path.is_dir() || path.extension().is_none_or(|ext| ext != PROGRAM_EXTENSION) {
                    return None;
                }

                Some(Self::load_program(&path).map(|program| (path, program)))
            })
            .collect();

        // Directory order is platform dependent
        results.sort_by(|a, b| match (a, b) {
            (Ok((a, _)), Ok((b, _))) => a.cmp(b),
            (Ok(_), Err(_)) => std::cmp::Ordering::Less,
            (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
            (Err(_), Err(_)) => std::cmp::Ordering::Equal,
        });

        results
    }
}
