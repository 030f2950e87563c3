//! This module provides the parser for machine description files, utilizing the `pest` crate.
//! The grammar in `grammar.pest` splits the text into lines of tokens separated by any
//! Unicode whitespace other than a line break; this module reads the three sections
//! (symbols, state table, initial tape) in order and validates each one before moving on.

use crate::{
    analyzer::{analyze, Reference},
    types::{
        Alphabet, Direction, Instruction, LoadError, MachineProgram, ParsedProgram, State,
        StateId, Symbol, Target, Warning,
    },
};
use pest::Parser as PestParser;
use pest_derive::Parser as PestParser;
use slog::{debug, o, Discard, Logger};
use std::{collections::BTreeMap, iter::Peekable, slice::Iter};

const SYMBOLS: &str = "SYMBOLS";
const END: &str = "END";
const STATE: &str = "STATE";
const READ: &str = "READ";
const WRITE: &str = "WRITE";
const MOVE: &str = "MOVE";
const NEXT: &str = "NEXT";
const LEFT: &str = "LEFT";
const RIGHT: &str = "RIGHT";
const HALT: &str = "HALT";
const INITIAL: &str = "INITIAL";

const INSTRUCTION_SHAPE: &str = "READ [symbol] WRITE [symbol] MOVE [LEFT|RIGHT] NEXT [number|HALT]";

/// Derives a `PestParser` for the line grammar defined in `grammar.pest`.
#[derive(PestParser)]
#[grammar = "grammar.pest"]
pub struct TuringMachineParser;

/// A non-empty source line with comments removed.
#[derive(Debug)]
struct Line<'a> {
    /// 1-based line number in the original text.
    number: usize,
    tokens: Vec<&'a str>,
}

impl Line<'_> {
    /// Whether the line consists of exactly the given keyword.
    fn is(&self, keyword: &str) -> bool {
        matches!(self.tokens.as_slice(), [token] if *token == keyword)
    }

    fn text(&self) -> String {
        self.tokens.join(" ")
    }
}

type Lines<'a, 'b> = Peekable<Iter<'b, Line<'a>>>;

/// Parses the given program text into a validated [`MachineProgram`].
///
/// This is the main entry point for loading programs. Warnings are returned next to the
/// program; the first fatal problem aborts loading.
///
/// # Returns
///
/// * `Ok(ParsedProgram)` if the text describes a valid machine.
/// * `Err(LoadError)` naming the offending line otherwise.
pub fn parse(input: &str) -> Result<ParsedProgram, LoadError> {
    parse_with_logger(input, None)
}

/// Same as [`parse`], reporting progress and warnings to `logger`.
pub fn parse_with_logger<L>(input: &str, logger: L) -> Result<ParsedProgram, LoadError>
where
    L: Into<Option<Logger>>,
{
    let logger = logger
        .into()
        .unwrap_or_else(|| Logger::root(Discard, o!()));

    let lines = tokenize(input)?;
    // Errors about a missing terminator point at the last line
    let eof = input.lines().count().max(1);
    let mut lines = lines.iter().peekable();
    let mut warnings = Vec::new();

    let alphabet = parse_symbols(&mut lines, eof)?;
    debug!(logger, "parsed symbols"; "count" => alphabet.len(), "blank" => %alphabet.blank());

    let (states, references) = parse_state_table(&mut lines, &alphabet, eof, &mut warnings)?;
    let unreachable = analyze(&states, &references)?;
    warnings.extend(
        unreachable
            .into_iter()
            .map(|state| Warning::UnreachableState { state }),
    );
    debug!(logger, "parsed state table"; "states" => states.len(), "references" => references.len());

    let initial_tape = parse_initial_tape(&mut lines, &alphabet, &mut warnings)?;
    debug!(logger, "parsed initial tape"; "cells" => initial_tape.len());

    for warning in &warnings {
        slog::warn!(logger, "{}", warning);
    }

    Ok(ParsedProgram {
        program: MachineProgram::new(alphabet, states, initial_tape),
        warnings,
    })
}

/// Splits the input into non-empty lines of tokens.
fn tokenize(input: &str) -> Result<Vec<Line<'_>>, LoadError> {
    let root = TuringMachineParser::parse(Rule::program, input)
        .map_err(Box::new)?
        .next()
        .ok_or_else(|| LoadError::syntax(1, "empty input"))?;

    Ok(root
        .into_inner()
        .filter(|pair| pair.as_rule() == Rule::line)
        .map(|pair| Line {
            number: pair.as_span().start_pos().line_col().0,
            tokens: pair.into_inner().map(|token| token.as_str()).collect(),
        })
        .collect())
}

/// Reads the `SYMBOLS` ... `END` section. The first declared symbol becomes the blank.
fn parse_symbols(lines: &mut Lines, eof: usize) -> Result<Alphabet, LoadError> {
    match lines.next() {
        Some(line) if line.is(SYMBOLS) => {}
        Some(line) => {
            return Err(LoadError::syntax(
                line.number,
                format!("file should start with '{SYMBOLS}', not '{}'", line.text()),
            ))
        }
        None => return Err(LoadError::syntax(eof, format!("expected '{SYMBOLS}'"))),
    }

    let mut declared = Vec::new();
    let end = loop {
        let line = lines.next().ok_or_else(|| {
            LoadError::syntax(eof, format!("expected '{END}' to end the {SYMBOLS} block"))
        })?;

        if line.is(END) {
            break line.number;
        }

        let symbol = match line.tokens.as_slice() {
            [token] => single_char(token),
            _ => None,
        }
        .ok_or_else(|| {
            LoadError::syntax(
                line.number,
                format!("symbols should be 1 character long, not '{}'", line.text()),
            )
        })?;

        declared.push(symbol);
    };

    Alphabet::new(declared).ok_or_else(|| LoadError::syntax(end, "empty symbols list"))
}

/// Reads every `STATE <n>` ... `END` block, merging blocks that share a number.
///
/// Integer `NEXT` targets are returned as references so they can be checked once all
/// blocks are known.
fn parse_state_table(
    lines: &mut Lines,
    alphabet: &Alphabet,
    eof: usize,
    warnings: &mut Vec<Warning>,
) -> Result<(BTreeMap<StateId, State>, Vec<Reference>), LoadError> {
    let mut states: BTreeMap<StateId, State> = BTreeMap::new();
    let mut references = Vec::new();

    while let Some(header) = lines.next_if(|line| line.tokens.first() == Some(&STATE)) {
        let id = parse_state_header(header)?;

        if states.contains_key(&id) {
            warnings.push(Warning::DuplicateState {
                line: header.number,
                state: id,
            });
        }

        let state: &mut State = states.entry(id).or_default();
        loop {
            let line = lines.next().ok_or_else(|| {
                LoadError::syntax(eof, format!("expected '{END}' to end the block for state {id}"))
            })?;

            if line.is(END) {
                break;
            }

            let instruction = parse_instruction(line, alphabet)?;
            if let Target::State(target) = instruction.next {
                references.push(Reference {
                    line: line.number,
                    state: target,
                });
            }

            let read = instruction.read;
            if !state.insert(instruction) {
                warnings.push(Warning::ConflictingInstruction {
                    line: line.number,
                    state: id,
                    symbol: read,
                });
            }
        }
    }

    Ok((states, references))
}

fn parse_state_header(line: &Line) -> Result<StateId, LoadError> {
    match line.tokens.as_slice() {
        [STATE, number] => parse_state_id(number).ok_or_else(|| {
            LoadError::syntax(
                line.number,
                format!("states should have a number, not '{number}'"),
            )
        }),
        _ => Err(LoadError::syntax(
            line.number,
            format!("state headers should look like '{STATE} [number]'"),
        )),
    }
}

/// Parses one `READ a WRITE b MOVE LEFT NEXT 1` line.
fn parse_instruction(line: &Line, alphabet: &Alphabet) -> Result<Instruction, LoadError> {
    let (read, write, direction, next) = match line.tokens.as_slice() {
        [READ, read, WRITE, write, MOVE, direction, NEXT, next] => (*read, *write, *direction, *next),
        _ => {
            return Err(LoadError::syntax(
                line.number,
                format!("instructions should look like '{INSTRUCTION_SHAPE}'"),
            ))
        }
    };

    let read = parse_declared_symbol(read, line.number, alphabet)?;
    let write = parse_declared_symbol(write, line.number, alphabet)?;

    let direction = match direction {
        LEFT => Direction::Left,
        RIGHT => Direction::Right,
        other => {
            return Err(LoadError::InvalidDirection {
                line: line.number,
                direction: other.to_string(),
            })
        }
    };

    let next = match next {
        HALT => Target::Halt,
        other => Target::State(parse_state_id(other).ok_or_else(|| {
            LoadError::syntax(
                line.number,
                format!("the next state should be a number or {HALT}, not '{other}'"),
            )
        })?),
    };

    Ok(Instruction {
        read,
        write,
        direction,
        next,
    })
}

/// Reads the optional `INITIAL` line. Anything after it is ignored.
fn parse_initial_tape(
    lines: &mut Lines,
    alphabet: &Alphabet,
    warnings: &mut Vec<Warning>,
) -> Result<Vec<Symbol>, LoadError> {
    let Some(line) = lines.next() else {
        warnings.push(Warning::NoInitialTape);
        return Ok(vec![alphabet.blank()]);
    };

    let rest = line.tokens[0].strip_prefix(INITIAL).ok_or_else(|| {
        LoadError::syntax(
            line.number,
            format!("expected '{STATE}' or '{INITIAL}', not '{}'", line.text()),
        )
    })?;

    let tape: Vec<Symbol> = std::iter::once(rest)
        .chain(line.tokens[1..].iter().copied())
        .flat_map(str::chars)
        .collect();

    if let Some(symbol) = tape.iter().find(|symbol| !alphabet.contains(**symbol)) {
        return Err(LoadError::UndeclaredSymbol {
            line: line.number,
            symbol: symbol.to_string(),
        });
    }

    if tape.is_empty() {
        warnings.push(Warning::NoInitialTape);
        return Ok(vec![alphabet.blank()]);
    }

    Ok(tape)
}

fn parse_declared_symbol(
    token: &str,
    line: usize,
    alphabet: &Alphabet,
) -> Result<Symbol, LoadError> {
    single_char(token)
        .filter(|symbol| alphabet.contains(*symbol))
        .ok_or_else(|| LoadError::UndeclaredSymbol {
            line,
            symbol: token.to_string(),
        })
}

/// Accepts plain decimal digits only, so `+1` or `-0` are rejected.
fn parse_state_id(token: &str) -> Option<StateId> {
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    token.parse().ok()
}

fn single_char(token: &str) -> Option<Symbol> {
    let mut chars = token.chars();
    let symbol = chars.next()?;
    chars.next().is_none().then_some(symbol)
}

#[cfg(test)]
mod tests {
    use super::*;

    const INVERTER: &str = r#"
SYMBOLS
_ ;; blank
0
1
END

STATE 0
READ 0 WRITE 1 MOVE RIGHT NEXT 0
READ 1 WRITE 0 MOVE RIGHT NEXT 0
READ _ WRITE _ MOVE LEFT NEXT 1
END

STATE 1
READ 0 WRITE 0 MOVE LEFT NEXT 1
READ 1 WRITE 1 MOVE LEFT NEXT 1
READ _ WRITE _ MOVE RIGHT NEXT HALT
END

INITIAL 10 01 10
"#;

    fn parse_err(input: &str) -> LoadError {
        parse(input).unwrap_err()
    }

    #[test]
    fn test_parse_inverter() {
        let parsed = parse(INVERTER).unwrap();
        let program = &parsed.program;

        assert!(parsed.warnings.is_empty());
        assert_eq!(program.alphabet().symbols(), &['_', '0', '1']);
        assert_eq!(program.blank(), '_');
        assert_eq!(program.initial_tape(), &['1', '0', '0', '1', '1', '0']);
        assert_eq!(program.states().len(), 2);
        assert_eq!(program.instruction_count(), 6);
        assert_eq!(
            program.instruction(1, '_'),
            Some(&Instruction {
                read: '_',
                write: '_',
                direction: Direction::Right,
                next: Target::Halt,
            })
        );
    }

    #[test]
    fn test_parse_is_deterministic() {
        assert_eq!(parse(INVERTER).unwrap(), parse(INVERTER).unwrap());
    }

    #[test]
    fn test_parsed_program_serializes() {
        let json = serde_json::to_value(parse(INVERTER).unwrap()).unwrap();

        assert_eq!(
            json["program"]["alphabet"]["symbols"],
            serde_json::json!(["_", "0", "1"])
        );
        assert_eq!(
            json["program"]["initial_tape"],
            serde_json::json!(["1", "0", "0", "1", "1", "0"])
        );
        assert_eq!(
            json["program"]["states"]["1"]["instructions"][2],
            serde_json::json!({"read": "_", "write": "_", "direction": "Right", "next": "Halt"})
        );
        assert_eq!(json["warnings"], serde_json::json!([]));
    }

    #[test]
    fn test_duplicate_symbols_are_collapsed() {
        let input = "SYMBOLS\n_\na\n_\na\nb\nEND\nSTATE 0\nREAD a WRITE b MOVE LEFT NEXT HALT\nEND\nINITIAL a";
        let parsed = parse(input).unwrap();
        assert_eq!(parsed.program.alphabet().len(), 3);
        assert!(parsed.warnings.is_empty());
    }

    #[test]
    fn test_multi_character_symbol() {
        let error = parse_err("SYMBOLS\n_\nab\nEND\n");
        assert_eq!(
            error,
            LoadError::Syntax {
                line: 3,
                message: "symbols should be 1 character long, not 'ab'".into(),
            }
        );
    }

    #[test]
    fn test_symbol_with_trailing_comment() {
        let parsed = parse("SYMBOLS\nx   ;; blank\ny;;other\nEND\nSTATE 0\nEND\n").unwrap();
        assert_eq!(parsed.program.alphabet().symbols(), &['x', 'y']);
    }

    #[test]
    fn test_unicode_whitespace_separates_tokens() {
        let input = "SYMBOLS\n_\u{a0}\na\u{2003};; em space\nEND\nSTATE 0\u{a0}1\nEND\n";
        assert!(matches!(parse_err(input), LoadError::Syntax { line: 5, .. }));

        let input = "SYMBOLS\n_\u{a0}\na\nEND\nSTATE\u{a0}0\nREAD\u{3000}a WRITE _ MOVE RIGHT NEXT HALT\nEND\n";
        let parsed = parse(input).unwrap();
        assert_eq!(parsed.program.alphabet().symbols(), &['_', 'a']);
        assert_eq!(parsed.program.instruction_count(), 1);
    }

    #[test]
    fn test_missing_symbols_header() {
        let error = parse_err(";; nothing here\nSTATE 0\nEND\n");
        assert!(matches!(error, LoadError::Syntax { line: 2, .. }));

        let error = parse_err("");
        assert!(matches!(error, LoadError::Syntax { .. }));
    }

    #[test]
    fn test_unterminated_symbols() {
        let error = parse_err("SYMBOLS\n_\n0\n");
        assert!(error.to_string().contains("expected 'END' to end the SYMBOLS block"));
    }

    #[test]
    fn test_empty_symbols() {
        let error = parse_err("SYMBOLS\nEND\n");
        assert_eq!(
            error,
            LoadError::Syntax {
                line: 2,
                message: "empty symbols list".into(),
            }
        );
    }

    #[test]
    fn test_conflicting_instruction_keeps_first() {
        let input = r#"SYMBOLS
_
a
END
STATE 0
READ a WRITE _ MOVE RIGHT NEXT HALT
READ a WRITE a MOVE LEFT NEXT 0
END
"#;
        let parsed = parse(input).unwrap();
        let instruction = parsed.program.instruction(0, 'a').unwrap();
        assert_eq!(instruction.write, '_');
        assert_eq!(parsed.program.state(0).unwrap().len(), 1);
        assert!(parsed.warnings.contains(&Warning::ConflictingInstruction {
            line: 7,
            state: 0,
            symbol: 'a',
        }));
    }

    #[test]
    fn test_duplicate_state_blocks_are_merged() {
        let input = r#"SYMBOLS
_
a
b
END
STATE 0
READ _ WRITE _ MOVE RIGHT NEXT 3
END
STATE 3
READ a WRITE b MOVE RIGHT NEXT 3
END
STATE 3
READ b WRITE a MOVE LEFT NEXT HALT
READ a WRITE a MOVE LEFT NEXT HALT
END
"#;
        let parsed = parse(input).unwrap();
        let state = parsed.program.state(3).unwrap();
        assert_eq!(state.len(), 2);
        assert_eq!(state.instruction('a').unwrap().next, Target::State(3));
        assert_eq!(state.instruction('b').unwrap().next, Target::Halt);
        assert_eq!(
            parsed.warnings,
            vec![
                Warning::DuplicateState { line: 12, state: 3 },
                Warning::ConflictingInstruction {
                    line: 14,
                    state: 3,
                    symbol: 'a',
                },
                Warning::NoInitialTape,
            ]
        );
    }

    #[test]
    fn test_states_in_any_order() {
        let input = "SYMBOLS\n_\nEND\nSTATE 1\nREAD _ WRITE _ MOVE LEFT NEXT HALT\nEND\nSTATE 0\nREAD _ WRITE _ MOVE RIGHT NEXT 1\nEND\nINITIAL _";
        let parsed = parse(input).unwrap();
        assert_eq!(parsed.program.states().len(), 2);
        assert!(parsed.warnings.is_empty());
    }

    #[test]
    fn test_missing_initial_state() {
        let input = "SYMBOLS\n_\nEND\nSTATE 1\nREAD _ WRITE _ MOVE LEFT NEXT 5\nEND\n";
        assert_eq!(parse_err(input), LoadError::MissingInitialState);
    }

    #[test]
    fn test_jump_to_undefined_state() {
        let input = r#"SYMBOLS
_
a
END
STATE 0
READ _ WRITE _ MOVE RIGHT NEXT HALT
END
STATE 1
READ a WRITE a MOVE RIGHT NEXT 7
END
INITIAL _
"#;
        // State 1 is unreachable, the jump is still rejected
        assert_eq!(
            parse_err(input),
            LoadError::UndefinedState { line: 9, state: 7 }
        );
    }

    #[test]
    fn test_jump_from_discarded_instruction_is_checked() {
        let input = "SYMBOLS\n_\nEND\nSTATE 0\nREAD _ WRITE _ MOVE RIGHT NEXT HALT\nREAD _ WRITE _ MOVE RIGHT NEXT 9\nEND\n";
        assert_eq!(
            parse_err(input),
            LoadError::UndefinedState { line: 6, state: 9 }
        );
    }

    #[test]
    fn test_unreachable_state_warning() {
        let input = "SYMBOLS\n_\nEND\nSTATE 0\nREAD _ WRITE _ MOVE RIGHT NEXT HALT\nEND\nSTATE 4\nEND\nINITIAL _";
        let parsed = parse(input).unwrap();
        assert_eq!(parsed.warnings, vec![Warning::UnreachableState { state: 4 }]);
    }

    #[test]
    fn test_malformed_instructions() {
        let cases = [
            "READ a WRITE a MOVE LEFT",
            "READ a WRITE a MOVE LEFT NEXT HALT extra",
            "WRITE a READ a MOVE LEFT NEXT HALT",
            "read a WRITE a MOVE LEFT NEXT HALT",
            "READ a WRITE a MOVE LEFT NEXT -1",
            "READ a WRITE a MOVE LEFT NEXT +1",
            "READ a WRITE a MOVE LEFT NEXT halt",
        ];

        for case in cases {
            let input = format!("SYMBOLS\n_\na\nEND\nSTATE 0\n{case}\nEND\n");
            let error = parse_err(&input);
            assert!(
                matches!(error, LoadError::Syntax { line: 6, .. }),
                "unexpected result for '{case}': {error:?}"
            );
        }
    }

    #[test]
    fn test_undeclared_symbol() {
        for input in [
            "SYMBOLS\n_\na\nEND\nSTATE 0\nREAD a WRITE z MOVE LEFT NEXT HALT\nEND\n",
            "SYMBOLS\n_\na\nEND\nSTATE 0\nREAD z WRITE a MOVE LEFT NEXT HALT\nEND\n",
        ] {
            assert_eq!(
                parse_err(input),
                LoadError::UndeclaredSymbol {
                    line: 6,
                    symbol: "z".into(),
                },
                "{input}"
            );
        }
    }

    #[test]
    fn test_invalid_direction() {
        let input = "SYMBOLS\n_\nEND\nSTATE 0\nREAD _ WRITE _ MOVE UP NEXT HALT\nEND\n";
        assert_eq!(
            parse_err(input),
            LoadError::InvalidDirection {
                line: 5,
                direction: "UP".into(),
            }
        );
    }

    #[test]
    fn test_invalid_state_header() {
        let error = parse_err("SYMBOLS\n_\nEND\nSTATE zero\nEND\n");
        assert_eq!(
            error,
            LoadError::Syntax {
                line: 4,
                message: "states should have a number, not 'zero'".into(),
            }
        );

        for header in ["STATE 0 1", "STATE 99999999999", "STATE"] {
            let input = format!("SYMBOLS\n_\nEND\n{header}\nEND\n");
            assert!(
                matches!(parse_err(&input), LoadError::Syntax { line: 4, .. }),
                "{header}"
            );
        }
    }

    #[test]
    fn test_unterminated_state_block() {
        let error = parse_err("SYMBOLS\n_\nEND\nSTATE 0\nREAD _ WRITE _ MOVE LEFT NEXT HALT\n");
        assert!(error
            .to_string()
            .contains("expected 'END' to end the block for state 0"));
    }

    #[test]
    fn test_initial_tape_ignores_whitespace_and_trailing_content() {
        let input = "SYMBOLS\n_\na\nb\nEND\nSTATE 0\nREAD a WRITE a MOVE LEFT NEXT HALT\nEND\nINITIAL a b\tba  ;; comment\nthis is ignored\nSTATE 9\n";
        let parsed = parse(input).unwrap();
        assert_eq!(parsed.program.initial_tape(), &['a', 'b', 'b', 'a']);
    }

    #[test]
    fn test_initial_tape_with_undeclared_symbol() {
        let input = "SYMBOLS\n_\na\nEND\nSTATE 0\nEND\nINITIAL aax\n";
        assert_eq!(
            parse_err(input),
            LoadError::UndeclaredSymbol {
                line: 7,
                symbol: "x".into(),
            }
        );
    }

    #[test]
    fn test_empty_initial_tape_defaults_to_blank() {
        let input = "SYMBOLS\n#\nEND\nSTATE 0\nEND\nINITIAL\n";
        let parsed = parse(input).unwrap();
        assert_eq!(parsed.program.initial_tape(), &['#']);
        assert_eq!(parsed.warnings, vec![Warning::NoInitialTape]);
    }

    #[test]
    fn test_unexpected_section() {
        let error = parse_err("SYMBOLS\n_\nEND\nSTATE 0\nEND\nTAPE 0\n");
        assert!(matches!(error, LoadError::Syntax { line: 6, .. }));
    }

    #[test]
    fn test_windows_line_endings() {
        let input = INVERTER.replace('\n', "\r\n");
        assert_eq!(parse(&input).unwrap(), parse(INVERTER).unwrap());
    }
}
