//! This module defines the `TuringMachine` struct, which simulates a machine described by a
//! [`MachineProgram`]. It owns the tape, the head position and the current state; the
//! program itself is only ever read.

use crate::tape::Tape;
use crate::types::{
    Instruction, MachineProgram, Step, Symbol, Target, TuringMachineError, INITIAL_STATE,
};
use slog::{debug, o, trace, Discard, Logger};

/// Runs `program` until it halts and returns the final tape.
///
/// There is no step limit: a machine that never reaches HALT never returns. Use
/// [`TuringMachine::run_with_limit`] to bound execution.
pub fn run(program: &MachineProgram) -> Result<Vec<Symbol>, TuringMachineError> {
    let mut machine = TuringMachine::new(program);
    machine.run()?;
    Ok(machine.tape().symbols())
}

/// A single-tape Turing machine executing a [`MachineProgram`].
pub struct TuringMachine<'p> {
    program: &'p MachineProgram,
    state: Target,
    head: i64,
    tape: Tape,
    step_count: u64,
    logger: Logger,
}

impl<'p> TuringMachine<'p> {
    /// Creates a machine in state 0 with the head on the first cell of the initial tape.
    pub fn new(program: &'p MachineProgram) -> Self {
        Self::with_logger(program, None)
    }

    /// Same as [`TuringMachine::new`], tracing every step to `logger`.
    pub fn with_logger<L>(program: &'p MachineProgram, logger: L) -> Self
    where
        L: Into<Option<Logger>>,
    {
        let logger = logger
            .into()
            .unwrap_or_else(|| Logger::root(Discard, o!()));

        Self {
            program,
            state: Target::State(INITIAL_STATE),
            head: 0,
            tape: Tape::new(program.initial_tape(), program.blank()),
            step_count: 0,
            logger,
        }
    }

    /// Executes a single step of the machine.
    ///
    /// # Returns
    ///
    /// * `Ok(Step::Continue)` if the machine moved to another state.
    /// * `Ok(Step::Halt)` if this step entered HALT, or the machine had already halted.
    /// * `Err(TuringMachineError::UndefinedTransition)` if the current state has no
    ///   instruction for the symbol under the head. Nothing is modified in that case.
    pub fn step(&mut self) -> Result<Step, TuringMachineError> {
        let Target::State(state) = self.state else {
            return Ok(Step::Halt);
        };

        let symbol = self.tape.read(self.head);
        let instruction = self.program.instruction(state, symbol).ok_or(
            TuringMachineError::UndefinedTransition {
                state,
                symbol,
                step: self.step_count,
                position: self.head,
            },
        )?;

        trace!(self.logger, "step";
            "step" => self.step_count,
            "state" => state,
            "head" => self.head,
            "instruction" => %instruction
        );

        let Instruction {
            write,
            direction,
            next,
            ..
        } = *instruction;

        self.tape.write(self.head, write);
        self.head += direction.offset();
        self.tape.visit(self.head);
        self.state = next;
        self.step_count += 1;

        match next {
            Target::State(_) => Ok(Step::Continue),
            Target::Halt => {
                debug!(self.logger, "halted"; "steps" => self.step_count, "head" => self.head);
                Ok(Step::Halt)
            }
        }
    }

    /// Runs the machine until it reaches HALT.
    pub fn run(&mut self) -> Result<Step, TuringMachineError> {
        while self.step()? == Step::Continue {}

        Ok(Step::Halt)
    }

    /// Runs the machine for at most `max_steps` further steps.
    ///
    /// Fails with `StepLimitExceeded` if the machine is still running afterwards.
    pub fn run_with_limit(&mut self, max_steps: u64) -> Result<Step, TuringMachineError> {
        for _ in 0..max_steps {
            if self.step()? == Step::Halt {
                return Ok(Step::Halt);
            }
        }

        if self.is_halted() {
            Ok(Step::Halt)
        } else {
            Err(TuringMachineError::StepLimitExceeded(max_steps))
        }
    }

    /// Resets the state, tape, head and step count to their initial values.
    pub fn reset(&mut self) {
        self.state = Target::State(INITIAL_STATE);
        self.head = 0;
        self.tape = Tape::new(self.program.initial_tape(), self.program.blank());
        self.step_count = 0;
    }

    /// Replaces the tape with `content`, ignoring whitespace, and moves the head to its
    /// first cell.
    ///
    /// Every symbol must belong to the program's alphabet. An empty content yields a
    /// single blank cell.
    pub fn set_tape_content(&mut self, content: &str) -> Result<(), TuringMachineError> {
        let symbols: Vec<Symbol> = content.chars().filter(|c| !c.is_whitespace()).collect();

        let alphabet = self.program.alphabet();
        if let Some(symbol) = symbols.iter().find(|s| !alphabet.contains(**s)) {
            return Err(TuringMachineError::ValidationError(format!(
                "'{symbol}' is not a declared symbol"
            )));
        }

        self.tape = Tape::new(&symbols, self.program.blank());
        self.head = 0;
        Ok(())
    }

    /// Returns the current state, or `Target::Halt` once the machine has halted.
    pub fn state(&self) -> Target {
        self.state
    }

    pub fn is_halted(&self) -> bool {
        self.state == Target::Halt
    }

    /// Returns the head position as an offset from the first initial cell.
    pub fn head(&self) -> i64 {
        self.head
    }

    pub fn tape(&self) -> &Tape {
        &self.tape
    }

    /// Returns the symbol currently under the head.
    pub fn symbol(&self) -> Symbol {
        self.tape.read(self.head)
    }

    /// Returns the instruction the next step would apply, if there is one.
    pub fn instruction(&self) -> Option<&'p Instruction> {
        match self.state {
            Target::State(state) => self.program.instruction(state, self.symbol()),
            Target::Halt => None,
        }
    }

    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    pub fn program(&self) -> &'p MachineProgram {
        self.program
    }
}
