//! This module provides the static checks run once the whole state table has been read.
//! Forward references are only resolved here, since `STATE` blocks may be declared in any
//! order.

use crate::types::{LoadError, State, StateId, Target, INITIAL_STATE};
use std::collections::{BTreeMap, BTreeSet};

/// A `NEXT <n>` target together with the line it was written on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reference {
    pub line: usize,
    pub state: StateId,
}

/// Represents the fatal problems found by analysing a state table.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum AnalysisError {
    /// No `STATE 0` block was declared.
    MissingInitialState,
    /// A `NEXT` target names a state that no block declares.
    UndefinedNextState(Reference),
}

impl From<AnalysisError> for LoadError {
    fn from(error: AnalysisError) -> Self {
        match error {
            AnalysisError::MissingInitialState => LoadError::MissingInitialState,
            AnalysisError::UndefinedNextState(Reference { line, state }) => {
                LoadError::UndefinedState { line, state }
            }
        }
    }
}

/// Analyzes a parsed state table.
///
/// The missing initial state is reported before anything else, then the first undefined
/// jump in source order. On success the returned list holds the states that can never be
/// entered from state 0, sorted by id.
///
/// # Arguments
///
/// * `states` - The merged state table.
/// * `references` - Every integer `NEXT` target in the file, in source order.
pub fn analyze(
    states: &BTreeMap<StateId, State>,
    references: &[Reference],
) -> Result<Vec<StateId>, AnalysisError> {
    check_initial_state(states)?;
    check_undefined_next_states(states, references)?;

    Ok(unreachable_states(states))
}

fn check_initial_state(states: &BTreeMap<StateId, State>) -> Result<(), AnalysisError> {
    if !states.contains_key(&INITIAL_STATE) {
        return Err(AnalysisError::MissingInitialState);
    }

    Ok(())
}

/// Checks that every `NEXT` reference points at a declared state, whether or not the
/// instruction holding it is reachable or kept.
fn check_undefined_next_states(
    states: &BTreeMap<StateId, State>,
    references: &[Reference],
) -> Result<(), AnalysisError> {
    references
        .iter()
        .find(|reference| !states.contains_key(&reference.state))
        .map_or(Ok(()), |reference| {
            Err(AnalysisError::UndefinedNextState(*reference))
        })
}

/// Collects the declared states not reachable from state 0, using a depth-first walk
/// over the instructions' targets.
fn unreachable_states(states: &BTreeMap<StateId, State>) -> Vec<StateId> {
    let mut visited = BTreeSet::new();
    let mut queue = vec![INITIAL_STATE];

    while let Some(id) = queue.pop() {
        if !visited.insert(id) {
            continue;
        }

        if let Some(state) = states.get(&id) {
            for instruction in state.instructions() {
                if let Target::State(next) = instruction.next {
                    if !visited.contains(&next) {
                        queue.push(next);
                    }
                }
            }
        }
    }

    states
        .keys()
        .filter(|id| !visited.contains(id))
        .copied()
        .collect()
}
