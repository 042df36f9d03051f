//! Index-selection mini-language.
//!
//! A selection string restricts which parameter sets a batch exports. It is
//! a comma-separated list of clauses, each one of:
//!
//! - `every:<step> in <start>-<end>` — every `step`th index in the inclusive
//!   range
//! - `from:<start>` — from `start` to the last index
//! - `up_to:<end>` — from 0 to `end` inclusive
//! - `<start>-<end>` — an inclusive range
//! - `<n>` — a single index
//!
//! Clauses are unioned. Indices are zero-based. Parsing is all-or-nothing:
//! any malformed clause or out-of-range index fails the whole parse.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Selection parse errors. Messages carry the offending clause and, for
/// range violations, the valid index range.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    /// Clause does not match the grammar.
    #[error("invalid selection clause '{clause}': {reason}")]
    InvalidClause { clause: String, reason: String },

    /// Clause references an index outside `[0, total_count)`.
    #[error("index {index} out of range (0-{max}) in clause '{clause}'")]
    IndexOutOfRange {
        index: usize,
        max: usize,
        clause: String,
    },

    /// Range clause with start > end.
    #[error("invalid range '{clause}': start {start} > end {end}")]
    InvertedRange {
        clause: String,
        start: usize,
        end: usize,
    },
}

/// A parsed set of parameter-set indices, unique and iterated in ascending
/// order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    indices: BTreeSet<usize>,
}

impl Selection {
    /// Parse a selection string against a table of `total_count` parameter
    /// sets.
    pub fn parse(input: &str, total_count: usize) -> Result<Self, SelectionError> {
        let mut selection = Selection::default();
        for clause in input.split(',') {
            let clause = clause.trim();
            if clause.is_empty() {
                continue;
            }
            selection.add_clause(clause, total_count)?;
        }
        Ok(selection)
    }

    /// Whether `index` is selected.
    pub fn contains(&self, index: usize) -> bool {
        self.indices.contains(&index)
    }

    /// Selected indices in ascending order.
    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.indices.iter().copied()
    }

    /// Number of selected indices.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Whether no index is selected.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    fn add_clause(&mut self, clause: &str, total_count: usize) -> Result<(), SelectionError> {
        if let Some(rest) = clause.strip_prefix("every:") {
            self.add_stepped(clause, rest, total_count)
        } else if let Some(start) = clause.strip_prefix("from:") {
            let start = parse_index(clause, start)?;
            check_bounds(clause, start, total_count)?;
            self.indices.extend(start..total_count);
            Ok(())
        } else if let Some(end) = clause.strip_prefix("up_to:") {
            let end = parse_index(clause, end)?;
            check_bounds(clause, end, total_count)?;
            self.indices.extend(0..=end);
            Ok(())
        } else if clause.contains('-') {
            let (start, end) = parse_range(clause, clause)?;
            for index in start..=end {
                check_bounds(clause, index, total_count)?;
                self.indices.insert(index);
            }
            Ok(())
        } else {
            let index = parse_index(clause, clause)?;
            check_bounds(clause, index, total_count)?;
            self.indices.insert(index);
            Ok(())
        }
    }

    fn add_stepped(
        &mut self,
        clause: &str,
        rest: &str,
        total_count: usize,
    ) -> Result<(), SelectionError> {
        let (step, range) = rest.split_once(" in ").ok_or_else(|| {
            SelectionError::InvalidClause {
                clause: clause.to_string(),
                reason: "expected 'every:<step> in <start>-<end>'".to_string(),
            }
        })?;
        let step = parse_index(clause, step.trim())?;
        if step == 0 {
            return Err(SelectionError::InvalidClause {
                clause: clause.to_string(),
                reason: "step must be >= 1".to_string(),
            });
        }
        let (start, end) = parse_range(clause, range.trim())?;
        // Only the indices the step actually visits are bounds-checked.
        for index in (start..=end).step_by(step) {
            check_bounds(clause, index, total_count)?;
            self.indices.insert(index);
        }
        Ok(())
    }
}

fn parse_index(clause: &str, token: &str) -> Result<usize, SelectionError> {
    token
        .trim()
        .parse::<usize>()
        .map_err(|_| SelectionError::InvalidClause {
            clause: clause.to_string(),
            reason: format!("'{}' is not a non-negative integer", token.trim()),
        })
}

fn parse_range(clause: &str, range: &str) -> Result<(usize, usize), SelectionError> {
    let (start, end) = range
        .split_once('-')
        .ok_or_else(|| SelectionError::InvalidClause {
            clause: clause.to_string(),
            reason: "expected '<start>-<end>'".to_string(),
        })?;
    let start = parse_index(clause, start)?;
    let end = parse_index(clause, end)?;
    if start > end {
        return Err(SelectionError::InvertedRange {
            clause: clause.to_string(),
            start,
            end,
        });
    }
    Ok((start, end))
}

fn check_bounds(clause: &str, index: usize, total_count: usize) -> Result<(), SelectionError> {
    if index >= total_count {
        return Err(SelectionError::IndexOutOfRange {
            index,
            max: total_count.saturating_sub(1),
            clause: clause.to_string(),
        });
    }
    Ok(())
}
