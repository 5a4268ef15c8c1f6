//! Error types for rule reconciliation.
//!
//! All errors are strongly typed using thiserror. None of them is fatal to a
//! reconciliation batch: a rule that cannot be parsed or that contradicts
//! itself is excluded and recorded, and the remaining rules proceed.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while parsing a single rule string.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParseError {
    /// The rule does not start with the uppercase `IF` keyword.
    #[error("rule must start with uppercase 'IF'")]
    MissingIf,

    /// The rule has no uppercase `THEN` keyword.
    #[error("rule must contain uppercase 'THEN'")]
    MissingThen,

    /// The rule condition contains an `OR` token. Disjunctions are a hard
    /// input-format violation, not a recoverable variant: upstream producers
    /// must split them into separate rules.
    #[error("disjunctions are not allowed in rule text (found 'OR')")]
    DisjunctionNotAllowed,

    /// The condition between `IF` and `THEN` is empty.
    #[error("rule has no predicates")]
    EmptyConjunction,

    /// A parameter name does not match any allow-listed column.
    #[error("unknown parameter name: '{name}'")]
    UnknownParameter {
        /// The unmatched fragment of the condition.
        name: String,
    },

    /// No comparison operator follows a parameter name.
    #[error("expected a comparison operator after '{parameter}'")]
    MissingOperator {
        /// The parameter the operator was expected after.
        parameter: String,
    },

    /// The threshold did not parse as a finite double.
    #[error("invalid numeric threshold '{literal}' for '{parameter}'")]
    InvalidThreshold {
        /// The parameter being compared.
        parameter: String,
        /// The offending literal.
        literal: String,
    },

    /// The trailing label is neither `OUTLIER` nor `INLIER`.
    #[error("rule label must be OUTLIER or INLIER, got '{label}'")]
    InvalidLabel {
        /// The offending label token.
        label: String,
    },

    /// Leftover text between a predicate and `AND`/`THEN`.
    #[error("unexpected input after predicate: '{fragment}'")]
    TrailingInput {
        /// The unparsed fragment.
        fragment: String,
    },

    /// A `$`-delimited parameter name was never closed.
    #[error("unterminated '$' delimiter in parameter name")]
    UnterminatedDelimiter,
}

/// Errors raised while extracting rules from a decision-tree dump.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TreeParseError {
    /// The dump contains no root marker line.
    #[error("tree dump has no root node")]
    MissingRoot,

    /// A `feature_N` reference points past the end of the column list.
    #[error("feature index {index} out of range for {columns} columns")]
    FeatureIndexOutOfRange {
        /// The referenced index.
        index: usize,
        /// Number of columns available.
        columns: usize,
    },

    /// A split node's condition did not parse against the column list.
    #[error("malformed split condition: '{condition}'")]
    MalformedSplit {
        /// The condition text as it appears in the dump.
        condition: String,
    },
}

/// Errors raised while applying rules to a dataset.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DatasetError {
    /// A row's width does not match the column count.
    #[error("row {row} has {found} values, expected {expected}")]
    RowWidthMismatch {
        /// Zero-based row index.
        row: usize,
        /// Values found in the row.
        found: usize,
        /// Column count of the dataset.
        expected: usize,
    },

    /// A rule references a column the dataset does not have.
    #[error("rule references unknown column '{column}'")]
    UnknownColumn {
        /// The missing column name.
        column: String,
    },
}

/// A conjunction whose combined bounds on one parameter admit no value.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("contradictory bounds on '{parameter}': '{lower}' conflicts with '{upper}'")]
pub struct ContradictionError {
    /// The over-constrained parameter.
    pub parameter: String,
    /// Text of the surviving lower-bound predicate.
    pub lower: String,
    /// Text of the surviving upper-bound predicate.
    pub upper: String,
}

/// A redundant predicate dropped from a conjunction.
///
/// Redundancy is not contradiction: the rule survives with the tighter bound
/// and the dropped predicate is reported as a warning only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VacuousPredicate {
    /// The parameter both predicates bound.
    pub parameter: String,
    /// Text of the dropped, looser predicate.
    pub dropped: String,
    /// Text of the tighter predicate that subsumes it.
    pub kept: String,
}

impl fmt::Display for VacuousPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' is redundant on '{}' (subsumed by '{}')",
            self.dropped, self.parameter, self.kept
        )
    }
}

/// Why a rule was excluded from the integrated output.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum RejectReason {
    /// The rule text did not parse.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// The rule's conjunction is unsatisfiable.
    #[error("contradiction: {0}")]
    Contradiction(#[from] ContradictionError),
}

/// A rule excluded from the integrated output, with its original text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedRule {
    /// The rule exactly as supplied by the caller.
    pub text: String,
    /// Why it was excluded.
    pub reason: RejectReason,
}

impl RejectedRule {
    /// Creates a rejected-rule record.
    #[must_use]
    pub fn new(text: impl Into<String>, reason: impl Into<RejectReason>) -> Self {
        Self {
            text: text.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for RejectedRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.text, self.reason)
    }
}
