//! Consistency validation.
//!
//! Scans rules for unsatisfiable conjunctions and redundant predicates.
//! Contradictions reject the rule (with the conflicting predicates named);
//! redundancy only drops the looser predicate and surfaces a warning.

use tracing::{debug, warn};

use crate::error::{ContradictionError, RejectedRule, VacuousPredicate};
use crate::rule::Rule;

/// A rule that passed validation, possibly with redundant predicates
/// removed.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRule {
    /// The satisfiable, redundancy-free rule.
    pub rule: Rule,
    /// One warning per dropped redundant predicate.
    pub warnings: Vec<VacuousPredicate>,
}

/// Validates one rule.
///
/// # Errors
/// Returns [`ContradictionError`] when any parameter's combined bounds in
/// the conjunction admit no value (`p > 10 AND p <= 10`).
pub fn validate_rule(rule: &Rule) -> Result<ValidatedRule, ContradictionError> {
    let canonical = rule.canonicalize()?;
    for warning in &canonical.warnings {
        debug!(%warning, "dropping redundant predicate");
    }
    Ok(ValidatedRule {
        rule: canonical.rule,
        warnings: canonical.warnings,
    })
}

/// Validates a batch, partitioning into clean rules and rejected records.
///
/// Rejection is per rule: one contradictory rule never aborts the batch.
/// Rejected records carry the rule's display text and the contradiction.
#[must_use]
pub fn validate_rule_set(rules: &[Rule]) -> (Vec<ValidatedRule>, Vec<RejectedRule>) {
    let mut clean = Vec::new();
    let mut rejected = Vec::new();
    for rule in rules {
        match validate_rule(rule) {
            Ok(validated) => clean.push(validated),
            Err(contradiction) => {
                warn!(rule = %rule, %contradiction, "rejecting contradictory rule");
                rejected.push(RejectedRule::new(rule.to_string(), contradiction));
            }
        }
    }
    (clean, rejected)
}
