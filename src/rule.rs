//! Rules: labeled conjunctions of predicates.
//!
//! A rule is immutable once validated. Canonicalization and merging always
//! produce fresh rules; the originals are discarded, never edited in place.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::bound::{ParameterRange, Tightened};
use crate::error::{ContradictionError, VacuousPredicate};
use crate::predicate::{Label, Predicate};

/// The parameter-set signature of a rule: the sorted set of column names its
/// conjunction references. Rules merge only within one signature group.
pub type Signature = BTreeSet<String>;

/// An AND-combination of predicates with an OUTLIER/INLIER label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    conjunction: Vec<Predicate>,
    label: Label,
}

impl Rule {
    /// Creates a rule.
    ///
    /// # Panics
    /// Panics if `conjunction` is empty; rules have at least one predicate
    /// by invariant (the parser and merger both guarantee this).
    #[must_use]
    pub fn new(conjunction: Vec<Predicate>, label: Label) -> Self {
        assert!(!conjunction.is_empty(), "rule conjunction must be non-empty");
        Self { conjunction, label }
    }

    /// The predicates of the conjunction, in display order.
    #[must_use]
    pub fn conjunction(&self) -> &[Predicate] {
        &self.conjunction
    }

    /// The rule label.
    #[must_use]
    pub const fn label(&self) -> Label {
        self.label
    }

    /// Returns `true` for OUTLIER rules.
    #[must_use]
    pub fn is_outlier(&self) -> bool {
        self.label == Label::Outlier
    }

    /// The sorted set of parameter names referenced by the conjunction.
    #[must_use]
    pub fn signature(&self) -> Signature {
        self.conjunction
            .iter()
            .map(|p| p.parameter.clone())
            .collect()
    }

    /// Per-parameter ranges of the conjunction, in first-appearance order.
    ///
    /// Each predicate is folded into its parameter's range; the returned
    /// ranges hold the tightest bound seen per side.
    #[must_use]
    pub fn parameter_ranges(&self) -> Vec<(String, ParameterRange)> {
        let mut ranges: Vec<(String, ParameterRange)> = Vec::new();
        for predicate in &self.conjunction {
            let idx = ranges
                .iter()
                .position(|(name, _)| *name == predicate.parameter)
                .unwrap_or_else(|| {
                    ranges.push((predicate.parameter.clone(), ParameterRange::new()));
                    ranges.len() - 1
                });
            ranges[idx].1.tighten(predicate);
        }
        ranges
    }

    /// Rebuilds a rule from per-parameter ranges, lower bound before upper
    /// bound within each parameter.
    ///
    /// # Panics
    /// Panics if every range is unconstrained; callers only pass ranges
    /// built from at least one predicate.
    #[must_use]
    pub fn from_ranges(ranges: &[(String, ParameterRange)], label: Label) -> Self {
        let conjunction: Vec<Predicate> = ranges
            .iter()
            .flat_map(|(_, range)| range.predicates())
            .collect();
        Self::new(conjunction, label)
    }

    /// Canonicalizes the conjunction: duplicate (parameter, operator) pairs
    /// collapse into the tighter bound, predicates subsumed by a tighter one
    /// are dropped with a [`VacuousPredicate`] warning, and an unsatisfiable
    /// parameter fails with a [`ContradictionError`] naming the surviving
    /// conflicting predicates.
    ///
    /// # Errors
    /// Returns `ContradictionError` when any parameter's combined bounds
    /// admit no value.
    pub fn canonicalize(&self) -> Result<CanonicalRule, ContradictionError> {
        let mut ranges: Vec<(String, ParameterRange)> = Vec::new();
        let mut warnings = Vec::new();

        for predicate in &self.conjunction {
            let idx = ranges
                .iter()
                .position(|(name, _)| *name == predicate.parameter)
                .unwrap_or_else(|| {
                    ranges.push((predicate.parameter.clone(), ParameterRange::new()));
                    ranges.len() - 1
                });
            let range = &mut ranges[idx].1;
            match range.tighten(predicate) {
                Tightened::Adopted(Some(displaced)) => warnings.push(VacuousPredicate {
                    parameter: predicate.parameter.clone(),
                    dropped: displaced.to_string(),
                    kept: predicate.to_string(),
                }),
                Tightened::Redundant => {
                    let kept = if predicate.operator.is_lower_bound() {
                        range.lower()
                    } else {
                        range.upper()
                    };
                    warnings.push(VacuousPredicate {
                        parameter: predicate.parameter.clone(),
                        dropped: predicate.to_string(),
                        kept: kept.map(ToString::to_string).unwrap_or_default(),
                    });
                }
                Tightened::Adopted(None) => {}
            }
        }

        for (parameter, range) in &ranges {
            if !range.is_satisfiable() {
                return Err(ContradictionError {
                    parameter: parameter.clone(),
                    lower: range.lower().map(ToString::to_string).unwrap_or_default(),
                    upper: range.upper().map(ToString::to_string).unwrap_or_default(),
                });
            }
        }

        Ok(CanonicalRule {
            rule: Self::from_ranges(&ranges, self.label),
            warnings,
        })
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IF ")?;
        for (i, predicate) in self.conjunction.iter().enumerate() {
            if i > 0 {
                write!(f, " AND ")?;
            }
            write!(f, "{predicate}")?;
        }
        write!(f, " THEN {}", self.label)
    }
}

/// A canonicalized rule together with the redundancy warnings produced
/// while collapsing its conjunction.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalRule {
    /// The satisfiable, duplicate-free rule.
    pub rule: Rule,
    /// Redundant predicates that were dropped.
    pub warnings: Vec<VacuousPredicate>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicate::{Operator, Threshold};

    fn pred(name: &str, op: Operator, literal: &str) -> Predicate {
        Predicate::new(name, op, Threshold::from_literal(literal).unwrap())
    }

    #[test]
    fn test_signature_is_sorted_and_deduplicated() {
        let rule = Rule::new(
            vec![
                pred("b", Operator::Gt, "1"),
                pred("a", Operator::Lt, "2"),
                pred("b", Operator::Lt, "9"),
            ],
            Label::Outlier,
        );
        let signature = rule.signature();
        let sig: Vec<&str> = signature.iter().map(String::as_str).collect();
        assert_eq!(sig, vec!["a", "b"]);
    }

    #[test]
    fn test_canonicalize_collapses_redundant_lower_bounds() {
        let rule = Rule::new(
            vec![pred("p", Operator::Gt, "10"), pred("p", Operator::Gt, "5")],
            Label::Outlier,
        );
        let canonical = rule.canonicalize().unwrap();
        assert_eq!(canonical.rule.conjunction(), &[pred("p", Operator::Gt, "10")]);
        assert_eq!(canonical.warnings.len(), 1);
        assert_eq!(canonical.warnings[0].dropped, "p > 5");
    }

    #[test]
    fn test_canonicalize_keeps_satisfiable_range() {
        let rule = Rule::new(
            vec![pred("p", Operator::Gt, "1"), pred("p", Operator::Lt, "9")],
            Label::Outlier,
        );
        let canonical = rule.canonicalize().unwrap();
        assert_eq!(canonical.rule.conjunction().len(), 2);
        assert!(canonical.warnings.is_empty());
    }

    #[test]
    fn test_canonicalize_detects_contradiction() {
        let rule = Rule::new(
            vec![pred("p", Operator::Gt, "10"), pred("p", Operator::Le, "10")],
            Label::Outlier,
        );
        let err = rule.canonicalize().unwrap_err();
        assert_eq!(err.parameter, "p");
        assert_eq!(err.lower, "p > 10");
        assert_eq!(err.upper, "p <= 10");
    }

    #[test]
    fn test_canonicalize_preserves_other_parameters() {
        let rule = Rule::new(
            vec![
                pred("a", Operator::Gt, "1"),
                pred("b", Operator::Lt, "2"),
                pred("a", Operator::Gt, "0.5"),
            ],
            Label::Outlier,
        );
        let canonical = rule.canonicalize().unwrap();
        assert_eq!(
            canonical.rule.conjunction(),
            &[pred("a", Operator::Gt, "1"), pred("b", Operator::Lt, "2")]
        );
    }

    #[test]
    fn test_display() {
        let rule = Rule::new(
            vec![pred("a", Operator::Gt, "1"), pred("b", Operator::Le, "2.50")],
            Label::Outlier,
        );
        assert_eq!(rule.to_string(), "IF a > 1 AND b <= 2.5 THEN OUTLIER");
    }

    #[test]
    #[should_panic(expected = "non-empty")]
    fn test_empty_conjunction_panics() {
        let _ = Rule::new(Vec::new(), Label::Outlier);
    }
}
