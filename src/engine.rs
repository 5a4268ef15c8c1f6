//! The reconciliation engine.
//!
//! Ties the pipeline together: parse both rule lists against the column
//! allow-list, canonicalize, merge, validate, format. The engine is
//! stateless; every invocation is fully isolated given its inputs, so one
//! instance may be shared freely across sessions and threads.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::RejectedRule;
use crate::format::format_rules;
use crate::merge::merge_rule_sets;
use crate::parser::{parse_rule, ColumnCatalog};
use crate::rule::Rule;
use crate::validate::{validate_rule, validate_rule_set};

/// The integrated result of one reconciliation run.
///
/// Serializes to JSON so the surrounding service layer can persist it under
/// a caller-assigned task identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reconciliation {
    /// The integrated, formatted OUTLIER rules, in display order.
    pub rules: Vec<String>,
    /// Rules excluded from the integrated set, in encounter order.
    pub rejected: Vec<RejectedRule>,
}

impl Reconciliation {
    /// Returns `true` when no rule was rejected.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// Reconciles data-derived and expert-derived rule sets.
#[derive(Debug, Clone)]
pub struct Reconciler {
    columns: ColumnCatalog,
}

impl Reconciler {
    /// Creates a reconciler for datasets with the given column allow-list.
    #[must_use]
    pub fn new(columns: ColumnCatalog) -> Self {
        Self { columns }
    }

    /// The column allow-list this reconciler parses and formats against.
    #[must_use]
    pub fn columns(&self) -> &ColumnCatalog {
        &self.columns
    }

    /// Runs the full pipeline over two raw rule lists.
    ///
    /// Per-rule failures (unparseable text, contradictory conjunctions) are
    /// recorded in the rejected list and never abort the batch; the
    /// remaining rules are merged, validated, and formatted.
    pub fn reconcile<S: AsRef<str>>(&self, data_rules: &[S], expert_rules: &[S]) -> Reconciliation {
        let mut rejected = Vec::new();
        let data = self.intake(data_rules, &mut rejected);
        let expert = self.intake(expert_rules, &mut rejected);
        debug!(
            data_rules = data.len(),
            expert_rules = expert.len(),
            rejected = rejected.len(),
            "rule intake complete"
        );

        let merged = merge_rule_sets(&data, &expert);

        // Merged rules are satisfiable by construction; this re-check guards
        // the formatter's contract.
        let (clean, post_rejected) = validate_rule_set(&merged);
        rejected.extend(post_rejected);

        let rules: Vec<Rule> = clean.into_iter().map(|v| v.rule).collect();
        Reconciliation {
            rules: format_rules(&rules, &self.columns),
            rejected,
        }
    }

    /// Parses and canonicalizes one input list, recording failures.
    fn intake<S: AsRef<str>>(&self, texts: &[S], rejected: &mut Vec<RejectedRule>) -> Vec<Rule> {
        let mut rules = Vec::new();
        for text in texts {
            let text = text.as_ref();
            match parse_rule(text, &self.columns) {
                Ok(rule) => match validate_rule(&rule) {
                    Ok(validated) => rules.push(validated.rule),
                    Err(contradiction) => {
                        warn!(rule = text, %contradiction, "rejecting contradictory rule");
                        rejected.push(RejectedRule::new(text, contradiction));
                    }
                },
                Err(parse_error) => {
                    warn!(rule = text, %parse_error, "rejecting unparseable rule");
                    rejected.push(RejectedRule::new(text, parse_error));
                }
            }
        }
        rules
    }
}
