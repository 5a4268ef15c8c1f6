//! Rule formatting.
//!
//! Renders validated rules to the display form consumed downstream:
//! `IF $param$ op val AND ... THEN OUTLIER`, every parameter name wrapped in
//! `$` delimiters and matched verbatim (case-sensitive) against the column
//! allow-list. Thresholds render at the precision they were supplied with,
//! minus unnecessary trailing zeros.
//!
//! Formatting never fails on validated input: a rule with an unknown
//! parameter reaching this point is a programming-contract violation, which
//! is asserted in debug builds rather than surfaced as a runtime error.

use crate::parser::ColumnCatalog;
use crate::rule::Rule;

/// Renders one rule in the `$`-delimited display form.
#[must_use]
pub fn format_rule(rule: &Rule, columns: &ColumnCatalog) -> String {
    let mut out = String::from("IF ");
    for (i, predicate) in rule.conjunction().iter().enumerate() {
        debug_assert!(
            columns.contains(&predicate.parameter),
            "formatter fed a parameter outside the allow-list: {}",
            predicate.parameter
        );
        if i > 0 {
            out.push_str(" AND ");
        }
        out.push('$');
        out.push_str(&predicate.parameter);
        out.push('$');
        out.push(' ');
        out.push_str(predicate.operator.as_str());
        out.push(' ');
        out.push_str(&predicate.threshold.render());
    }
    out.push_str(" THEN ");
    out.push_str(rule.label().as_str());
    out
}

/// Renders a batch of rules, preserving order.
#[must_use]
pub fn format_rules(rules: &[Rule], columns: &ColumnCatalog) -> Vec<String> {
    rules.iter().map(|rule| format_rule(rule, columns)).collect()
}
