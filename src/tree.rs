//! Rule extraction from decision-tree text dumps.
//!
//! Two dump dialects are supported:
//!
//! * Depth-bar dumps (sklearn's `export_text` style), where each level of
//!   nesting adds a `|   ` prefix, split nodes read
//!   `|--- feature_8 <= 462.55`, and leaves read
//!   `|--- weights: [0.00, 6.00] class: 1.0`. Feature references are
//!   positional and resolve through the column catalog.
//! * FIGS dumps, where nesting is tab-indented, the root line ends with
//!   `(Tree #0 root)`, internal splits end with `(split)`, and leaves read
//!   `Val: 1.000 (leaf)`. Split conditions carry real column names.
//!
//! Each root-to-leaf path becomes one rule: the conditions along the path
//! form the conjunction (taking a left branch negates the split's
//! comparison), and the leaf class picks the label. Impure FIGS leaves
//! (fractional values) produce no rule.

use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::error::TreeParseError;
use crate::parser::ColumnCatalog;
use crate::predicate::{Label, Operator, Predicate, Threshold};
use crate::rule::Rule;

fn split_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[\|\s]*\|---\s*feature_(\d+)\s*(<=|>=|>|<)\s*(-?[0-9]+(?:\.[0-9]+)?)\s*$")
            .unwrap_or_else(|e| unreachable!("split regex is valid: {e}"))
    })
}

fn leaf_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^[\|\s]*\|---\s*weights:\s*\[[0-9.]+,\s*[0-9.]+\]\s+class:\s*([0-9.]+)\s*$",
        )
        .unwrap_or_else(|e| unreachable!("leaf regex is valid: {e}"))
    })
}

/// Extracts one rule per leaf from a depth-bar tree dump.
///
/// Lines that are neither splits nor leaves are skipped. A leaf at the root
/// of a degenerate single-node tree has no conditions and is skipped too.
///
/// # Errors
/// Returns [`TreeParseError::FeatureIndexOutOfRange`] when a `feature_N`
/// reference does not resolve against the catalog.
pub fn rules_from_depth_dump(
    dump: &str,
    columns: &ColumnCatalog,
) -> Result<Vec<Rule>, TreeParseError> {
    let mut path: Vec<Predicate> = Vec::new();
    let mut rules = Vec::new();

    for line in dump.lines() {
        let depth = line.matches("|   ").count();

        if let Some(caps) = split_line_re().captures(line) {
            let index: usize =
                caps[1]
                    .parse()
                    .map_err(|_| TreeParseError::MalformedSplit {
                        condition: line.trim().to_string(),
                    })?;
            let parameter =
                columns
                    .by_index(index)
                    .ok_or(TreeParseError::FeatureIndexOutOfRange {
                        index,
                        columns: columns.len(),
                    })?;
            let operator =
                Operator::from_token(&caps[2]).ok_or_else(|| TreeParseError::MalformedSplit {
                    condition: line.trim().to_string(),
                })?;
            let threshold =
                Threshold::from_literal(&caps[3]).ok_or_else(|| TreeParseError::MalformedSplit {
                    condition: line.trim().to_string(),
                })?;

            path.truncate(depth);
            path.push(Predicate::new(parameter, operator, threshold));
        } else if let Some(caps) = leaf_line_re().captures(line) {
            path.truncate(depth);
            if path.is_empty() {
                debug!(line, "skipping leaf with no path conditions");
                continue;
            }
            let class: f64 = caps[1].parse().unwrap_or(0.0);
            let label = if class == 0.0 {
                Label::Inlier
            } else {
                Label::Outlier
            };
            rules.push(Rule::new(path.clone(), label));
        }
    }

    Ok(rules)
}

/// Extracts one rule per pure leaf from a FIGS tree dump.
///
/// Header lines before the `(Tree #0 root)` marker are ignored, matching
/// how the dumps arrive (model summary first, tree second).
///
/// # Errors
/// Returns [`TreeParseError::MissingRoot`] when no root marker is present
/// and [`TreeParseError::MalformedSplit`] when a split condition does not
/// parse against the catalog.
pub fn rules_from_figs_dump(
    dump: &str,
    columns: &ColumnCatalog,
) -> Result<Vec<Rule>, TreeParseError> {
    let lines: Vec<&str> = dump
        .lines()
        .skip_while(|line| !line.trim_end().ends_with("(Tree #0 root)"))
        .filter(|line| !line.trim().is_empty())
        .collect();
    if lines.is_empty() {
        return Err(TreeParseError::MissingRoot);
    }

    let mut path = Vec::new();
    let mut rules = Vec::new();
    walk_figs(&lines, columns, &mut path, &mut rules)?;
    Ok(rules)
}

const ROOT_MARKER: &str = "(Tree #0 root)";
const SPLIT_MARKER: &str = "(split)";
const LEAF_MARKER: &str = "(leaf)";

fn walk_figs(
    lines: &[&str],
    columns: &ColumnCatalog,
    path: &mut Vec<Predicate>,
    rules: &mut Vec<Rule>,
) -> Result<(), TreeParseError> {
    let Some((head, rest)) = lines.split_first() else {
        return Ok(());
    };
    let head = head.trim();

    if head.ends_with(ROOT_MARKER) || head.ends_with(SPLIT_MARKER) {
        let condition = head
            .trim_end_matches(ROOT_MARKER)
            .trim_end_matches(SPLIT_MARKER)
            .trim();
        let predicate = parse_split_condition(condition, columns)?;

        // Children sit one tab deeper. Stripping one tab exposes the two
        // subtree roots as the unindented lines.
        let children: Vec<&str> = rest
            .iter()
            .map(|line| line.strip_prefix('\t').unwrap_or(line))
            .collect();
        let mut roots = children
            .iter()
            .enumerate()
            .filter(|(_, line)| !line.starts_with('\t'))
            .map(|(i, _)| i);
        let _left = roots.next();
        let right = roots.next();

        // First subtree is the branch where the split is false.
        let mut negated = predicate.clone();
        negated.operator = negated.operator.negated();

        match right {
            Some(right) => {
                path.push(negated);
                walk_figs(&children[..right], columns, path, rules)?;
                path.pop();

                path.push(predicate);
                walk_figs(&children[right..], columns, path, rules)?;
                path.pop();
            }
            None => {
                path.push(negated);
                walk_figs(&children, columns, path, rules)?;
                path.pop();
            }
        }
    } else if head.ends_with(LEAF_MARKER) {
        match leaf_label(head) {
            Some(label) if !path.is_empty() => rules.push(Rule::new(path.clone(), label)),
            Some(_) => debug!(line = head, "skipping leaf with no path conditions"),
            None => debug!(line = head, "skipping impure leaf"),
        }
    }
    Ok(())
}

fn leaf_label(line: &str) -> Option<Label> {
    let value = line.strip_prefix("Val: ")?.strip_suffix(LEAF_MARKER)?.trim();
    let value: f64 = value.parse().ok()?;
    if value == 1.0 {
        Some(Label::Outlier)
    } else if value == 0.0 {
        Some(Label::Inlier)
    } else {
        None
    }
}

/// Parses a FIGS split condition (`<column> <op> <value>`), matching the
/// column name against the catalog the same way rule text is parsed.
fn parse_split_condition(
    condition: &str,
    columns: &ColumnCatalog,
) -> Result<Predicate, TreeParseError> {
    let malformed = || TreeParseError::MalformedSplit {
        condition: condition.to_string(),
    };

    let parameter = columns.match_prefix(condition).ok_or_else(malformed)?;
    let rest = condition[parameter.len()..].trim_start();

    let (operator, rest) = [">=", "<=", ">", "<"]
        .iter()
        .find_map(|token| {
            let r = rest.strip_prefix(token)?;
            Some((Operator::from_token(token)?, r))
        })
        .ok_or_else(malformed)?;

    let threshold = Threshold::from_literal(rest.trim()).ok_or_else(malformed)?;
    Ok(Predicate::new(parameter, operator, threshold))
}
