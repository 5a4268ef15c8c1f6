//! Rule parsing against a column allow-list.
//!
//! Grammar: `IF <predicate> (AND <predicate>)* THEN <OUTLIER|INLIER>` with
//! `<predicate>` being `<parameter-name> <op> <number>`. Parameter names are
//! real dataset column headers and may contain spaces, brackets, and even
//! comparison characters (`Total no. compaction cycles with p>100 bar`), so
//! the parser never splits on `>`/`<`: it matches names against the
//! allow-list, longest match first. Names may also arrive `$`-delimited, the
//! form the formatter emits.

use serde::{Deserialize, Serialize};

use crate::error::ParseError;
use crate::predicate::{Label, Operator, Predicate, Threshold};
use crate::rule::Rule;

/// The authoritative, ordered set of recognized dataset column names.
///
/// Order matters twice: `feature_N` references in decision-tree dumps
/// resolve to the Nth column, and longest-first matching disambiguates
/// columns that are prefixes of one another.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnCatalog {
    columns: Vec<String>,
}

impl ColumnCatalog {
    /// Creates a catalog from column names in dataset order.
    #[must_use]
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    /// The column names in dataset order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns `true` if the catalog has no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Exact, case-sensitive membership test.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// The Nth column, for `feature_N` resolution.
    #[must_use]
    pub fn by_index(&self, index: usize) -> Option<&str> {
        self.columns.get(index).map(String::as_str)
    }

    /// Position of a column in dataset order.
    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Longest catalog column that is a prefix of `text` and is followed by
    /// whitespace (the grammar separates names from operators with spaces).
    #[must_use]
    pub fn match_prefix<'a>(&'a self, text: &str) -> Option<&'a str> {
        self.columns
            .iter()
            .filter(|col| {
                text.strip_prefix(col.as_str())
                    .is_some_and(|rest| rest.starts_with(char::is_whitespace))
            })
            .max_by_key(|col| col.len())
            .map(String::as_str)
    }
}

/// Parses one rule string against the allow-list.
///
/// # Errors
/// Returns [`ParseError`] on missing or case-mismatched keywords, an `OR`
/// connective between predicates, a parameter outside the allow-list, a
/// malformed threshold, or a label other than `OUTLIER`/`INLIER`.
pub fn parse_rule(text: &str, columns: &ColumnCatalog) -> Result<Rule, ParseError> {
    let trimmed = text.trim();
    let rest = trimmed.strip_prefix("IF ").ok_or(ParseError::MissingIf)?;

    let then_pos = rest.rfind(" THEN ").ok_or(ParseError::MissingThen)?;
    let label_token = rest[then_pos + " THEN ".len()..].trim();
    let label = Label::from_token(label_token).ok_or_else(|| ParseError::InvalidLabel {
        label: label_token.to_string(),
    })?;

    let condition = rest[..then_pos].trim();
    if condition.is_empty() {
        return Err(ParseError::EmptyConjunction);
    }

    let mut conjunction = Vec::new();
    let mut remaining = condition;
    loop {
        remaining = remaining.trim_start();

        let (parameter, after_name) = parse_parameter(remaining, columns)?;

        let after_name = after_name.trim_start();
        let (operator, after_op) = parse_operator(after_name, parameter)?;

        let after_op = after_op.trim_start();
        let literal = after_op
            .split(char::is_whitespace)
            .next()
            .unwrap_or_default();
        let threshold =
            Threshold::from_literal(literal).ok_or_else(|| ParseError::InvalidThreshold {
                parameter: parameter.to_string(),
                literal: literal.to_string(),
            })?;

        conjunction.push(Predicate::new(parameter, operator, threshold));

        let after_value = after_op[literal.len()..].trim_start();
        if after_value.is_empty() {
            break;
        }
        if let Some(next) = after_value.strip_prefix("AND ") {
            remaining = next;
            continue;
        }
        // OR is only a disjunction in connective position; a matched column
        // name containing the token is fine.
        if after_value == "OR" || after_value.starts_with("OR ") {
            return Err(ParseError::DisjunctionNotAllowed);
        }
        return Err(ParseError::TrailingInput {
            fragment: after_value.to_string(),
        });
    }

    Ok(Rule::new(conjunction, label))
}

/// Parses a batch of rule strings, pairing each failure with its source text.
pub fn parse_rules<'a>(
    texts: impl IntoIterator<Item = &'a str>,
    columns: &ColumnCatalog,
) -> Vec<(String, Result<Rule, ParseError>)> {
    texts
        .into_iter()
        .map(|text| (text.to_string(), parse_rule(text, columns)))
        .collect()
}

fn parse_parameter<'a, 'b>(
    text: &'a str,
    columns: &'b ColumnCatalog,
) -> Result<(&'b str, &'a str), ParseError>
where
    'a: 'b,
{
    if let Some(delimited) = text.strip_prefix('$') {
        let end = delimited
            .find('$')
            .ok_or(ParseError::UnterminatedDelimiter)?;
        let name = &delimited[..end];
        if !columns.contains(name) {
            return Err(ParseError::UnknownParameter {
                name: name.to_string(),
            });
        }
        Ok((name, &delimited[end + 1..]))
    } else {
        match columns.match_prefix(text) {
            Some(name) => Ok((name, &text[name.len()..])),
            None => {
                // Best-effort fragment for the error message: the clause up
                // to the next AND, with any trailing comparison stripped.
                let clause = text.split(" AND ").next().unwrap_or(text);
                let name = clause
                    .rsplit_once(|c| c == '>' || c == '<')
                    .map_or(clause, |(head, _)| head.trim_end_matches(['=', ' ']));
                Err(ParseError::UnknownParameter {
                    name: name.trim().to_string(),
                })
            }
        }
    }
}

fn parse_operator<'a>(text: &'a str, parameter: &str) -> Result<(Operator, &'a str), ParseError> {
    for token in [">=", "<=", ">", "<"] {
        if let Some(rest) = text.strip_prefix(token) {
            let operator = Operator::from_token(token).expect("token table is exhaustive");
            return Ok((operator, rest));
        }
    }
    Err(ParseError::MissingOperator {
        parameter: parameter.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn truck_catalog() -> ColumnCatalog {
        ColumnCatalog::new([
            "Total no. compaction cycles",
            "Total no. compaction cycles with p>100 bar",
            "Total fuel consumed [dm3]",
            "Motohours (PTO engaged) [h]",
            "Distance [km]",
            "p",
        ])
    }

    #[test]
    fn test_parse_simple_rule() {
        let rule = parse_rule("IF p > 10 THEN OUTLIER", &truck_catalog()).unwrap();
        assert_eq!(rule.conjunction().len(), 1);
        assert_eq!(rule.conjunction()[0].parameter, "p");
        assert_eq!(rule.conjunction()[0].operator, Operator::Gt);
        assert!(rule.is_outlier());
    }

    #[test]
    fn test_parse_name_containing_comparison() {
        let rule = parse_rule(
            "IF Total no. compaction cycles > 100 AND Total no. compaction cycles with p>100 bar < 10 THEN OUTLIER",
            &truck_catalog(),
        )
        .unwrap();
        assert_eq!(rule.conjunction().len(), 2);
        assert_eq!(
            rule.conjunction()[1].parameter,
            "Total no. compaction cycles with p>100 bar"
        );
        assert_eq!(rule.conjunction()[1].operator, Operator::Lt);
        assert_eq!(rule.conjunction()[1].threshold.value(), 10.0);
    }

    #[test]
    fn test_parse_dollar_delimited_names() {
        let rule = parse_rule(
            "IF $Distance [km]$ <= 135.750 AND $Total fuel consumed [dm3]$ > 40 THEN OUTLIER",
            &truck_catalog(),
        )
        .unwrap();
        assert_eq!(rule.conjunction()[0].parameter, "Distance [km]");
        assert_eq!(rule.conjunction()[0].threshold.literal(), "135.750");
    }

    #[test]
    fn test_parse_inlier_label() {
        let rule = parse_rule("IF p <= -0.5 THEN INLIER", &truck_catalog()).unwrap();
        assert!(!rule.is_outlier());
        assert_eq!(rule.conjunction()[0].threshold.value(), -0.5);
    }

    #[test]
    fn test_missing_if_keyword() {
        assert_eq!(
            parse_rule("if p > 10 THEN OUTLIER", &truck_catalog()),
            Err(ParseError::MissingIf)
        );
        assert_eq!(
            parse_rule("p > 10 THEN OUTLIER", &truck_catalog()),
            Err(ParseError::MissingIf)
        );
    }

    #[test]
    fn test_missing_then_keyword() {
        assert_eq!(
            parse_rule("IF p > 10 then OUTLIER", &truck_catalog()),
            Err(ParseError::MissingThen)
        );
    }

    #[test]
    fn test_or_is_rejected() {
        assert_eq!(
            parse_rule("IF p > 10 OR p < 2 THEN OUTLIER", &truck_catalog()),
            Err(ParseError::DisjunctionNotAllowed)
        );
    }

    #[test]
    fn test_or_inside_column_name_is_not_a_disjunction() {
        let catalog = ColumnCatalog::new(["fill level OR overflow", "p"]);
        let rule = parse_rule("IF fill level OR overflow > 10 THEN OUTLIER", &catalog).unwrap();
        assert_eq!(rule.conjunction()[0].parameter, "fill level OR overflow");
        assert_eq!(rule.conjunction()[0].operator, Operator::Gt);

        // Connective position is still a hard rejection.
        assert_eq!(
            parse_rule("IF p > 1 OR p < 0 THEN OUTLIER", &catalog),
            Err(ParseError::DisjunctionNotAllowed)
        );
    }

    #[test]
    fn test_unknown_parameter() {
        let err = parse_rule("IF engine temp > 90 THEN OUTLIER", &truck_catalog()).unwrap_err();
        assert_eq!(
            err,
            ParseError::UnknownParameter {
                name: "engine temp".to_string()
            }
        );
    }

    #[test]
    fn test_bad_label() {
        let err = parse_rule("IF p > 10 THEN ANOMALY", &truck_catalog()).unwrap_err();
        assert_eq!(
            err,
            ParseError::InvalidLabel {
                label: "ANOMALY".to_string()
            }
        );
    }

    #[test]
    fn test_bad_threshold() {
        let err = parse_rule("IF p > fast THEN OUTLIER", &truck_catalog()).unwrap_err();
        assert!(matches!(err, ParseError::InvalidThreshold { .. }));
    }

    #[test]
    fn test_empty_condition() {
        assert_eq!(
            parse_rule("IF  THEN OUTLIER", &truck_catalog()),
            Err(ParseError::EmptyConjunction)
        );
    }

    #[test]
    fn test_unterminated_delimiter() {
        assert_eq!(
            parse_rule("IF $Distance [km] <= 10 THEN OUTLIER", &truck_catalog()),
            Err(ParseError::UnterminatedDelimiter)
        );
    }

    #[test]
    fn test_longest_prefix_wins() {
        let catalog = ColumnCatalog::new(["speed", "speed limit"]);
        let rule = parse_rule("IF speed limit > 50 THEN OUTLIER", &catalog).unwrap();
        assert_eq!(rule.conjunction()[0].parameter, "speed limit");
    }

    #[test]
    fn test_catalog_lookup() {
        let catalog = truck_catalog();
        assert!(catalog.contains("Distance [km]"));
        assert!(!catalog.contains("distance [km]"));
        assert_eq!(catalog.by_index(4), Some("Distance [km]"));
        assert_eq!(catalog.by_index(99), None);
    }

    #[test]
    fn test_parse_batch_keeps_failures() {
        let results = parse_rules(
            ["IF p > 1 THEN OUTLIER", "IF q > 1 THEN OUTLIER"],
            &truck_catalog(),
        );
        assert!(results[0].1.is_ok());
        assert!(results[1].1.is_err());
    }
}
