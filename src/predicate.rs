//! Core predicate types.
//!
//! A predicate is a single comparison over one dataset column
//! (`Total fuel consumed [dm3] > 40`). Conjunctions of predicates form
//! rules; the rule label classifies the matched region as anomalous or
//! normal operation.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Comparison operator of a predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    /// Strictly greater than (`>`).
    Gt,
    /// Greater than or equal (`>=`).
    Ge,
    /// Strictly less than (`<`).
    Lt,
    /// Less than or equal (`<=`).
    Le,
}

impl Operator {
    /// Returns the textual form of the operator.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Lt => "<",
            Self::Le => "<=",
        }
    }

    /// Parses an operator token. Two-character operators must be checked
    /// before their one-character prefixes by callers scanning raw text.
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            ">" => Some(Self::Gt),
            ">=" => Some(Self::Ge),
            "<" => Some(Self::Lt),
            "<=" => Some(Self::Le),
            _ => None,
        }
    }

    /// Returns `true` if the operator expresses a lower bound (`>` or `>=`).
    #[must_use]
    pub const fn is_lower_bound(self) -> bool {
        matches!(self, Self::Gt | Self::Ge)
    }

    /// Returns `true` if the bound includes the threshold itself.
    #[must_use]
    pub const fn is_inclusive(self) -> bool {
        matches!(self, Self::Ge | Self::Le)
    }

    /// The logical negation of the comparison: `x >= t` fails exactly when
    /// `x < t`. Used to derive the false branch of a decision-tree split.
    #[must_use]
    pub const fn negated(self) -> Self {
        match self {
            Self::Gt => Self::Le,
            Self::Ge => Self::Lt,
            Self::Lt => Self::Ge,
            Self::Le => Self::Gt,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Classification assigned by a rule to the region its conjunction matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Label {
    /// Anomalous operation.
    Outlier,
    /// Normal operation.
    Inlier,
}

impl Label {
    /// Returns the uppercase textual form used in rule strings.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Outlier => "OUTLIER",
            Self::Inlier => "INLIER",
        }
    }

    /// Parses a rule label token (exact uppercase match).
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "OUTLIER" => Some(Self::Outlier),
            "INLIER" => Some(Self::Inlier),
            _ => None,
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A comparison threshold.
///
/// The parsed value drives all numeric comparisons; the source literal is
/// kept alongside so that formatting preserves exactly the precision the
/// caller supplied (`135.750` renders as `135.75`, never `135.7` or
/// `135.75000000000001`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Threshold {
    value: f64,
    literal: String,
}

impl Threshold {
    /// Creates a threshold from a numeric literal.
    ///
    /// Returns `None` when the literal does not parse to a finite double.
    #[must_use]
    pub fn from_literal(literal: &str) -> Option<Self> {
        let value: f64 = literal.parse().ok()?;
        if !value.is_finite() {
            return None;
        }
        Some(Self {
            value,
            literal: literal.to_string(),
        })
    }

    /// Creates a threshold from a finite value, synthesizing the literal.
    ///
    /// # Panics
    /// Panics if `value` is not finite; thresholds are finite by invariant.
    #[must_use]
    pub fn from_value(value: f64) -> Self {
        assert!(value.is_finite(), "threshold must be finite");
        Self {
            literal: format!("{value}"),
            value,
        }
    }

    /// The numeric value.
    #[must_use]
    pub const fn value(&self) -> f64 {
        self.value
    }

    /// The literal as supplied at construction.
    #[must_use]
    pub fn literal(&self) -> &str {
        &self.literal
    }

    /// Renders the threshold without unnecessary trailing zeros, at the
    /// precision of the source literal.
    #[must_use]
    pub fn render(&self) -> String {
        if self.literal.contains('.') {
            let trimmed = self.literal.trim_end_matches('0').trim_end_matches('.');
            if trimmed.is_empty() || trimmed == "-" {
                "0".to_string()
            } else {
                trimmed.to_string()
            }
        } else {
            self.literal.clone()
        }
    }
}

impl PartialEq for Threshold {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl PartialOrd for Threshold {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        self.value.partial_cmp(&other.value)
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}

/// A single comparison over one dataset column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Predicate {
    /// Dataset column name, exactly as it appears in the allow-list.
    pub parameter: String,
    /// Comparison operator.
    pub operator: Operator,
    /// Comparison threshold.
    pub threshold: Threshold,
}

impl Predicate {
    /// Creates a predicate.
    #[must_use]
    pub fn new(parameter: impl Into<String>, operator: Operator, threshold: Threshold) -> Self {
        Self {
            parameter: parameter.into(),
            operator,
            threshold,
        }
    }

    /// Returns `true` if `sample` satisfies the comparison.
    #[must_use]
    pub fn matches(&self, sample: f64) -> bool {
        let t = self.threshold.value();
        match self.operator {
            Operator::Gt => sample > t,
            Operator::Ge => sample >= t,
            Operator::Lt => sample < t,
            Operator::Le => sample <= t,
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.parameter, self.operator, self.threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_tokens() {
        assert_eq!(Operator::from_token(">="), Some(Operator::Ge));
        assert_eq!(Operator::from_token("<"), Some(Operator::Lt));
        assert_eq!(Operator::from_token("=="), None);
        assert_eq!(Operator::Ge.as_str(), ">=");
    }

    #[test]
    fn test_operator_direction() {
        assert!(Operator::Gt.is_lower_bound());
        assert!(Operator::Ge.is_lower_bound());
        assert!(!Operator::Lt.is_lower_bound());
        assert!(Operator::Ge.is_inclusive());
        assert!(!Operator::Lt.is_inclusive());
    }

    #[test]
    fn test_label_tokens() {
        assert_eq!(Label::from_token("OUTLIER"), Some(Label::Outlier));
        assert_eq!(Label::from_token("INLIER"), Some(Label::Inlier));
        assert_eq!(Label::from_token("outlier"), None);
    }

    #[test]
    fn test_threshold_rejects_non_finite() {
        assert!(Threshold::from_literal("nan").is_none());
        assert!(Threshold::from_literal("inf").is_none());
        assert!(Threshold::from_literal("abc").is_none());
    }

    #[test]
    fn test_threshold_render_trims_zeros() {
        assert_eq!(Threshold::from_literal("135.750").unwrap().render(), "135.75");
        assert_eq!(Threshold::from_literal("67.000").unwrap().render(), "67");
        assert_eq!(Threshold::from_literal("100").unwrap().render(), "100");
        assert_eq!(Threshold::from_literal("-0.50").unwrap().render(), "-0.5");
        assert_eq!(Threshold::from_literal("0.0").unwrap().render(), "0");
    }

    #[test]
    fn test_threshold_equality_is_numeric() {
        let a = Threshold::from_literal("10.0").unwrap();
        let b = Threshold::from_literal("10").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_predicate_matches() {
        let p = Predicate::new("speed", Operator::Gt, Threshold::from_value(120.0));
        assert!(p.matches(121.0));
        assert!(!p.matches(120.0));

        let q = Predicate::new("speed", Operator::Le, Threshold::from_value(120.0));
        assert!(q.matches(120.0));
        assert!(!q.matches(120.5));
    }

    #[test]
    fn test_predicate_display() {
        let p = Predicate::new(
            "Distance [km]",
            Operator::Le,
            Threshold::from_literal("135.750").unwrap(),
        );
        assert_eq!(p.to_string(), "Distance [km] <= 135.75");
    }

    #[test]
    fn test_predicate_serialization() {
        let p = Predicate::new("speed", Operator::Gt, Threshold::from_value(120.0));
        let json = serde_json::to_string(&p).unwrap();
        let back: Predicate = serde_json::from_str(&json).unwrap();
        assert_eq!(p, back);
    }
}
