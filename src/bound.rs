//! Predicate normalization.
//!
//! Every comparison operator canonicalizes to a direction (lower or upper
//! bound) plus an inclusivity flag, so that bound tightening is a numeric
//! min/max instead of a syntactic string operation.

use serde::{Deserialize, Serialize};

use crate::predicate::{Operator, Predicate, Threshold};

/// The direction a predicate bounds its parameter in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// `>` / `>=`: the parameter is bounded from below.
    Lower,
    /// `<` / `<=`: the parameter is bounded from above.
    Upper,
}

/// Canonical form of a predicate's comparison: direction, threshold,
/// inclusivity. Pure conversion; cannot fail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bound {
    /// Which side of the parameter's range this bound constrains.
    pub direction: Direction,
    /// The threshold value.
    pub threshold: Threshold,
    /// Whether the threshold itself satisfies the bound.
    pub inclusive: bool,
}

impl Bound {
    /// Normalizes a predicate's operator and threshold.
    #[must_use]
    pub fn from_predicate(predicate: &Predicate) -> Self {
        let direction = if predicate.operator.is_lower_bound() {
            Direction::Lower
        } else {
            Direction::Upper
        };
        Self {
            direction,
            threshold: predicate.threshold.clone(),
            inclusive: predicate.operator.is_inclusive(),
        }
    }

    /// Converts the bound back to a predicate on `parameter`.
    #[must_use]
    pub fn into_predicate(self, parameter: impl Into<String>) -> Predicate {
        let operator = match (self.direction, self.inclusive) {
            (Direction::Lower, false) => Operator::Gt,
            (Direction::Lower, true) => Operator::Ge,
            (Direction::Upper, false) => Operator::Lt,
            (Direction::Upper, true) => Operator::Le,
        };
        Predicate::new(parameter, operator, self.threshold)
    }
}

/// Returns `true` if lower bound `a` is at least as tight as lower bound `b`.
///
/// A higher threshold is tighter; at equal thresholds the exclusive bound is
/// tighter (`p > 5` excludes 5, `p >= 5` does not).
fn lower_at_least_as_tight(a: &Predicate, b: &Predicate) -> bool {
    let (av, bv) = (a.threshold.value(), b.threshold.value());
    av > bv || (av == bv && (!a.operator.is_inclusive() || b.operator.is_inclusive()))
}

/// Returns `true` if upper bound `a` is at least as tight as upper bound `b`.
fn upper_at_least_as_tight(a: &Predicate, b: &Predicate) -> bool {
    let (av, bv) = (a.threshold.value(), b.threshold.value());
    av < bv || (av == bv && (!a.operator.is_inclusive() || b.operator.is_inclusive()))
}

/// Outcome of folding one more predicate into a [`ParameterRange`].
#[derive(Debug, Clone, PartialEq)]
pub enum Tightened {
    /// The predicate became (or replaced) the surviving bound on its side.
    /// Carries the displaced, now-redundant predicate if there was one.
    Adopted(Option<Predicate>),
    /// The predicate is subsumed by an existing tighter bound and was dropped.
    Redundant,
}

/// Per-parameter aggregation of all bounds seen so far.
///
/// The surviving predicates (rather than bare numbers) are retained so the
/// original threshold literals survive into formatting and so contradiction
/// reports can name the exact conflicting predicates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterRange {
    lower: Option<Predicate>,
    upper: Option<Predicate>,
}

impl ParameterRange {
    /// Creates an unconstrained range.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The surviving lower-bound predicate, if any.
    #[must_use]
    pub fn lower(&self) -> Option<&Predicate> {
        self.lower.as_ref()
    }

    /// The surviving upper-bound predicate, if any.
    #[must_use]
    pub fn upper(&self) -> Option<&Predicate> {
        self.upper.as_ref()
    }

    /// Folds `predicate` into the range, keeping the tighter bound per side.
    pub fn tighten(&mut self, predicate: &Predicate) -> Tightened {
        let slot = if predicate.operator.is_lower_bound() {
            &mut self.lower
        } else {
            &mut self.upper
        };
        match slot.take() {
            None => {
                *slot = Some(predicate.clone());
                Tightened::Adopted(None)
            }
            Some(current) => {
                let incoming_tighter = if predicate.operator.is_lower_bound() {
                    lower_at_least_as_tight(predicate, &current)
                        && !lower_at_least_as_tight(&current, predicate)
                } else {
                    upper_at_least_as_tight(predicate, &current)
                        && !upper_at_least_as_tight(&current, predicate)
                };
                if incoming_tighter {
                    *slot = Some(predicate.clone());
                    Tightened::Adopted(Some(current))
                } else {
                    *slot = Some(current);
                    Tightened::Redundant
                }
            }
        }
    }

    /// Returns `false` when the combined bounds admit no value at all
    /// (`p > 10 AND p < 10`, `p > 10 AND p <= 10`, ...).
    #[must_use]
    pub fn is_satisfiable(&self) -> bool {
        match (&self.lower, &self.upper) {
            (Some(lo), Some(hi)) => {
                let (l, u) = (lo.threshold.value(), hi.threshold.value());
                l < u || (l == u && lo.operator.is_inclusive() && hi.operator.is_inclusive())
            }
            _ => true,
        }
    }

    /// Which direction(s) this range constrains, or `None` if unconstrained.
    #[must_use]
    pub fn shape(&self) -> Option<RangeShape> {
        match (&self.lower, &self.upper) {
            (Some(_), Some(_)) => Some(RangeShape::Both),
            (Some(_), None) => Some(RangeShape::LowerOnly),
            (None, Some(_)) => Some(RangeShape::UpperOnly),
            (None, None) => None,
        }
    }

    /// Returns `true` if every value admitted by `other` is admitted by
    /// `self` (i.e. `self` is at least as loose on both sides).
    #[must_use]
    pub fn subsumes(&self, other: &Self) -> bool {
        let lower_ok = match (&self.lower, &other.lower) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(a), Some(b)) => lower_at_least_as_tight(b, a),
        };
        let upper_ok = match (&self.upper, &other.upper) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(a), Some(b)) => upper_at_least_as_tight(b, a),
        };
        lower_ok && upper_ok
    }

    /// The surviving predicates, lower bound first.
    #[must_use]
    pub fn predicates(&self) -> Vec<Predicate> {
        self.lower
            .iter()
            .chain(self.upper.iter())
            .cloned()
            .collect()
    }
}

/// Shape of a constrained [`ParameterRange`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RangeShape {
    /// Only a lower bound.
    LowerOnly,
    /// Only an upper bound.
    UpperOnly,
    /// Bounded on both sides.
    Both,
}

impl RangeShape {
    /// Returns `true` when two shapes bound strictly opposite sides.
    ///
    /// A two-sided range already contains both directions and therefore
    /// never opposes a one-sided one.
    #[must_use]
    pub const fn opposes(self, other: Self) -> bool {
        matches!(
            (self, other),
            (Self::LowerOnly, Self::UpperOnly) | (Self::UpperOnly, Self::LowerOnly)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicate::Threshold;

    fn pred(op: Operator, literal: &str) -> Predicate {
        Predicate::new("p", op, Threshold::from_literal(literal).unwrap())
    }

    #[test]
    fn test_bound_roundtrip() {
        for op in [Operator::Gt, Operator::Ge, Operator::Lt, Operator::Le] {
            let p = pred(op, "3.5");
            let back = Bound::from_predicate(&p).into_predicate("p");
            assert_eq!(p, back);
        }
    }

    #[test]
    fn test_bound_direction() {
        assert_eq!(
            Bound::from_predicate(&pred(Operator::Gt, "1")).direction,
            Direction::Lower
        );
        assert_eq!(
            Bound::from_predicate(&pred(Operator::Le, "1")).direction,
            Direction::Upper
        );
    }

    #[test]
    fn test_tighten_keeps_highest_lower_bound() {
        let mut range = ParameterRange::new();
        assert_eq!(range.tighten(&pred(Operator::Gt, "5")), Tightened::Adopted(None));
        let displaced = range.tighten(&pred(Operator::Gt, "10"));
        assert_eq!(displaced, Tightened::Adopted(Some(pred(Operator::Gt, "5"))));
        assert_eq!(range.tighten(&pred(Operator::Gt, "7")), Tightened::Redundant);
        assert_eq!(range.lower(), Some(&pred(Operator::Gt, "10")));
    }

    #[test]
    fn test_tighten_keeps_lowest_upper_bound() {
        let mut range = ParameterRange::new();
        range.tighten(&pred(Operator::Lt, "20"));
        range.tighten(&pred(Operator::Le, "15"));
        assert_eq!(range.upper(), Some(&pred(Operator::Le, "15")));
    }

    #[test]
    fn test_tie_prefers_exclusive_bound() {
        let mut range = ParameterRange::new();
        range.tighten(&pred(Operator::Ge, "5"));
        assert_eq!(
            range.tighten(&pred(Operator::Gt, "5")),
            Tightened::Adopted(Some(pred(Operator::Ge, "5")))
        );
        // The inclusive bound at the same threshold is now redundant.
        assert_eq!(range.tighten(&pred(Operator::Ge, "5")), Tightened::Redundant);
    }

    #[test]
    fn test_satisfiability() {
        let mut range = ParameterRange::new();
        range.tighten(&pred(Operator::Gt, "10"));
        range.tighten(&pred(Operator::Lt, "10"));
        assert!(!range.is_satisfiable());

        let mut range = ParameterRange::new();
        range.tighten(&pred(Operator::Gt, "10"));
        range.tighten(&pred(Operator::Le, "10"));
        assert!(!range.is_satisfiable());

        let mut range = ParameterRange::new();
        range.tighten(&pred(Operator::Ge, "10"));
        range.tighten(&pred(Operator::Le, "10"));
        assert!(range.is_satisfiable());

        let mut range = ParameterRange::new();
        range.tighten(&pred(Operator::Gt, "1"));
        range.tighten(&pred(Operator::Lt, "2"));
        assert!(range.is_satisfiable());
    }

    #[test]
    fn test_subsumes() {
        let mut loose = ParameterRange::new();
        loose.tighten(&pred(Operator::Gt, "5"));

        let mut tight = ParameterRange::new();
        tight.tighten(&pred(Operator::Gt, "10"));
        tight.tighten(&pred(Operator::Lt, "20"));

        assert!(loose.subsumes(&tight));
        assert!(!tight.subsumes(&loose));
        assert!(loose.subsumes(&loose.clone()));
    }

    #[test]
    fn test_shape_opposition() {
        assert!(RangeShape::LowerOnly.opposes(RangeShape::UpperOnly));
        assert!(!RangeShape::Both.opposes(RangeShape::LowerOnly));
        assert!(!RangeShape::LowerOnly.opposes(RangeShape::LowerOnly));
    }

    #[test]
    fn test_predicates_order_lower_first() {
        let mut range = ParameterRange::new();
        range.tighten(&pred(Operator::Lt, "9"));
        range.tighten(&pred(Operator::Gt, "1"));
        let preds = range.predicates();
        assert_eq!(preds[0], pred(Operator::Gt, "1"));
        assert_eq!(preds[1], pred(Operator::Lt, "9"));
    }
}
