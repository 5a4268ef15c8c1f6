//! Rule set merging.
//!
//! Combines the data-derived and expert-derived rule sets into one
//! integrated set: INLIER rules are discarded, rules sharing a parameter-set
//! signature have their bounds tightened together, and rules that cannot be
//! combined without manufacturing a disjunction or a contradiction pass
//! through unchanged. The merge is idempotent and never drops an OUTLIER
//! rule silently (provable subsumption excepted, which loses no region).

use tracing::debug;

use crate::bound::ParameterRange;
use crate::predicate::Label;
use crate::rule::{Rule, Signature};

/// One conjunction under merge: parameter ranges in display order.
type Clause = Vec<(String, ParameterRange)>;

/// Merges two rule sets into one integrated OUTLIER-only set.
///
/// Inputs are expected to be canonicalized (satisfiable, duplicate-free);
/// the engine guarantees this for everything it feeds in. Output rules are
/// fresh; inputs are never mutated.
#[must_use]
pub fn merge_rule_sets(data: &[Rule], expert: &[Rule]) -> Vec<Rule> {
    let mut survivors: Vec<&Rule> = Vec::new();
    for rule in data.iter().chain(expert.iter()) {
        if rule.is_outlier() {
            survivors.push(rule);
        } else {
            debug!(rule = %rule, "discarding INLIER rule");
        }
    }

    // Group by signature, first-occurrence order.
    let mut groups: Vec<(Signature, Vec<&Rule>)> = Vec::new();
    for rule in survivors {
        let signature = rule.signature();
        let idx = groups
            .iter()
            .position(|(sig, _)| *sig == signature)
            .unwrap_or_else(|| {
                groups.push((signature.clone(), Vec::new()));
                groups.len() - 1
            });
        groups[idx].1.push(rule);
    }

    let mut merged: Vec<(Signature, Clause)> = Vec::new();
    for (signature, members) in groups {
        for clause in merge_group(&members) {
            merged.push((signature.clone(), clause));
        }
    }

    prune_subsumed(merged)
        .into_iter()
        .map(|(_, clause)| Rule::from_ranges(&clause, Label::Outlier))
        .collect()
}

/// Merges the rules of one signature group into as few conjunctions as the
/// no-OR policy allows.
///
/// Clauses are processed in a canonical order (not arrival order), and each
/// clause joins a cluster it agrees with in direction before any range
/// merge with an opposed one is considered. Together with the closing
/// fixpoint pass this makes the retained bounds independent of which input
/// list a rule came from, and makes the merger idempotent.
fn merge_group(members: &[&Rule]) -> Vec<Clause> {
    let mut clauses: Vec<Clause> = members
        .iter()
        .map(|rule| rule.parameter_ranges())
        .collect();
    clauses.sort_by_cached_key(|clause| Rule::from_ranges(clause, Label::Outlier).to_string());

    let mut clusters: Vec<Clause> = Vec::new();
    for clause in clauses {
        let adopted = adopt(&clusters, &clause, 0).or_else(|| adopt(&clusters, &clause, 1));
        match adopted {
            Some((i, combined)) => clusters[i] = combined,
            None => clusters.push(clause),
        }
    }

    // Merging a clause into a cluster can make two clusters newly compatible.
    loop {
        let Some((i, j, combined)) = find_mergeable_pair(&clusters) else {
            break;
        };
        clusters[i] = combined;
        clusters.remove(j);
    }

    clusters
}

/// First cluster the clause can join within the opposition budget.
fn adopt(clusters: &[Clause], clause: &Clause, max_opposed: usize) -> Option<(usize, Clause)> {
    clusters.iter().enumerate().find_map(|(i, cluster)| {
        try_merge(cluster, clause, max_opposed).map(|combined| (i, combined))
    })
}

fn find_mergeable_pair(clusters: &[Clause]) -> Option<(usize, usize, Clause)> {
    for max_opposed in [0, 1] {
        for i in 0..clusters.len() {
            for j in i + 1..clusters.len() {
                if let Some(combined) = try_merge(&clusters[i], &clusters[j], max_opposed) {
                    return Some((i, j, combined));
                }
            }
        }
    }
    None
}

/// Attempts to combine two same-signature conjunctions into one.
///
/// Refuses when the clauses oppose in bound direction on more than
/// `max_opposed` parameters (those are alternative conditions, and folding
/// them together would smuggle in OR semantics) or when any intersected
/// range becomes empty (that would manufacture a contradiction).
fn try_merge(a: &Clause, b: &Clause, max_opposed: usize) -> Option<Clause> {
    let mut opposed = 0usize;
    for (name, range_a) in a {
        let range_b = &b.iter().find(|(n, _)| n == name)?.1;
        let conflict = match (range_a.shape(), range_b.shape()) {
            (Some(sa), Some(sb)) => sa.opposes(sb),
            _ => false,
        };
        if conflict {
            opposed += 1;
            if opposed > max_opposed {
                return None;
            }
        }
    }

    let mut combined = a.clone();
    for (name, range) in &mut combined {
        let other = &b.iter().find(|(n, _)| n == name.as_str())?.1;
        for predicate in other.predicates() {
            range.tighten(&predicate);
        }
        if !range.is_satisfiable() {
            return None;
        }
    }
    Some(combined)
}

/// Drops clauses whose region is provably contained in another clause's.
///
/// Clause B is subsumed by clause A when A references a subset of B's
/// parameters and every bound of A is at least as loose as B's. Nothing
/// describable is lost by the drop.
fn prune_subsumed(clauses: Vec<(Signature, Clause)>) -> Vec<(Signature, Clause)> {
    let mut kept: Vec<(Signature, Clause)> = Vec::new();
    for (signature, clause) in clauses {
        if let Some((_, absorber)) = kept
            .iter()
            .find(|(sig, existing)| sig.is_subset(&signature) && subsumes(existing, &clause))
        {
            debug!(
                absorbed = %Rule::from_ranges(&clause, Label::Outlier),
                by = %Rule::from_ranges(absorber, Label::Outlier),
                "dropping subsumed rule"
            );
            continue;
        }
        kept.retain(|(sig, existing)| {
            let absorbed = sig.is_superset(&signature) && subsumes(&clause, existing);
            if absorbed {
                debug!(
                    absorbed = %Rule::from_ranges(existing, Label::Outlier),
                    by = %Rule::from_ranges(&clause, Label::Outlier),
                    "dropping subsumed rule"
                );
            }
            !absorbed
        });
        kept.push((signature, clause));
    }
    kept
}

/// Returns `true` if `a` admits every value combination `b` admits.
fn subsumes(a: &Clause, b: &Clause) -> bool {
    a.iter().all(|(name, range_a)| {
        b.iter()
            .find(|(n, _)| n == name)
            .is_some_and(|(_, range_b)| range_a.subsumes(range_b))
    })
}
