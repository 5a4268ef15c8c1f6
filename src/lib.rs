//! # RuleFuse - Rule Reconciliation Engine
//!
//! RuleFuse reconciles outlier-detection rules from two sources: rules
//! mined from data (decision trees fitted to outlier labels) and rules
//! stated by domain experts. Both arrive as human-readable text
//! (`IF Distance [km] <= 135.750 THEN OUTLIER`); the engine parses them
//! against a column allow-list, drops contradictions, tightens overlapping
//! bounds, and emits one integrated OUTLIER rule set.
//!
//! ## Core Concepts
//!
//! - **Predicate**: One comparison over a dataset column
//! - **Rule**: A conjunction of predicates plus an OUTLIER/INLIER label
//! - **ColumnCatalog**: The ordered allow-list of dataset column names
//! - **Reconciliation**: The integrated rules plus every rejected input
//!
//! ## Usage
//!
//! ```rust,ignore
//! use rulefuse::{ColumnCatalog, Reconciler};
//!
//! let columns = ColumnCatalog::new(["Distance [km]", "Total fuel consumed [dm3]"]);
//! let engine = Reconciler::new(columns);
//!
//! let outcome = engine.reconcile(
//!     &["IF Distance [km] <= 135.750 THEN OUTLIER"],
//!     &["IF $Total fuel consumed [dm3]$ > 473.9 THEN OUTLIER"],
//! );
//! for rule in &outcome.rules {
//!     println!("{rule}");
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Core types
pub mod bound;
pub mod error;
pub mod predicate;
pub mod rule;

// Pipeline stages
pub mod format;
pub mod merge;
pub mod parser;
pub mod validate;

// Engine and surrounding plumbing
pub mod dataset;
pub mod engine;
pub mod session;
pub mod tree;

// Re-export primary types at crate root for convenience
pub use bound::{Bound, Direction, ParameterRange, RangeShape};
pub use dataset::Dataset;
pub use engine::{Reconciler, Reconciliation};
pub use error::{
    ContradictionError, DatasetError, ParseError, RejectReason, RejectedRule, TreeParseError,
    VacuousPredicate,
};
pub use format::{format_rule, format_rules};
pub use merge::merge_rule_sets;
pub use parser::{parse_rule, parse_rules, ColumnCatalog};
pub use predicate::{Label, Operator, Predicate, Threshold};
pub use rule::{CanonicalRule, Rule, Signature};
pub use session::{InMemorySessionStore, SessionStore, StoreError, TaskId};
pub use tree::{rules_from_depth_dump, rules_from_figs_dump};
pub use validate::{validate_rule, validate_rule_set, ValidatedRule};
