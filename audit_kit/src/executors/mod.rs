//! # Executors Module
//!
//! Executors evaluate one kind of check against a parsed configuration:
//! - GlobalCheckExecutor: counts matching lines anywhere in the config
//! - HierarchicalCheckExecutor: counts matching children per parent section

pub mod global;
pub mod hierarchical;

pub use global::GlobalCheckExecutor;
pub use hierarchical::HierarchicalCheckExecutor;

use thiserror::Error;

use crate::config::{ParsedConfig, QueryError};
use crate::results::CheckOutcome;
use crate::rules::{CheckKind, Rule};

/// Evaluates rules of a single [`CheckKind`]
pub trait CheckExecutor {
    /// Kind of check this executor handles
    fn check_kind(&self) -> CheckKind;

    /// Evaluate `rule` against `config`
    ///
    /// Returns `Err` only when the rule cannot be evaluated at all; a failed
    /// check is an `Ok` outcome.
    fn execute(&self, rule: &Rule, config: &ParsedConfig) -> Result<CheckOutcome, EvaluationError>;
}

/// Errors evaluating a single rule; recorded on that rule's result
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvaluationError {
    #[error(transparent)]
    Query(#[from] QueryError),

    #[error("No executor registered for {kind} checks")]
    NoExecutor { kind: CheckKind },

    #[error("{executor} executor cannot evaluate a {kind} check")]
    UnsupportedCheck {
        executor: &'static str,
        kind: CheckKind,
    },
}
