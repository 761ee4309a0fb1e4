//! # Rule Store
//!
//! Loads STIG rules from YAML and validates them into a typed [`RuleSet`].
//!
//! - `definition` - serde shapes of rule files
//! - `loader` - file and directory loading
//! - `types` - the validated rule model used by the engine

mod definition;
mod loader;
mod types;

pub use definition::{
    CheckDefinition, ParentDefinition, PredicateKind, RuleDefinition, RuleDocument,
    RuleValidationError, WhenDefinition,
};
pub use loader::{from_yaml, load, load_rules, RuleLoadError};
pub use types::{
    Applicability, CheckKind, CheckSpec, OsType, Predicate, Rule, RuleSet, Severity,
};
