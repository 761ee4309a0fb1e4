//! Executor Registry
//!
//! Maps each check kind to the executor that evaluates it.

use std::collections::HashMap;

use thiserror::Error;

use crate::executors::{CheckExecutor, GlobalCheckExecutor, HierarchicalCheckExecutor};
use crate::rules::CheckKind;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("An executor for {kind} checks is already registered")]
    DuplicateExecutor { kind: CheckKind },
}

/// Executors keyed by the check kind they handle
#[derive(Default)]
pub struct ExecutorRegistry {
    executors: HashMap<CheckKind, Box<dyn CheckExecutor>>,
}

impl ExecutorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an executor under its own check kind
    pub fn register(&mut self, executor: Box<dyn CheckExecutor>) -> Result<(), RegistryError> {
        let kind = executor.check_kind();
        if self.executors.contains_key(&kind) {
            return Err(RegistryError::DuplicateExecutor { kind });
        }
        self.executors.insert(kind, executor);
        Ok(())
    }

    pub fn get(&self, kind: CheckKind) -> Option<&dyn CheckExecutor> {
        self.executors.get(&kind).map(|e| e.as_ref())
    }

    /// Registered kinds, sorted
    pub fn kinds(&self) -> Vec<CheckKind> {
        let mut kinds: Vec<CheckKind> = self.executors.keys().copied().collect();
        kinds.sort();
        kinds
    }

    pub fn len(&self) -> usize {
        self.executors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.executors.is_empty()
    }
}

impl std::fmt::Debug for ExecutorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutorRegistry")
            .field("kinds", &self.kinds())
            .finish()
    }
}

/// Create a registry with all available executors
///
/// Includes:
/// - Global line checks
/// - Hierarchical (per parent section) checks
pub fn create_default_registry() -> Result<ExecutorRegistry, RegistryError> {
    let mut registry = ExecutorRegistry::new();

    registry.register(Box::new(GlobalCheckExecutor::new()))?;
    registry.register(Box::new(HierarchicalCheckExecutor::new()))?;

    Ok(registry)
}
