//! Registry of workflow configurations
//!
//! Built once at startup and handed to whatever needs to look up a
//! project's workflow by type name.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::errors::{PhaseflowError, Result};

use super::builder::WorkflowConfig;

#[derive(Debug, Default)]
pub struct WorkflowRegistry {
    workflows: BTreeMap<String, Arc<WorkflowConfig>>,
}

impl WorkflowRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a workflow under its own name
    ///
    /// # Errors
    /// * `Validation` - a workflow with the same name is already registered
    pub fn register(&mut self, config: WorkflowConfig) -> Result<()> {
        let name = config.name().to_string();
        if self.workflows.contains_key(&name) {
            return Err(PhaseflowError::Validation(format!(
                "workflow {} is already registered",
                name
            )));
        }
        self.workflows.insert(name, Arc::new(config));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<Arc<WorkflowConfig>> {
        self.workflows
            .get(name)
            .cloned()
            .ok_or_else(|| PhaseflowError::NotFound {
                kind: "workflow",
                key: name.to_string(),
            })
    }

    /// Registered workflow names, sorted
    pub fn names(&self) -> Vec<&str> {
        self.workflows.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &WorkflowConfig> {
        self.workflows.values().map(|c| c.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::builder::WorkflowBuilder;
    use crate::domain::transitions::Transition;

    fn config(name: &str) -> WorkflowConfig {
        WorkflowBuilder::new(name, "A")
            .transition(Transition::new("A", "go", "B"))
            .build()
            .unwrap()
    }

    #[test]
    fn test_register_and_get() {
        let mut registry = WorkflowRegistry::new();
        registry.register(config("beta")).unwrap();
        registry.register(config("alpha")).unwrap();

        assert_eq!(registry.names(), vec!["alpha", "beta"]);
        assert_eq!(registry.get("beta").unwrap().name(), "beta");
    }

    #[test]
    fn test_duplicate_registration() {
        let mut registry = WorkflowRegistry::new();
        registry.register(config("alpha")).unwrap();
        assert!(matches!(
            registry.register(config("alpha")),
            Err(PhaseflowError::Validation(_))
        ));
    }

    #[test]
    fn test_unknown_workflow() {
        let registry = WorkflowRegistry::new();
        assert!(matches!(
            registry.get("missing"),
            Err(PhaseflowError::NotFound { kind: "workflow", .. })
        ));
    }
}
