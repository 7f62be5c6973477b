//! Concurrency-safe workflow registry.
//!
//! Workflows are kept in a `DashMap` keyed by name. The `running` flag is
//! read and written under the entry's shard lock, so `add`, `remove` and the
//! start of a run never interleave on the same workflow. No operation here
//! awaits.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use super::action::Step;
use super::error::ChainError;

/// A registered workflow.
#[derive(Debug)]
struct Workflow {
    steps: Arc<[Step]>,
    running: bool,
}

/// Named workflows and whether each is currently running.
#[derive(Debug, Default)]
pub struct WorkflowRegistry {
    workflows: DashMap<String, Workflow>,
}

impl WorkflowRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `steps` under `name`, replacing an idle definition.
    pub fn add(&self, name: &str, steps: Vec<Step>) -> Result<(), ChainError> {
        if name.is_empty() {
            return Err(ChainError::EmptyWorkflowName);
        }

        let workflow = Workflow {
            steps: steps.into(),
            running: false,
        };
        match self.workflows.entry(name.to_string()) {
            Entry::Occupied(entry) if entry.get().running => {
                Err(ChainError::WorkflowBusy(name.to_string()))
            }
            Entry::Occupied(mut entry) => {
                entry.insert(workflow);
                tracing::debug!(workflow = name, "workflow definition replaced");
                Ok(())
            }
            Entry::Vacant(entry) => {
                entry.insert(workflow);
                tracing::debug!(workflow = name, "workflow registered");
                Ok(())
            }
        }
    }

    /// Unregister `name`. Absent names are not an error.
    pub fn remove(&self, name: &str) -> Result<(), ChainError> {
        match self.workflows.entry(name.to_string()) {
            Entry::Occupied(entry) if entry.get().running => {
                Err(ChainError::WorkflowBusy(name.to_string()))
            }
            Entry::Occupied(entry) => {
                entry.remove();
                tracing::debug!(workflow = name, "workflow removed");
                Ok(())
            }
            Entry::Vacant(_) => Ok(()),
        }
    }

    /// Mark `name` as running and hand out its steps. The flag is cleared
    /// when the returned lease drops, including during a panic unwind.
    pub(crate) fn begin_run(&self, name: &str) -> Result<RunLease<'_>, ChainError> {
        let mut workflow = self
            .workflows
            .get_mut(name)
            .ok_or_else(|| ChainError::WorkflowNotFound(name.to_string()))?;
        if workflow.running {
            return Err(ChainError::WorkflowBusy(name.to_string()));
        }
        workflow.running = true;

        Ok(RunLease {
            registry: self,
            name: name.to_string(),
            steps: Arc::clone(&workflow.steps),
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.workflows.contains_key(name)
    }

    /// Whether a run of `name` is in progress. `false` for unknown names.
    pub fn is_running(&self, name: &str) -> bool {
        self.workflows.get(name).is_some_and(|w| w.running)
    }

    pub fn step_count(&self, name: &str) -> Option<usize> {
        self.workflows.get(name).map(|w| w.steps.len())
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.workflows.iter().map(|r| r.key().clone()).collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.workflows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workflows.is_empty()
    }
}

/// Exclusive claim on a workflow for the duration of one run.
#[derive(Debug)]
pub(crate) struct RunLease<'a> {
    registry: &'a WorkflowRegistry,
    name: String,
    steps: Arc<[Step]>,
}

impl RunLease<'_> {
    pub(crate) fn steps(&self) -> &[Step] {
        &self.steps
    }
}

impl Drop for RunLease<'_> {
    fn drop(&mut self) {
        if let Some(mut workflow) = self.registry.workflows.get_mut(&self.name) {
            workflow.running = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::action::Action;

    fn noop_steps(n: usize) -> Vec<Step> {
        let noop = Action::new(|_t, _c| async { Ok(String::new()) });
        (0..n).map(|_| Step::new(noop.clone(), noop.clone())).collect()
    }

    #[test]
    fn add_rejects_empty_name() {
        let registry = WorkflowRegistry::new();
        assert!(matches!(
            registry.add("", noop_steps(1)),
            Err(ChainError::EmptyWorkflowName)
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn add_replaces_idle_definition() {
        let registry = WorkflowRegistry::new();
        registry.add("deploy", noop_steps(3)).unwrap();
        registry.add("deploy", noop_steps(5)).unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.step_count("deploy"), Some(5));
        assert!(!registry.is_running("deploy"));
    }

    #[test]
    fn add_and_remove_rejected_while_running() {
        let registry = WorkflowRegistry::new();
        registry.add("deploy", noop_steps(2)).unwrap();

        let lease = registry.begin_run("deploy").unwrap();
        assert!(registry.is_running("deploy"));
        assert!(matches!(
            registry.add("deploy", noop_steps(1)),
            Err(ChainError::WorkflowBusy(name)) if name == "deploy"
        ));
        assert!(matches!(
            registry.remove("deploy"),
            Err(ChainError::WorkflowBusy(_))
        ));
        assert_eq!(registry.step_count("deploy"), Some(2));

        drop(lease);
        assert!(!registry.is_running("deploy"));
        registry.add("deploy", noop_steps(1)).unwrap();
        assert_eq!(registry.step_count("deploy"), Some(1));
        registry.remove("deploy").unwrap();
        assert!(!registry.contains("deploy"));
    }

    #[test]
    fn remove_absent_is_ok() {
        let registry = WorkflowRegistry::new();
        assert!(registry.remove("ghost").is_ok());
    }

    #[test]
    fn begin_run_unknown_and_busy() {
        let registry = WorkflowRegistry::new();
        assert!(matches!(
            registry.begin_run("ghost"),
            Err(ChainError::WorkflowNotFound(_))
        ));

        registry.add("deploy", noop_steps(1)).unwrap();
        let _lease = registry.begin_run("deploy").unwrap();
        assert!(matches!(
            registry.begin_run("deploy"),
            Err(ChainError::WorkflowBusy(_))
        ));
    }

    #[test]
    fn lease_sees_steps_at_start_of_run() {
        let registry = WorkflowRegistry::new();
        registry.add("deploy", noop_steps(4)).unwrap();
        let lease = registry.begin_run("deploy").unwrap();
        assert_eq!(lease.steps().len(), 4);
    }

    #[test]
    fn names_are_sorted() {
        let registry = WorkflowRegistry::new();
        registry.add("stop", noop_steps(1)).unwrap();
        registry.add("deploy", noop_steps(1)).unwrap();
        registry.add("restart", noop_steps(1)).unwrap();
        assert_eq!(registry.names(), vec!["deploy", "restart", "stop"]);
    }

    #[test]
    fn independent_workflows_run_concurrently() {
        let registry = WorkflowRegistry::new();
        registry.add("a", noop_steps(1)).unwrap();
        registry.add("b", noop_steps(1)).unwrap();
        let _a = registry.begin_run("a").unwrap();
        let _b = registry.begin_run("b").unwrap();
        assert!(registry.is_running("a") && registry.is_running("b"));
    }
}
