//! Graph registry: task type → stage graph

use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;
use taskflow_core::{StageGraph, TaskType};

/// Read-mostly map of registered graphs. Lookups hand out an `Arc` so no
/// lock is held while a graph runs.
#[derive(Default)]
pub struct GraphRegistry {
    graphs: RwLock<BTreeMap<TaskType, Arc<StageGraph>>>,
}

impl GraphRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the graph previously registered for `task_type`, if any.
    pub fn register(&self, task_type: TaskType, graph: StageGraph) -> Option<Arc<StageGraph>> {
        self.graphs.write().insert(task_type, Arc::new(graph))
    }

    pub fn get(&self, task_type: TaskType) -> Option<Arc<StageGraph>> {
        self.graphs.read().get(&task_type).cloned()
    }

    pub fn task_types(&self) -> Vec<TaskType> {
        self.graphs.read().keys().copied().collect()
    }

    pub fn entries(&self) -> Vec<(TaskType, Arc<StageGraph>)> {
        self.graphs
            .read()
            .iter()
            .map(|(t, g)| (*t, Arc::clone(g)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.graphs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.graphs.read().is_empty()
    }
}
