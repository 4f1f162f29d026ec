//! Stage Graph: named stages joined by edges from `START` to `END`.
//!
//! Graphs are declared once and never change afterwards. [`StageGraph::compile`]
//! validates the structure and yields a [`CompiledGraph`] the runner can walk.
//!
//! ```text
//! START ──→ stage_a ──→ stage_b ──┬──→ stage_c ──→ END
//!                                 └──→ stage_d ──→ END   (conditional edge)
//! ```
use crate::context::ExecutionState;
use crate::error::{Result, TaskflowError};
use crate::stage::SharedStage;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

pub const START: &str = "__start__";
pub const END: &str = "__end__";

/// Picks the next stage from the state after a stage completes.
pub type Router = Arc<dyn Fn(&ExecutionState) -> String + Send + Sync>;

#[derive(Clone)]
pub enum Transition {
    Direct(String),
    Conditional { router: Router, targets: Vec<String> },
}

impl Transition {
    fn targets(&self) -> Vec<&str> {
        match self {
            Self::Direct(to) => vec![to.as_str()],
            Self::Conditional { targets, .. } => targets.iter().map(String::as_str).collect(),
        }
    }
}

impl fmt::Debug for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct(to) => f.debug_tuple("Direct").field(to).finish(),
            Self::Conditional { targets, .. } => f
                .debug_struct("Conditional")
                .field("targets", targets)
                .finish_non_exhaustive(),
        }
    }
}

/// Serializable outline of a graph, for display by a host layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphDescription {
    pub name: String,
    pub stages: Vec<String>,
    pub edges: Vec<EdgeDescription>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeDescription {
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub conditional: bool,
}

pub struct StageGraph {
    name: String,
    /// Declaration order, used for descriptions and error messages.
    order: Vec<String>,
    stages: HashMap<String, SharedStage>,
    edges: Vec<(String, Transition)>,
}

impl StageGraph {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            order: Vec::new(),
            stages: HashMap::new(),
            edges: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register a stage handler. Duplicate or reserved names are rejected.
    pub fn add_stage(mut self, name: impl Into<String>, stage: SharedStage) -> Result<Self> {
        let name = name.into();
        if name == START || name == END {
            return Err(TaskflowError::Configuration(format!(
                "'{}' is a reserved stage name in graph '{}'",
                name, self.name
            )));
        }
        if self.stages.contains_key(&name) {
            return Err(TaskflowError::Configuration(format!(
                "stage '{}' declared twice in graph '{}'",
                name, self.name
            )));
        }
        self.order.push(name.clone());
        self.stages.insert(name, stage);
        Ok(self)
    }

    /// Record a transition. References are only checked by [`compile`](Self::compile).
    pub fn add_edge(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.edges.push((from.into(), Transition::Direct(to.into())));
        self
    }

    pub fn add_conditional_edge<R>(
        mut self,
        from: impl Into<String>,
        router: R,
        targets: Vec<String>,
    ) -> Self
    where
        R: Fn(&ExecutionState) -> String + Send + Sync + 'static,
    {
        self.edges.push((
            from.into(),
            Transition::Conditional {
                router: Arc::new(router),
                targets,
            },
        ));
        self
    }

    /// Chain `START → stages[0] → … → stages[n-1] → END`.
    pub fn linear(mut self, stages: &[&str]) -> Self {
        let mut previous = START.to_string();
        for stage in stages {
            self = self.add_edge(previous, *stage);
            previous = stage.to_string();
        }
        self.add_edge(previous, END)
    }

    pub fn describe(&self) -> GraphDescription {
        let edges = self
            .edges
            .iter()
            .flat_map(|(from, transition)| {
                let conditional = matches!(transition, Transition::Conditional { .. });
                transition
                    .targets()
                    .into_iter()
                    .map(move |to| EdgeDescription {
                        source: from.clone(),
                        target: to.to_string(),
                        conditional,
                    })
            })
            .collect();

        GraphDescription {
            name: self.name.clone(),
            stages: self.order.clone(),
            edges,
        }
    }

    /// Validate the graph and produce an executable handle.
    pub fn compile(&self) -> Result<CompiledGraph> {
        self.check_references()?;

        let mut transitions: HashMap<String, Transition> = HashMap::new();
        for (from, transition) in &self.edges {
            if transitions.insert(from.clone(), transition.clone()).is_some() {
                return Err(self.invalid(format!("'{}' has more than one outgoing transition", from)));
            }
        }

        let entry = match transitions.get(START) {
            Some(Transition::Direct(to)) => to.clone(),
            Some(Transition::Conditional { .. }) => {
                return Err(self.invalid("start must have a direct edge".to_string()))
            }
            None => return Err(self.invalid("start is not connected to any stage".to_string())),
        };
        if entry == END {
            return Err(self.invalid("start leads directly to end".to_string()));
        }

        let reachable = self.walk(&transitions)?;

        if !reachable.contains(END) {
            return Err(self.invalid("end is unreachable from start".to_string()));
        }
        if let Some(orphan) = self.order.iter().find(|s| !reachable.contains(s.as_str())) {
            return Err(self.invalid(format!("stage '{}' is unreachable from start", orphan)));
        }

        Ok(CompiledGraph {
            name: self.name.clone(),
            entry,
            stages: self.stages.clone(),
            transitions,
        })
    }

    fn check_references(&self) -> Result<()> {
        for (from, transition) in &self.edges {
            if from == END {
                return Err(TaskflowError::Configuration(format!(
                    "graph '{}' declares an edge out of end",
                    self.name
                )));
            }
            if from != START && !self.stages.contains_key(from) {
                return Err(self.undeclared(from));
            }
            for to in transition.targets() {
                if to != END && !self.stages.contains_key(to) {
                    return Err(self.undeclared(to));
                }
            }
        }
        Ok(())
    }

    /// Depth-first walk from start: rejects cycles and dead ends, returns
    /// every node reached (including `END`).
    fn walk(&self, transitions: &HashMap<String, Transition>) -> Result<HashSet<String>> {
        let mut done: HashSet<String> = HashSet::new();
        let mut on_path: HashSet<String> = HashSet::new();
        // (node, next child index)
        let mut stack: Vec<(String, usize)> = vec![(START.to_string(), 0)];
        on_path.insert(START.to_string());

        while let Some((node, child)) = stack.pop() {
            let targets: Vec<&str> = if node == END {
                Vec::new()
            } else {
                match transitions.get(&node) {
                    Some(t) => t.targets(),
                    None => {
                        return Err(self.invalid(format!("stage '{}' has no outgoing edge", node)))
                    }
                }
            };

            if let Some(next) = targets.get(child) {
                let next = next.to_string();
                stack.push((node, child + 1));
                if on_path.contains(&next) {
                    return Err(self.invalid(format!("cycle detected through '{}'", next)));
                }
                if !done.contains(&next) {
                    on_path.insert(next.clone());
                    stack.push((next, 0));
                }
            } else {
                on_path.remove(&node);
                done.insert(node);
            }
        }

        Ok(done)
    }

    fn undeclared(&self, stage: &str) -> TaskflowError {
        TaskflowError::Configuration(format!(
            "graph '{}' references undeclared stage '{}'",
            self.name, stage
        ))
    }

    fn invalid(&self, reason: String) -> TaskflowError {
        TaskflowError::GraphValidation(format!("graph '{}': {}", self.name, reason))
    }
}

impl fmt::Debug for StageGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StageGraph")
            .field("name", &self.name)
            .field("stages", &self.order)
            .field("edges", &self.edges)
            .finish()
    }
}

/// Validated graph, ready for the runner.
#[derive(Clone)]
pub struct CompiledGraph {
    name: String,
    entry: String,
    stages: HashMap<String, SharedStage>,
    transitions: HashMap<String, Transition>,
}

impl CompiledGraph {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entry(&self) -> &str {
        &self.entry
    }

    pub fn stage(&self, name: &str) -> Option<&SharedStage> {
        self.stages.get(name)
    }

    pub fn transition(&self, from: &str) -> Option<&Transition> {
        self.transitions.get(from)
    }
}

impl fmt::Debug for CompiledGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledGraph")
            .field("name", &self.name)
            .field("entry", &self.entry)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::StateUpdate;
    use crate::stage::stage_fn;

    fn noop() -> SharedStage {
        stage_fn(|_state| async { Ok(StateUpdate::new()) })
    }

    fn graph_with(stages: &[&str]) -> StageGraph {
        stages
            .iter()
            .fold(StageGraph::new("test"), |g, s| g.add_stage(*s, noop()).unwrap())
    }

    #[test]
    fn test_linear_graph_compiles() {
        let compiled = graph_with(&["a", "b", "c"]).linear(&["a", "b", "c"]).compile().unwrap();
        assert_eq!(compiled.entry(), "a");
        assert!(compiled.stage("b").is_some());
    }

    #[test]
    fn test_duplicate_stage_rejected() {
        let err = StageGraph::new("dup")
            .add_stage("a", noop())
            .unwrap()
            .add_stage("a", noop())
            .unwrap_err();
        assert!(matches!(err, TaskflowError::Configuration(_)));
    }

    #[test]
    fn test_reserved_name_rejected() {
        let err = StageGraph::new("r").add_stage(END, noop()).unwrap_err();
        assert!(matches!(err, TaskflowError::Configuration(_)));
    }

    #[test]
    fn test_undeclared_stage_rejected() {
        let err = graph_with(&["a"])
            .add_edge(START, "a")
            .add_edge("a", "ghost")
            .compile()
            .unwrap_err();
        assert!(matches!(err, TaskflowError::Configuration(ref m) if m.contains("ghost")));
    }

    #[test]
    fn test_cycle_detected() {
        let err = graph_with(&["a", "b"])
            .add_edge(START, "a")
            .add_edge("a", "b")
            .add_edge("b", "a")
            .compile()
            .unwrap_err();
        assert!(matches!(err, TaskflowError::GraphValidation(ref m) if m.contains("cycle")));
    }

    #[test]
    fn test_conditional_cycle_detected() {
        let err = graph_with(&["a", "b"])
            .add_edge(START, "a")
            .add_edge("a", "b")
            .add_conditional_edge("b", |_| END.to_string(), vec![END.to_string(), "a".to_string()])
            .compile()
            .unwrap_err();
        assert!(matches!(err, TaskflowError::GraphValidation(_)));
    }

    #[test]
    fn test_disconnected_start() {
        let err = graph_with(&["a"]).add_edge("a", END).compile().unwrap_err();
        assert!(matches!(err, TaskflowError::GraphValidation(ref m) if m.contains("start")));
    }

    #[test]
    fn test_dead_end_stage() {
        let err = graph_with(&["a", "b"])
            .add_edge(START, "a")
            .add_edge("a", "b")
            .compile()
            .unwrap_err();
        assert!(matches!(err, TaskflowError::GraphValidation(ref m) if m.contains("'b' has no outgoing edge")));
    }

    #[test]
    fn test_multiple_out_edges_rejected() {
        let err = graph_with(&["a", "b"])
            .add_edge(START, "a")
            .add_edge("a", "b")
            .add_edge("a", END)
            .add_edge("b", END)
            .compile()
            .unwrap_err();
        assert!(matches!(err, TaskflowError::GraphValidation(_)));
    }

    #[test]
    fn test_unreachable_stage_rejected() {
        let err = graph_with(&["a", "island"])
            .add_edge(START, "a")
            .add_edge("a", END)
            .add_edge("island", END)
            .compile()
            .unwrap_err();
        assert!(matches!(err, TaskflowError::GraphValidation(ref m) if m.contains("island")));
    }

    #[test]
    fn test_diamond_with_conditional_edge_compiles() {
        let graph = graph_with(&["a", "left", "right"])
            .add_edge(START, "a")
            .add_conditional_edge(
                "a",
                |_| "left".to_string(),
                vec!["left".to_string(), "right".to_string()],
            )
            .add_edge("left", END)
            .add_edge("right", END);
        assert!(graph.compile().is_ok());
    }

    #[test]
    fn test_describe() {
        let description = graph_with(&["a", "b"]).linear(&["a", "b"]).describe();
        assert_eq!(description.stages, vec!["a", "b"]);
        assert_eq!(description.edges.len(), 3);
        assert_eq!(description.edges[0].source, START);
        assert_eq!(description.edges[2].target, END);
    }
}
