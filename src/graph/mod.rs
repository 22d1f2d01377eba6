//! Frame graph: tasks and the dependency structure between them.
//!
//! A [`Pipeline`] is a directed acyclic graph of [`GraphicsTask`]s built
//! once with [`PipelineBuilder`] and then executed every frame by the
//! scheduler. Edges express ordering only; resource synchronization is
//! derived separately from each task's declared usages.

mod task;

pub use task::{GraphicsTask, RenderContext, SetupContext, UsedResource};

use crate::error::GraphError;

/// Handle to a task within one pipeline.
///
/// The index doubles as declaration order, which the scheduler uses to
/// break ordering ties deterministically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskHandle(pub(crate) u32);

impl TaskHandle {
    /// Raw index, for logging.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

pub(crate) struct TaskNode {
    pub(crate) name: String,
    pub(crate) task: Box<dyn GraphicsTask>,
    /// Tasks that must finish before this one starts.
    pub(crate) dependencies: Vec<TaskHandle>,
}

/// Builder for a [`Pipeline`].
///
/// Tasks are added first, then edges between their handles. [`build`]
/// validates the graph once so per-frame scheduling never has to.
///
/// [`build`]: PipelineBuilder::build
#[derive(Default)]
pub struct PipelineBuilder {
    nodes: Vec<TaskNode>,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a task. The returned handle is only valid within this builder
    /// and the pipeline it produces.
    pub fn add_task(&mut self, name: impl Into<String>, task: Box<dyn GraphicsTask>) -> TaskHandle {
        let handle = TaskHandle(self.nodes.len() as u32);
        self.nodes.push(TaskNode {
            name: name.into(),
            task,
            dependencies: Vec::new(),
        });
        handle
    }

    /// Declare that `dependent` must run after `dependency`.
    pub fn add_dependency(
        &mut self,
        dependent: TaskHandle,
        dependency: TaskHandle,
    ) -> Result<(), GraphError> {
        if dependency.index() >= self.nodes.len() {
            return Err(GraphError::InvalidTaskHandle(dependency));
        }
        let node = self
            .nodes
            .get_mut(dependent.index())
            .ok_or(GraphError::InvalidTaskHandle(dependent))?;
        if !node.dependencies.contains(&dependency) {
            node.dependencies.push(dependency);
        }
        Ok(())
    }

    /// Validate the graph and produce an executable pipeline.
    ///
    /// Fails with [`GraphError::CyclicDependency`] if the declared edges
    /// contain a cycle.
    pub fn build(self) -> Result<Pipeline, GraphError> {
        let dependencies: Vec<Vec<TaskHandle>> =
            self.nodes.iter().map(|n| n.dependencies.clone()).collect();
        crate::scheduler::make_schedule(self.nodes.len(), &dependencies)?;

        log::debug!("built pipeline with {} tasks", self.nodes.len());
        Ok(Pipeline { nodes: self.nodes })
    }
}

/// A validated frame graph, ready for per-frame execution.
pub struct Pipeline {
    nodes: Vec<TaskNode>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("task_count", &self.nodes.len())
            .finish()
    }
}

impl Pipeline {
    /// A pipeline with no tasks. Executing it is a no-op frame.
    pub fn empty() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Number of tasks in the pipeline.
    pub fn task_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Name the task was registered under.
    pub fn task_name(&self, handle: TaskHandle) -> Option<&str> {
        self.nodes.get(handle.index()).map(|n| n.name.as_str())
    }

    /// Handles this task depends on.
    pub fn dependencies(&self, handle: TaskHandle) -> &[TaskHandle] {
        self.nodes
            .get(handle.index())
            .map(|n| n.dependencies.as_slice())
            .unwrap_or(&[])
    }

    pub(crate) fn dependency_table(&self) -> Vec<Vec<TaskHandle>> {
        self.nodes.iter().map(|n| n.dependencies.clone()).collect()
    }

    pub(crate) fn node_mut(&mut self, handle: TaskHandle) -> Option<&mut TaskNode> {
        self.nodes.get_mut(handle.index())
    }

    pub(crate) fn nodes_mut(&mut self) -> &mut [TaskNode] {
        &mut self.nodes
    }
}
