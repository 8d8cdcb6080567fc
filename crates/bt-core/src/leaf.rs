//! Closure-backed leaf nodes.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::node::{NodeCore, TreeNode};
use crate::status::{NodeStatus, NodeType};

/// Cooperative interruption flag shared between a node and the work it runs.
#[derive(Debug, Clone, Default)]
pub struct HaltToken {
    requested: Arc<AtomicBool>,
}

impl HaltToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.requested.store(true, Ordering::Release);
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::Acquire)
    }

    fn clear(&self) {
        self.requested.store(false, Ordering::Release);
    }
}

/// Condition leaf: `Success` when the predicate holds, `Failure` otherwise.
pub struct SimpleCondition<F> {
    core: NodeCore,
    predicate: F,
}

impl<F> SimpleCondition<F>
where
    F: Fn() -> bool + Send + Sync,
{
    pub fn new(name: impl Into<String>, predicate: F) -> Self {
        Self {
            core: NodeCore::new(name),
            predicate,
        }
    }
}

impl<F> fmt::Debug for SimpleCondition<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimpleCondition")
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

impl<F> TreeNode for SimpleCondition<F>
where
    F: Fn() -> bool + Send + Sync,
{
    fn core(&self) -> &NodeCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut NodeCore {
        &mut self.core
    }

    fn tick(&self) -> NodeStatus {
        if (self.predicate)() {
            NodeStatus::Success
        } else {
            NodeStatus::Failure
        }
    }

    fn halt(&self) {
        self.core.set_status(NodeStatus::Idle);
    }

    fn node_type(&self) -> NodeType {
        NodeType::Condition
    }
}

/// Action leaf running `action` on every tick.
///
/// The action receives a [`HaltToken`] that [`TreeNode::halt`] raises, possibly from another
/// thread while the action is running. Long-running work should poll it and bail out. The token
/// is cleared when a new run starts, i.e. on a tick while the node is not `Running`.
pub struct SimpleAction<F> {
    core: NodeCore,
    halt: HaltToken,
    action: F,
}

impl<F> SimpleAction<F>
where
    F: Fn(&HaltToken) -> NodeStatus + Send + Sync,
{
    pub fn new(name: impl Into<String>, action: F) -> Self {
        Self {
            core: NodeCore::new(name),
            halt: HaltToken::new(),
            action,
        }
    }

    pub fn halt_token(&self) -> &HaltToken {
        &self.halt
    }
}

impl<F> fmt::Debug for SimpleAction<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimpleAction")
            .field("core", &self.core)
            .field("halt_requested", &self.halt.is_requested())
            .finish_non_exhaustive()
    }
}

impl<F> TreeNode for SimpleAction<F>
where
    F: Fn(&HaltToken) -> NodeStatus + Send + Sync,
{
    fn core(&self) -> &NodeCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut NodeCore {
        &mut self.core
    }

    fn tick(&self) -> NodeStatus {
        if self.core.status() != NodeStatus::Running {
            self.halt.clear();
        }
        (self.action)(&self.halt)
    }

    fn halt(&self) {
        self.halt.request();
        self.core.set_status(NodeStatus::Idle);
    }

    fn node_type(&self) -> NodeType {
        NodeType::Action
    }
}
