//! Node execution contract.
//!
//! Every node embeds a [`NodeCore`] and implements [`TreeNode`]. The core holds the node name,
//! the guarded status register and the status-change signal; the trait supplies the tick, halt
//! and wait protocol on top of it.
//!
//! # Ordering
//!
//! A status update happens under the status lock, waiters are woken, and only then is the
//! transition published on the signal with the lock released. A callback may therefore query
//! the node (or subscribe to it) without deadlocking. The flip side is that another thread can
//! read the new status through [`TreeNode::status`] slightly before the matching publication has
//! reached every subscriber.

use std::fmt;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::signal::{Signal, Subscriber};
use crate::status::{NodeStatus, NodeType};

/// Status-change callback: `(core, previous, current)`.
///
/// Observers receive the node's [`NodeCore`], not the node itself: name, status, waits and
/// further subscriptions are available, [`TreeNode::node_type`] is not. Capture the type when
/// subscribing if the callback needs it.
pub type StatusChangeCallback = dyn Fn(&NodeCore, NodeStatus, NodeStatus) + Send + Sync;
pub type StatusChangeSignal = Signal<StatusChangeCallback>;
pub type StatusChangeSubscriber = Subscriber<StatusChangeCallback>;

#[derive(Debug)]
struct StatusState {
    status: NodeStatus,
    next_ticket: u64,
    // Blocked waiters and the first terminal status delivered to each of them.
    waiters: Vec<(u64, Option<NodeStatus>)>,
}

impl StatusState {
    fn delivered(&self, ticket: u64) -> Option<NodeStatus> {
        self.waiters
            .iter()
            .find(|(t, _)| *t == ticket)
            .and_then(|(_, status)| *status)
    }

    fn take(&mut self, ticket: u64) -> Option<NodeStatus> {
        let index = self.waiters.iter().position(|(t, _)| *t == ticket)?;
        self.waiters.swap_remove(index).1
    }
}

/// Status value bundled with the lock and condition variable that guard it.
#[derive(Debug)]
struct StatusCell {
    state: Mutex<StatusState>,
    changed: Condvar,
}

impl StatusCell {
    fn new() -> Self {
        Self {
            state: Mutex::new(StatusState {
                status: NodeStatus::Idle,
                next_ticket: 0,
                waiters: Vec::new(),
            }),
            changed: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, StatusState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn get(&self) -> NodeStatus {
        self.lock().status
    }

    /// Stores `status` and returns the value it replaced.
    fn replace(&self, status: NodeStatus) -> NodeStatus {
        let previous = {
            let mut state = self.lock();
            let previous = std::mem::replace(&mut state.status, status);
            if status.is_terminal() {
                for (_, delivered) in state.waiters.iter_mut() {
                    delivered.get_or_insert(status);
                }
            }
            previous
        };
        self.changed.notify_all();
        previous
    }

    /// Registers a waiter, or returns the current status right away if it is already terminal.
    fn enqueue(&self) -> Result<(MutexGuard<'_, StatusState>, u64), NodeStatus> {
        let mut state = self.lock();
        if state.status.is_terminal() {
            return Err(state.status);
        }
        let ticket = state.next_ticket;
        state.next_ticket = state.next_ticket.wrapping_add(1);
        state.waiters.push((ticket, None));
        Ok((state, ticket))
    }

    fn waiters(&self) -> usize {
        self.lock().waiters.len()
    }

    fn wait_terminal(&self) -> NodeStatus {
        let (state, ticket) = match self.enqueue() {
            Ok(registered) => registered,
            Err(status) => return status,
        };
        let mut state = self
            .changed
            .wait_while(state, |state| state.delivered(ticket).is_none())
            .unwrap_or_else(PoisonError::into_inner);
        state.take(ticket).unwrap_or(state.status)
    }

    fn wait_terminal_timeout(&self, timeout: Duration) -> Option<NodeStatus> {
        let (state, ticket) = match self.enqueue() {
            Ok(registered) => registered,
            Err(status) => return Some(status),
        };
        let (mut state, _) = self
            .changed
            .wait_timeout_while(state, timeout, |state| state.delivered(ticket).is_none())
            .unwrap_or_else(PoisonError::into_inner);
        // A delivery racing the deadline still counts.
        state.take(ticket)
    }
}

/// State shared by every node: name, guarded status and status-change signal.
pub struct NodeCore {
    name: String,
    status: StatusCell,
    signal: StatusChangeSignal,
}

impl fmt::Debug for NodeCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeCore")
            .field("name", &self.name)
            .field("status", &self.status())
            .field("subscribers", &self.signal.subscriber_count())
            .finish()
    }
}

impl NodeCore {
    /// A new core starts out `Idle`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: StatusCell::new(),
            signal: Signal::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn status(&self) -> NodeStatus {
        self.status.get()
    }

    pub fn is_halted(&self) -> bool {
        self.status() == NodeStatus::Idle
    }

    /// Stores `status`, wakes waiters, then publishes `(previous, status)` with no lock held.
    ///
    /// Publishes on every call, including when `status` equals the current value. Returns the
    /// previous status.
    pub fn set_status(&self, status: NodeStatus) -> NodeStatus {
        let previous = self.status.replace(status);
        bt_debug!(node = %self.name, %previous, %status, "status changed");
        self.signal.publish(|callback| callback(self, previous, status));
        previous
    }

    /// Blocks until the status is terminal and returns it.
    ///
    /// If the status is already terminal it is returned immediately. Otherwise the caller gets
    /// the first terminal status set after it started waiting, even if the status has moved on
    /// again by the time the thread is scheduled.
    pub fn wait_valid_status(&self) -> NodeStatus {
        self.status.wait_terminal()
    }

    /// Like [`NodeCore::wait_valid_status`] but gives up after `timeout`, returning `None`.
    pub fn wait_valid_status_timeout(&self, timeout: Duration) -> Option<NodeStatus> {
        self.status.wait_terminal_timeout(timeout)
    }

    /// Number of threads currently blocked in a wait on this node.
    pub fn waiting_threads(&self) -> usize {
        self.status.waiters()
    }

    pub fn subscribe_to_status_change<C>(&self, callback: C) -> StatusChangeSubscriber
    where
        C: Fn(&NodeCore, NodeStatus, NodeStatus) + Send + Sync + 'static,
    {
        let callback: Arc<StatusChangeCallback> = Arc::new(callback);
        bt_debug!(node = %self.name, "status change subscription added");
        self.signal.subscribe(callback)
    }

    pub fn status_change_signal(&self) -> &StatusChangeSignal {
        &self.signal
    }
}

/// A behavior tree node.
///
/// Implementors provide [`TreeNode::tick`], [`TreeNode::halt`] and [`TreeNode::node_type`], and
/// expose their embedded [`NodeCore`]. Both `tick` and `halt` take `&self`: a supervising thread
/// may halt a node while another thread is inside its tick, so per-node mutable state belongs
/// behind interior mutability.
///
/// Children, when a node has any, are owned as `Box<dyn TreeNode>` by the concrete node type.
pub trait TreeNode: Send + Sync {
    fn core(&self) -> &NodeCore;

    fn core_mut(&mut self) -> &mut NodeCore;

    /// One evaluation step. `Idle`/`Running` are transient results; a task that cannot complete
    /// reports `Failure` rather than panicking.
    ///
    /// Only [`TreeNode::execute_tick`] should call this.
    fn tick(&self) -> NodeStatus;

    /// Requests cooperative interruption of running work and drives the status back to `Idle`.
    ///
    /// Must not block and must tolerate running concurrently with `tick` on another thread.
    /// Calling it from inside the node's own `tick` is not supported.
    fn halt(&self);

    fn node_type(&self) -> NodeType;

    /// Runs [`TreeNode::tick`] with no lock held, stores the result, wakes waiters and publishes
    /// the transition.
    fn execute_tick(&self) -> NodeStatus {
        bt_debug!(node = %self.name(), "tick");
        let status = self.tick();
        self.core().set_status(status);
        status
    }

    fn status(&self) -> NodeStatus {
        self.core().status()
    }

    fn set_status(&self, status: NodeStatus) -> NodeStatus {
        self.core().set_status(status)
    }

    fn is_halted(&self) -> bool {
        self.core().is_halted()
    }

    fn name(&self) -> &str {
        self.core().name()
    }

    fn set_name(&mut self, name: String) {
        self.core_mut().set_name(name);
    }

    fn wait_valid_status(&self) -> NodeStatus {
        self.core().wait_valid_status()
    }

    fn wait_valid_status_timeout(&self, timeout: Duration) -> Option<NodeStatus> {
        self.core().wait_valid_status_timeout(timeout)
    }

    /// Subscribes `callback` to every status update of this node. Dropping the returned handle
    /// (all clones of it) unsubscribes.
    ///
    /// The callback sees this node's [`NodeCore`] only, so node-level queries such as
    /// [`TreeNode::node_type`] must be captured up front.
    fn subscribe_to_status_change(
        &self,
        callback: Box<dyn Fn(&NodeCore, NodeStatus, NodeStatus) + Send + Sync>,
    ) -> StatusChangeSubscriber {
        self.core().subscribe_to_status_change(callback)
    }
}

impl fmt::Debug for dyn TreeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeNode")
            .field("name", &self.name())
            .field("type", &self.node_type())
            .field("status", &self.status())
            .finish()
    }
}
