//! Thread-safe execution contract shared by every behavior tree node.
//!
//! A node owns a guarded status register with blocking wait-for-completion, a status-change
//! [`Signal`] whose subscriptions live exactly as long as their [`Subscriber`] handles, and can be
//! built generically from a type name and a [`NodeParameters`] set through a [`NodeFactory`].
//!
//! Concrete composite nodes (sequence, fallback, parallel) and tree loading live elsewhere; this
//! crate only defines the contract they build on.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

#[macro_use]
mod macros;

pub mod error;
pub mod factory;
pub mod leaf;
pub mod node;
pub mod params;
pub mod signal;
pub mod status;

pub use error::{ConstructionError, FactoryError, ParseNodeStatusError};
pub use factory::{NodeBuilder, NodeFactory};
pub use leaf::{HaltToken, SimpleAction, SimpleCondition};
pub use node::{
    NodeCore, StatusChangeCallback, StatusChangeSignal, StatusChangeSubscriber, TreeNode,
};
pub use params::NodeParameters;
pub use signal::{Signal, Subscriber};
pub use status::{FailurePolicy, NodeStatus, NodeType, ParallelPolicy, ResetPolicy, SuccessPolicy};
