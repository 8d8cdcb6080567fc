use std::collections::BTreeMap;
use std::fmt;

use crate::error::{ConstructionError, FactoryError};
use crate::node::TreeNode;
use crate::params::NodeParameters;

/// Builds an owned node from its instance name and parameters.
///
/// A builder only constructs; a missing or malformed parameter is a [`ConstructionError`].
pub type NodeBuilder = Box<
    dyn Fn(&str, &NodeParameters) -> Result<Box<dyn TreeNode>, ConstructionError> + Send + Sync,
>;

/// Maps node type names to their builders.
#[derive(Default)]
pub struct NodeFactory {
    builders: BTreeMap<String, NodeBuilder>,
}

impl fmt::Debug for NodeFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeFactory")
            .field("types", &self.builders.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl NodeFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<B>(
        &mut self,
        type_name: impl Into<String>,
        builder: B,
    ) -> Result<(), FactoryError>
    where
        B: Fn(&str, &NodeParameters) -> Result<Box<dyn TreeNode>, ConstructionError>
            + Send
            + Sync
            + 'static,
    {
        let type_name = type_name.into();
        if self.builders.contains_key(&type_name) {
            return Err(FactoryError::DuplicateType(type_name));
        }
        tracing::debug!(node_type = %type_name, "registered node builder");
        self.builders.insert(type_name, Box::new(builder));
        Ok(())
    }

    /// Registers a builder for a node type that takes no parameters.
    pub fn register_simple<N, C>(
        &mut self,
        type_name: impl Into<String>,
        constructor: C,
    ) -> Result<(), FactoryError>
    where
        N: TreeNode + 'static,
        C: Fn(&str) -> N + Send + Sync + 'static,
    {
        self.register(type_name, move |name: &str, _params: &NodeParameters| {
            Ok(Box::new(constructor(name)) as Box<dyn TreeNode>)
        })
    }

    pub fn unregister(&mut self, type_name: &str) -> Option<NodeBuilder> {
        self.builders.remove(type_name)
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.builders.contains_key(type_name)
    }

    /// Registered type names, sorted.
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.builders.keys().map(String::as_str)
    }

    /// Builds a node of type `type_name` named `node_name`.
    pub fn instantiate(
        &self,
        type_name: &str,
        node_name: &str,
        params: &NodeParameters,
    ) -> Result<Box<dyn TreeNode>, FactoryError> {
        let builder = self
            .builders
            .get(type_name)
            .ok_or_else(|| FactoryError::UnknownType(type_name.to_string()))?;

        match builder(node_name, params) {
            Ok(node) => Ok(node),
            Err(err) => {
                tracing::warn!(
                    node_type = %type_name,
                    node = %node_name,
                    error = %err,
                    "node construction failed"
                );
                Err(err.into())
            }
        }
    }
}
