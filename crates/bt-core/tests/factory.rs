use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use bt_core::{
    ConstructionError, FactoryError, NodeCore, NodeFactory, NodeParameters, NodeStatus, NodeType,
    SimpleAction, SimpleCondition, TreeNode,
};

/// Succeeds once the shared counter reaches `threshold`.
struct ThresholdCheck {
    core: NodeCore,
    threshold: u32,
    counter: Arc<AtomicU32>,
}

impl ThresholdCheck {
    fn build(
        name: &str,
        params: &NodeParameters,
        counter: Arc<AtomicU32>,
    ) -> Result<Self, ConstructionError> {
        let threshold = params.parse::<u32>(name, "threshold")?;
        Ok(Self {
            core: NodeCore::new(name),
            threshold,
            counter,
        })
    }
}

impl TreeNode for ThresholdCheck {
    fn core(&self) -> &NodeCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut NodeCore {
        &mut self.core
    }

    fn tick(&self) -> NodeStatus {
        if self.counter.load(Ordering::SeqCst) >= self.threshold {
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

fn factory_with_counter(counter: Arc<AtomicU32>) -> NodeFactory {
    let mut factory = NodeFactory::new();
    factory
        .register_simple("AlwaysFail", |name| {
            SimpleAction::new(name, |_halt| NodeStatus::Failure)
        })
        .unwrap();
    factory
        .register("Threshold", move |name: &str, params: &NodeParameters| {
            let node = ThresholdCheck::build(name, params, Arc::clone(&counter))?;
            Ok(Box::new(node) as Box<dyn TreeNode>)
        })
        .unwrap();
    factory
}

#[test]
fn registered_builder_produces_failing_node() {
    let factory = factory_with_counter(Arc::new(AtomicU32::new(0)));

    let node = factory
        .instantiate("AlwaysFail", "fail_1", &NodeParameters::new())
        .unwrap();

    assert_eq!(node.name(), "fail_1");
    assert_eq!(node.node_type(), NodeType::Action);
    assert_eq!(node.status(), NodeStatus::Idle);
    assert_eq!(node.execute_tick(), NodeStatus::Failure);
}

#[test]
fn missing_parameter_is_a_construction_error() {
    let factory = factory_with_counter(Arc::new(AtomicU32::new(0)));
    let params = NodeParameters::new().with("limit", "3");

    let err = factory
        .instantiate("Threshold", "check", &params)
        .unwrap_err();

    assert_eq!(
        err,
        FactoryError::Construction(ConstructionError::MissingParameter {
            node: "check".to_string(),
            key: "threshold".to_string(),
        })
    );
    assert_eq!(
        err.to_string(),
        "node `check`: missing required parameter `threshold`"
    );
}

#[test]
fn malformed_parameter_is_a_construction_error() {
    let factory = factory_with_counter(Arc::new(AtomicU32::new(0)));
    let params = NodeParameters::new().with("threshold", "three");

    match factory.instantiate("Threshold", "check", &params) {
        Err(FactoryError::Construction(ConstructionError::InvalidParameter { key, value, .. })) => {
            assert_eq!(key, "threshold");
            assert_eq!(value, "three");
        }
        other => panic!("expected invalid parameter, got {other:?}"),
    }
}

#[test]
fn built_node_reads_its_parameters() {
    let counter = Arc::new(AtomicU32::new(0));
    let factory = factory_with_counter(Arc::clone(&counter));
    let params: NodeParameters = [("threshold", "2")].into_iter().collect();

    let node = factory.instantiate("Threshold", "check", &params).unwrap();
    assert_eq!(node.execute_tick(), NodeStatus::Failure);

    counter.store(2, Ordering::SeqCst);
    assert_eq!(node.execute_tick(), NodeStatus::Success);
}

#[test]
fn unknown_and_duplicate_types_are_rejected() {
    let mut factory = factory_with_counter(Arc::new(AtomicU32::new(0)));

    assert_eq!(
        factory
            .instantiate("Sequence", "root", &NodeParameters::new())
            .unwrap_err(),
        FactoryError::UnknownType("Sequence".to_string())
    );

    let err = factory
        .register_simple("AlwaysFail", |name| SimpleCondition::new(name, || false))
        .unwrap_err();
    assert_eq!(err, FactoryError::DuplicateType("AlwaysFail".to_string()));

    assert_eq!(
        factory.type_names().collect::<Vec<_>>(),
        vec!["AlwaysFail", "Threshold"]
    );
    assert!(factory.unregister("AlwaysFail").is_some());
    assert!(!factory.contains("AlwaysFail"));
}

#[test]
fn builder_rejects_inconsistent_parameters() {
    let mut factory = NodeFactory::new();
    factory
        .register("Window", |name: &str, params: &NodeParameters| {
            let min = params.parse::<u32>(name, "min")?;
            let max = params.parse::<u32>(name, "max")?;
            if min > max {
                return Err(ConstructionError::Invalid {
                    node: name.to_string(),
                    reason: format!("min {min} exceeds max {max}"),
                });
            }
            Ok(Box::new(SimpleCondition::new(name, || true)) as Box<dyn TreeNode>)
        })
        .unwrap();

    let mut raw = BTreeMap::new();
    raw.insert("min".to_string(), "5".to_string());
    raw.insert("max".to_string(), "2".to_string());
    let mut params = NodeParameters::from(raw);

    let err = factory.instantiate("Window", "w", &params).unwrap_err();
    assert_eq!(err.to_string(), "node `w`: min 5 exceeds max 2");

    assert_eq!(params.remove("min"), Some("5".to_string()));
    assert_eq!(params.remove("min"), None);
    assert!(!params.contains("min"));
    params.insert("min", "1");
    assert!(factory.instantiate("Window", "w", &params).is_ok());
}

#[test]
fn parameters_lookup_helpers() {
    let mut params = NodeParameters::new()
        .with("speed", " 1.5 ")
        .with("mode", "fast");
    params.extend([("retries", "4")]);

    assert_eq!(params.len(), 3);
    assert_eq!(params.get("mode"), Some("fast"));
    assert_eq!(params.require("n", "mode"), Ok("fast"));
    assert_eq!(params.parse::<f32>("n", "speed"), Ok(1.5));
    assert_eq!(params.parse_or::<u8>("n", "retries", 1), Ok(4));
    assert_eq!(params.parse_or::<u8>("n", "timeout", 9), Ok(9));
    assert_eq!(
        params.parse::<NodeStatus>("n", "mode").unwrap_err().to_string(),
        "node `n`: parameter `mode` = `fast` is invalid: unknown node status `fast`"
    );

    assert_eq!(params.insert("mode", "slow"), Some("fast".to_string()));
    assert_eq!(
        params.iter().map(|(k, _)| k).collect::<Vec<_>>(),
        vec!["mode", "retries", "speed"]
    );
}
