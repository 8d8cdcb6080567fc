#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ParseNodeStatusError;

/// Classification of a node. Carries no behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum NodeType {
    Action,
    Condition,
    Control,
    Decorator,
    SubTree,
    #[default]
    Undefined,
}

impl NodeType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Action => "Action",
            Self::Condition => "Condition",
            Self::Control => "Control",
            Self::Decorator => "Decorator",
            Self::SubTree => "SubTree",
            Self::Undefined => "Undefined",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of a node at a given instant.
///
/// - `Idle`: never ticked, or reset by a halt.
/// - `Running`: in flight, not complete yet.
/// - `Success` / `Failure`: terminal for the current tick cycle.
/// - `Exit`: out-of-band terminal signal (e.g. shutdown), kept distinct from `Failure`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum NodeStatus {
    #[default]
    Idle,
    Running,
    Success,
    Failure,
    Exit,
}

impl NodeStatus {
    /// Anything other than `Idle` or `Running`.
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Idle | Self::Running)
    }

    /// `Success` or `Failure`: the node finished its task one way or the other.
    pub fn is_completed(self) -> bool {
        matches!(self, Self::Success | Self::Failure)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "IDLE",
            Self::Running => "RUNNING",
            Self::Success => "SUCCESS",
            Self::Failure => "FAILURE",
            Self::Exit => "EXIT",
        }
    }
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeStatus {
    type Err = ParseNodeStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let status = match s.trim().to_ascii_uppercase().as_str() {
            "IDLE" => Self::Idle,
            "RUNNING" => Self::Running,
            "SUCCESS" => Self::Success,
            "FAILURE" => Self::Failure,
            "EXIT" => Self::Exit,
            _ => return Err(ParseNodeStatusError(s.to_string())),
        };
        Ok(status)
    }
}

/// When a parallel composite is considered to have failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum FailurePolicy {
    /// Fail as soon as one child fails.
    #[default]
    FailOnOne,
    /// Fail only once every child has failed.
    FailOnAll,
}

impl FailurePolicy {
    pub fn is_triggered(self, failures: usize, total: usize) -> bool {
        match self {
            Self::FailOnOne => failures >= 1,
            Self::FailOnAll => total > 0 && failures >= total,
        }
    }
}

/// When a parallel composite is considered to have succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum SuccessPolicy {
    /// Succeed as soon as one child succeeds.
    SucceedOnOne,
    /// Succeed only once every child has succeeded.
    #[default]
    SucceedOnAll,
}

impl SuccessPolicy {
    pub fn is_triggered(self, successes: usize, total: usize) -> bool {
        match self {
            Self::SucceedOnOne => successes >= 1,
            Self::SucceedOnAll => total > 0 && successes >= total,
        }
    }
}

/// Which completed outcomes cause a composite to reset its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum ResetPolicy {
    #[default]
    OnSuccessOrFailure,
    OnSuccess,
    OnFailure,
}

impl ResetPolicy {
    pub fn should_reset(self, status: NodeStatus) -> bool {
        match self {
            Self::OnSuccessOrFailure => status.is_completed(),
            Self::OnSuccess => status == NodeStatus::Success,
            Self::OnFailure => status == NodeStatus::Failure,
        }
    }
}

/// Failure/success policy pair evaluated together.
///
/// When both policies trigger in the same evaluation, failure wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ParallelPolicy {
    pub failure: FailurePolicy,
    pub success: SuccessPolicy,
}

impl ParallelPolicy {
    pub fn new(failure: FailurePolicy, success: SuccessPolicy) -> Self {
        Self { failure, success }
    }

    /// Returns the composite outcome for the given child tallies, or `None` while undecided.
    pub fn resolve(self, successes: usize, failures: usize, total: usize) -> Option<NodeStatus> {
        if self.failure.is_triggered(failures, total) {
            Some(NodeStatus::Failure)
        } else if self.success.is_triggered(successes, total) {
            Some(NodeStatus::Success)
        } else {
            None
        }
    }
}
