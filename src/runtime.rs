//! Process lifetime: nodes running as tokio tasks, wired together by a [Pipeline].
//!
//! The control loop itself is the [NavigatorNode]. It reacts to sensor samples by updating
//! the cached state, and to its periodic timer by computing and publishing one command.

/// The periodic control loop node.
pub mod navigator;
pub use navigator::{NavigatorNode, NavigatorProp};

/// Node trait, cancel requests and the pipeline executing the nodes.
pub mod pipeline;
pub use pipeline::{CancelRequest, Node, Pipeline};
