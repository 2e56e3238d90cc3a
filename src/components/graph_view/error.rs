//! Recoverable faults raised while interpreting gestures and rendering,
//! plus the errors returned when loading embedded graph data.

use std::fmt;

use thiserror::Error;

use super::types::EdgeKey;

/// A mutation the host can veto through its [`GraphPolicy`](super::policy::GraphPolicy).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
	CreateEdge,
	SwapEdge,
	DeleteNode,
	DeleteEdge,
}

impl fmt::Display for Action {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Action::CreateEdge => "create edge",
			Action::SwapEdge => "swap edge",
			Action::DeleteNode => "delete node",
			Action::DeleteEdge => "delete edge",
		})
	}
}

/// Every way an interaction or render pass can degrade to a no-op.
///
/// None of these are fatal: the editor logs them and, for gestures,
/// restores whatever transient visual state the gesture changed.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Fault {
	/// An edge names a node key that is not in the model.
	#[error("unable to get source or target for edge {0}")]
	UnresolvedEdge(EdgeKey),
	/// The policy declined the mutation.
	#[error("{0} not permitted")]
	PermissionDenied(Action),
	/// An edge drag was released away from any node.
	#[error("edge drag ended without a target node")]
	NoDropTarget,
	/// Dropping the edge handle back where it was would not change the edge.
	#[error("swapping edge {0} would leave it unchanged")]
	TrivialSwap(EdgeKey),
	/// The graph is read-only.
	#[error("graph is read-only")]
	ReadOnly,
}

/// Failure while reading graph data or configuration from JSON.
#[derive(Debug, Error)]
pub enum LoadError {
	#[error("invalid graph json: {0}")]
	Json(#[from] serde_json::Error),
	#[error("node #{index} has no `{key}` field")]
	MissingKey { index: usize, key: String },
	#[error("zoom range [{min}, {max}] is not a positive, ordered range")]
	ZoomRange { min: f64, max: f64 },
}
