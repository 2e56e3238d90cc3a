//! Graph data structures exchanged with the host application.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use super::error::LoadError;
use super::geometry::Point;

/// Identity of a node. JSON numbers and strings both deserialize into it,
/// so `1` and `"1"` name the same node.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NodeKey(pub String);

impl NodeKey {
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for NodeKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<&str> for NodeKey {
	fn from(value: &str) -> Self {
		Self(value.to_string())
	}
}

impl From<u64> for NodeKey {
	fn from(value: u64) -> Self {
		Self(value.to_string())
	}
}

impl<'de> Deserialize<'de> for NodeKey {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		#[derive(Deserialize)]
		#[serde(untagged)]
		enum RawKey {
			Text(String),
			Int(i64),
			Float(f64),
		}

		Ok(match RawKey::deserialize(deserializer)? {
			RawKey::Text(s) => NodeKey(s),
			RawKey::Int(i) => NodeKey(i.to_string()),
			RawKey::Float(f) => NodeKey(f.to_string()),
		})
	}
}

/// A node placed in world space.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Node {
	/// Unique among nodes. Uniqueness is the caller's responsibility.
	pub key: NodeKey,
	pub title: String,
	/// World-space x of the node centre.
	pub x: f64,
	/// World-space y of the node centre.
	pub y: f64,
	/// Selects the symbol drawn for the node and where its title sits.
	#[serde(rename = "type")]
	pub node_type: String,
	/// Optional underlay symbol drawn behind the main shape.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub subtype: Option<String>,
}

impl Node {
	pub fn new(key: impl Into<NodeKey>, title: &str, x: f64, y: f64, node_type: &str) -> Self {
		Self {
			key: key.into(),
			title: title.to_string(),
			x,
			y,
			node_type: node_type.to_string(),
			subtype: None,
		}
	}

	pub fn with_subtype(mut self, subtype: &str) -> Self {
		self.subtype = Some(subtype.to_string());
		self
	}

	pub fn position(&self) -> Point {
		Point::new(self.x, self.y)
	}
}

/// A directed edge between two node keys.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Edge {
	pub source: NodeKey,
	pub target: NodeKey,
	#[serde(rename = "type", default)]
	pub edge_type: String,
}

impl Edge {
	pub fn new(source: impl Into<NodeKey>, target: impl Into<NodeKey>, edge_type: &str) -> Self {
		Self {
			source: source.into(),
			target: target.into(),
			edge_type: edge_type.to_string(),
		}
	}

	/// Identity used when diffing: the ordered `(source, target)` pair.
	pub fn key(&self) -> EdgeKey {
		EdgeKey {
			source: self.source.clone(),
			target: self.target.clone(),
		}
	}
}

/// Ordered endpoint pair identifying an edge. Displays as `source:target`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeKey {
	pub source: NodeKey,
	pub target: NodeKey,
}

impl EdgeKey {
	pub fn new(source: impl Into<NodeKey>, target: impl Into<NodeKey>) -> Self {
		Self {
			source: source.into(),
			target: target.into(),
		}
	}
}

impl fmt::Display for EdgeKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}:{}", self.source, self.target)
	}
}

/// The single selected entity, if any.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Selection {
	Node(NodeKey),
	Edge(EdgeKey),
}

/// Complete graph data: nodes and edges.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct GraphData {
	pub nodes: Vec<Node>,
	pub edges: Vec<Edge>,
}

#[derive(Deserialize)]
struct RawGraph {
	#[serde(default)]
	nodes: Vec<RawNode>,
	#[serde(default, alias = "links")]
	edges: Vec<Edge>,
}

#[derive(Deserialize)]
struct RawNode {
	#[serde(default)]
	title: Option<String>,
	#[serde(default)]
	x: f64,
	#[serde(default)]
	y: f64,
	#[serde(rename = "type", default)]
	node_type: Option<String>,
	#[serde(default)]
	subtype: Option<String>,
	#[serde(flatten)]
	rest: HashMap<String, serde_json::Value>,
}

impl GraphData {
	/// Parse `{ nodes: [...], edges: [...] }`, reading each node's identity
	/// from the field named `node_key` (`links` is accepted for `edges`).
	pub fn from_json(text: &str, node_key: &str) -> Result<Self, LoadError> {
		let raw: RawGraph = serde_json::from_str(text)?;
		let nodes = raw
			.nodes
			.into_iter()
			.enumerate()
			.map(|(index, mut node)| {
				let key = node.rest.remove(node_key).ok_or_else(|| LoadError::MissingKey {
					index,
					key: node_key.to_string(),
				})?;
				Ok(Node {
					key: NodeKey::deserialize(key)?,
					title: node.title.unwrap_or_default(),
					x: node.x,
					y: node.y,
					node_type: node.node_type.unwrap_or_default(),
					subtype: node.subtype,
				})
			})
			.collect::<Result<Vec<_>, LoadError>>()?;

		Ok(Self {
			nodes,
			edges: raw.edges,
		})
	}
}

/// A high-level mutation request emitted by the interaction layer.
///
/// When the editor owns its data these are applied to the in-memory model;
/// when embedded they are handed to the host, which owns the collections.
#[derive(Clone, Debug, PartialEq)]
pub enum GraphIntent {
	/// Select a node, or clear the selection with `None`.
	SelectNode(Option<Node>),
	SelectEdge(Edge),
	/// Create a node at world coordinates.
	CreateNode { x: f64, y: f64 },
	/// A node finished moving; carries its final position.
	UpdateNode(Node),
	CreateEdge { source: Node, target: Node },
	/// Re-point `old` so it runs from `source` to `target`.
	SwapEdge { source: Node, target: Node, old: Edge },
	DeleteNode(Node),
	DeleteEdge(Edge),
}
