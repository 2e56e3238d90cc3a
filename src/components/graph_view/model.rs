//! In-memory graph collections with key lookup and the current selection.
//!
//! The model is the single place nodes, edges and the selection are stored.
//! The renderer only reads it; the editor mutates it, either by applying a
//! [`GraphIntent`] (when the editor owns the data) or by replacing the data
//! wholesale when the host pushes new collections.

use std::collections::HashMap;

use log::{debug, warn};

use super::geometry::{Bounds, Point};
use super::types::{Edge, EdgeKey, GraphData, GraphIntent, Node, NodeKey, Selection};

#[derive(Clone, Debug, Default)]
pub struct GraphModel {
	nodes: Vec<Node>,
	edges: Vec<Edge>,
	index: HashMap<NodeKey, usize>,
	selected: Option<Selection>,
}

impl GraphModel {
	pub fn new(data: GraphData) -> Self {
		let mut model = Self {
			nodes: data.nodes,
			edges: data.edges,
			..Self::default()
		};
		model.reindex();
		model
	}

	fn reindex(&mut self) {
		self.index = self
			.nodes
			.iter()
			.enumerate()
			.map(|(i, node)| (node.key.clone(), i))
			.collect();
	}

	pub fn nodes(&self) -> &[Node] {
		&self.nodes
	}

	pub fn edges(&self) -> &[Edge] {
		&self.edges
	}

	pub fn node(&self, key: &NodeKey) -> Option<&Node> {
		self.index.get(key).map(|&i| &self.nodes[i])
	}

	pub fn edge(&self, key: &EdgeKey) -> Option<&Edge> {
		self.edges
			.iter()
			.find(|e| e.source == key.source && e.target == key.target)
	}

	pub fn contains_edge(&self, key: &EdgeKey) -> bool {
		self.edge(key).is_some()
	}

	/// Replace both collections, keeping the selection only if it still resolves.
	pub fn replace(&mut self, data: GraphData) {
		self.nodes = data.nodes;
		self.edges = data.edges;
		self.reindex();
		if !self.selection_resolves() {
			self.selected = None;
		}
	}

	pub fn selected(&self) -> Option<&Selection> {
		self.selected.as_ref()
	}

	pub fn set_selected(&mut self, selection: Option<Selection>) {
		self.selected = selection;
	}

	pub fn selected_node(&self) -> Option<&Node> {
		match &self.selected {
			Some(Selection::Node(key)) => self.node(key),
			_ => None,
		}
	}

	pub fn selected_edge(&self) -> Option<&Edge> {
		match &self.selected {
			Some(Selection::Edge(key)) => self.edge(key),
			_ => None,
		}
	}

	fn selection_resolves(&self) -> bool {
		match &self.selected {
			None => true,
			Some(Selection::Node(key)) => self.node(key).is_some(),
			Some(Selection::Edge(key)) => self.contains_edge(key),
		}
	}

	/// Move a node in place. Returns false if the key is unknown.
	pub fn move_node(&mut self, key: &NodeKey, to: Point) -> bool {
		match self.index.get(key) {
			Some(&i) => {
				self.nodes[i].x = to.x;
				self.nodes[i].y = to.y;
				true
			}
			None => false,
		}
	}

	/// Next free numeric key: one more than the largest numeric key in use.
	pub fn next_key(&self) -> NodeKey {
		let max = self
			.nodes
			.iter()
			.filter_map(|n| n.key.as_str().parse::<u64>().ok())
			.max();
		NodeKey::from(max.map_or(1, |m| m + 1))
	}

	/// Bounding box of every node drawn as a `node_size` square.
	pub fn bounds(&self, node_size: f64) -> Option<Bounds> {
		Bounds::around(self.nodes.iter().map(Node::position), node_size / 2.0)
	}

	/// Apply an intent with standalone semantics. `new_node_type` is the
	/// type tag given to nodes created from a canvas click.
	pub fn apply(&mut self, intent: &GraphIntent, new_node_type: &str) {
		debug!("graph: applying {:?}", intent);
		match intent {
			GraphIntent::SelectNode(node) => {
				self.selected = node.as_ref().map(|n| Selection::Node(n.key.clone()));
			}
			GraphIntent::SelectEdge(edge) => {
				self.selected = Some(Selection::Edge(edge.key()));
			}
			GraphIntent::CreateNode { x, y } => {
				let key = self.next_key();
				self.insert_node(Node::new(key, "New Node", *x, *y, new_node_type));
			}
			GraphIntent::UpdateNode(node) => self.update_node(node),
			GraphIntent::CreateEdge { source, target } => {
				self.insert_edge(Edge::new(source.key.clone(), target.key.clone(), ""));
			}
			GraphIntent::SwapEdge {
				source,
				target,
				old,
			} => self.swap_edge(old, &source.key, &target.key),
			GraphIntent::DeleteNode(node) => self.remove_node(&node.key),
			GraphIntent::DeleteEdge(edge) => self.remove_edge(&edge.key()),
		}
	}

	pub fn insert_node(&mut self, node: Node) {
		if self.index.contains_key(&node.key) {
			warn!("graph: node {} already exists, ignoring insert", node.key);
			return;
		}
		self.index.insert(node.key.clone(), self.nodes.len());
		self.nodes.push(node);
	}

	pub fn update_node(&mut self, node: &Node) {
		match self.index.get(&node.key) {
			Some(&i) => self.nodes[i] = node.clone(),
			None => warn!("graph: cannot update unknown node {}", node.key),
		}
	}

	/// Remove a node and, in the same step, every edge touching it.
	pub fn remove_node(&mut self, key: &NodeKey) {
		let Some(&i) = self.index.get(key) else {
			warn!("graph: cannot delete unknown node {}", key);
			return;
		};
		self.nodes.remove(i);
		self.edges.retain(|e| &e.source != key && &e.target != key);
		self.reindex();
		if !self.selection_resolves() {
			self.selected = None;
		}
	}

	/// Add an edge between two existing nodes. Duplicates of an existing
	/// `(source, target)` pair are ignored.
	pub fn insert_edge(&mut self, edge: Edge) {
		if self.node(&edge.source).is_none() || self.node(&edge.target).is_none() {
			warn!("graph: edge {} references a missing node", edge.key());
			return;
		}
		if self.contains_edge(&edge.key()) {
			debug!("graph: edge {} already exists", edge.key());
			return;
		}
		self.edges.push(edge);
	}

	pub fn remove_edge(&mut self, key: &EdgeKey) {
		self.edges
			.retain(|e| !(e.source == key.source && e.target == key.target));
		if !self.selection_resolves() {
			self.selected = None;
		}
	}

	/// Re-point `old` at `(source, target)`, keeping its position and type.
	/// If the new pair already exists the old edge is simply dropped.
	pub fn swap_edge(&mut self, old: &Edge, source: &NodeKey, target: &NodeKey) {
		let new_key = EdgeKey::new(source.clone(), target.clone());
		if self.contains_edge(&new_key) {
			self.remove_edge(&old.key());
			return;
		}
		match self
			.edges
			.iter_mut()
			.find(|e| e.source == old.source && e.target == old.target)
		{
			Some(edge) => {
				edge.source = source.clone();
				edge.target = target.clone();
			}
			None => warn!("graph: cannot swap unknown edge {}", old.key()),
		}
		if self.selected == Some(Selection::Edge(old.key())) {
			self.selected = Some(Selection::Edge(new_key));
		}
	}
}
