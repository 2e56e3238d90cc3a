//! Host-supplied permission predicates.

use super::types::{Edge, Node};

/// Vetoes for destructive or structural edits. Every method defaults to
/// permitting the edit, so an empty `impl` allows everything.
pub trait GraphPolicy {
	fn can_delete_node(&self, _node: &Node) -> bool {
		true
	}

	fn can_delete_edge(&self, _edge: &Edge) -> bool {
		true
	}

	fn can_create_edge(&self, _source: &Node, _target: &Node) -> bool {
		true
	}
}

/// Allows every edit.
#[derive(Clone, Copy, Debug, Default)]
pub struct Permissive;

impl GraphPolicy for Permissive {}

type NodePredicate = Box<dyn Fn(&Node) -> bool>;
type EdgePredicate = Box<dyn Fn(&Edge) -> bool>;
type PairPredicate = Box<dyn Fn(&Node, &Node) -> bool>;

/// Policy assembled from optional closures; unset predicates permit.
#[derive(Default)]
pub struct Predicates {
	can_delete_node: Option<NodePredicate>,
	can_delete_edge: Option<EdgePredicate>,
	can_create_edge: Option<PairPredicate>,
}

impl Predicates {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_can_delete_node(mut self, f: impl Fn(&Node) -> bool + 'static) -> Self {
		self.can_delete_node = Some(Box::new(f));
		self
	}

	pub fn with_can_delete_edge(mut self, f: impl Fn(&Edge) -> bool + 'static) -> Self {
		self.can_delete_edge = Some(Box::new(f));
		self
	}

	pub fn with_can_create_edge(mut self, f: impl Fn(&Node, &Node) -> bool + 'static) -> Self {
		self.can_create_edge = Some(Box::new(f));
		self
	}
}

impl GraphPolicy for Predicates {
	fn can_delete_node(&self, node: &Node) -> bool {
		self.can_delete_node.as_ref().is_none_or(|f| f(node))
	}

	fn can_delete_edge(&self, edge: &Edge) -> bool {
		self.can_delete_edge.as_ref().is_none_or(|f| f(edge))
	}

	fn can_create_edge(&self, source: &Node, target: &Node) -> bool {
		self.can_create_edge
			.as_ref()
			.is_none_or(|f| f(source, target))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn unset_predicates_permit() {
		let policy = Predicates::new();
		let (a, b) = (Node::new(1, "A", 0.0, 0.0, ""), Node::new(2, "B", 0.0, 0.0, ""));
		assert!(policy.can_delete_node(&a));
		assert!(policy.can_delete_edge(&Edge::new(1, 2, "")));
		assert!(policy.can_create_edge(&a, &b));
	}

	#[test]
	fn set_predicates_are_consulted() {
		let policy = Predicates::new()
			.with_can_create_edge(|s, t| s.key != t.key)
			.with_can_delete_node(|n| n.title != "root");
		let a = Node::new(1, "root", 0.0, 0.0, "");
		let b = Node::new(2, "leaf", 0.0, 0.0, "");
		assert!(!policy.can_create_edge(&a, &a));
		assert!(policy.can_create_edge(&a, &b));
		assert!(!policy.can_delete_node(&a));
		assert!(policy.can_delete_node(&b));
	}
}
