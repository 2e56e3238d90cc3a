//! Pointer and keyboard interaction state machine.
//!
//! [`InteractionState`] holds everything a gesture needs between
//! independently dispatched events: focus, the hovered node, the pending
//! node selection, whether an edge is being drawn, and the edge queued for an
//! endpoint swap. [`InteractionState::handle`] consumes one [`InputEvent`]
//! against a read-only view of the model and returns the [`Effect`]s the
//! editor must apply before the next render.
//!
//! Gesture phases:
//!
//! | Phase | Entered by | Left by |
//! |-------|------------|---------|
//! | selecting node | node mouse-down | node mouse-up (selects) or press end |
//! | dragging node | drag start on a node | drag end (emits update) |
//! | drawing edge | drag start after shift+press on a node, or on an edge arrowhead | drag end (create/swap or rollback) |
//!
//! The drop target of an edge drag is the node under the pointer at release,
//! not the last hovered node. Every press ends with
//! [`InputEvent::PressEnd`], which clears whatever the press armed.

use log::{debug, warn};

use super::config::GraphConfig;
use super::error::{Action, Fault};
use super::geometry::{Point, distance};
use super::input::{DragTarget, InputEvent};
use super::model::GraphModel;
use super::policy::GraphPolicy;
use super::types::{Edge, EdgeKey, GraphIntent, NodeKey, Selection};

/// What the editor has to do in response to an event.
#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
	/// Emit a mutation to the data owner.
	Intent(GraphIntent),
	/// Live position update while dragging; the model is moved in place.
	MoveNode { key: NodeKey, to: Point },
	/// The gesture was cancelled; transient visuals have been restored.
	Rollback(Fault),
}

/// The drag gesture in progress, if any.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Gesture {
	#[default]
	Idle,
	DraggingNode {
		key: NodeKey,
		position: Point,
	},
	/// A transient edge from `source` to the live pointer.
	DrawingEdge {
		source: NodeKey,
		pointer: Point,
	},
}

#[derive(Clone, Debug)]
pub struct InteractionState {
	focused: bool,
	hovered: Option<NodeKey>,
	/// Node pressed and not yet released; a matching mouse-up selects it.
	selecting_node: Option<NodeKey>,
	drawing_edge: bool,
	/// Edge whose arrowhead was grabbed; consumed when the edge drag ends.
	swap_queue: Option<Edge>,
	/// Edge hidden while its replacement is being dragged.
	hidden_edge: Option<EdgeKey>,
	gesture: Gesture,
	read_only: bool,
	enable_focus: bool,
	arrow_hit_radius: f64,
}

impl InteractionState {
	pub fn new(config: &GraphConfig) -> Self {
		Self {
			focused: true,
			hovered: None,
			selecting_node: None,
			drawing_edge: false,
			swap_queue: None,
			hidden_edge: None,
			gesture: Gesture::Idle,
			read_only: config.read_only,
			enable_focus: config.enable_focus,
			arrow_hit_radius: config.arrow_hit_radius(),
		}
	}

	pub fn focused(&self) -> bool {
		self.focused
	}

	pub fn hovered(&self) -> Option<&NodeKey> {
		self.hovered.as_ref()
	}

	pub fn is_selecting_node(&self) -> bool {
		self.selecting_node.is_some()
	}

	pub fn is_drawing_edge(&self) -> bool {
		self.drawing_edge
	}

	pub fn pending_swap(&self) -> Option<&Edge> {
		self.swap_queue.as_ref()
	}

	pub fn hidden_edge(&self) -> Option<&EdgeKey> {
		self.hidden_edge.as_ref()
	}

	pub fn gesture(&self) -> &Gesture {
		&self.gesture
	}

	pub fn read_only(&self) -> bool {
		self.read_only
	}

	pub fn set_read_only(&mut self, read_only: bool) {
		self.read_only = read_only;
	}

	/// Source position and live pointer of the edge being drawn.
	pub fn drag_line(&self, model: &GraphModel) -> Option<(Point, Point)> {
		match &self.gesture {
			Gesture::DrawingEdge { source, pointer } => {
				model.node(source).map(|n| (n.position(), *pointer))
			}
			_ => None,
		}
	}

	/// Consume one event. Effects are returned in the order they must be applied.
	pub fn handle(
		&mut self,
		event: &InputEvent,
		model: &GraphModel,
		policy: &dyn GraphPolicy,
	) -> Vec<Effect> {
		match event {
			InputEvent::CanvasClick { at, shift } => self.canvas_clicked(*at, *shift),
			InputEvent::WindowClick { inside_svg } => {
				self.window_clicked(*inside_svg);
				Vec::new()
			}
			InputEvent::NodeMouseDown { key, shift } => {
				self.node_mouse_down(key, *shift);
				Vec::new()
			}
			InputEvent::NodeMouseUp { key } => self.node_mouse_up(key, model),
			InputEvent::NodeMouseEnter { key } => {
				if self.hovered.as_ref() != Some(key) {
					self.hovered = Some(key.clone());
				}
				Vec::new()
			}
			InputEvent::NodeMouseLeave { key, buttons } => {
				// A leave fired while the primary button is down is the
				// tail of a drag release; keep hover so the drop can land.
				let from_release = buttons & 1 == 1;
				if self.hovered.as_ref() == Some(key) && !from_release {
					self.hovered = None;
				}
				Vec::new()
			}
			InputEvent::EdgeMouseDown { edge, at, on_path } => {
				self.edge_mouse_down(edge, *at, *on_path, model)
			}
			InputEvent::DragStart { target, at } => {
				self.drag_started(target, *at, model);
				Vec::new()
			}
			InputEvent::Drag { at, dx, dy } => self.dragged(*at, *dx, *dy),
			InputEvent::DragEnd { over, .. } => self.drag_ended(over.as_ref(), model, policy),
			InputEvent::PressEnd => {
				self.press_ended();
				Vec::new()
			}
			InputEvent::KeyDown { key } => self.key_down(key, model, policy),
			InputEvent::PanStart { .. }
			| InputEvent::Pan { .. }
			| InputEvent::PanEnd
			| InputEvent::Wheel { .. } => Vec::new(),
		}
	}

	fn canvas_clicked(&mut self, at: Point, shift: bool) -> Vec<Effect> {
		self.focused = true;
		if self.selecting_node.take().is_some() {
			return Vec::new();
		}
		let mut effects = vec![Effect::Intent(GraphIntent::SelectNode(None))];
		match (shift, self.read_only) {
			(true, false) => effects.push(Effect::Intent(GraphIntent::CreateNode { x: at.x, y: at.y })),
			(true, true) => effects.push(Effect::Rollback(Fault::ReadOnly)),
			(false, _) => {}
		}
		effects
	}

	fn window_clicked(&mut self, inside_svg: bool) {
		if self.focused && !inside_svg && self.enable_focus {
			debug!("interaction: focus lost");
			self.focused = false;
		}
	}

	fn node_mouse_down(&mut self, key: &NodeKey, shift: bool) {
		self.selecting_node = Some(key.clone());
		self.focused = true;
		self.drawing_edge = shift;
		self.swap_queue = None;
	}

	/// Drop everything a press armed but no drag consumed.
	fn press_ended(&mut self) {
		if self.drawing_edge || self.swap_queue.is_some() {
			debug!("interaction: press ended without a drag");
		}
		self.selecting_node = None;
		self.drawing_edge = false;
		self.swap_queue = None;
		self.hidden_edge = None;
		self.gesture = Gesture::Idle;
	}

	fn node_mouse_up(&mut self, key: &NodeKey, model: &GraphModel) -> Vec<Effect> {
		if self.selecting_node.as_ref() != Some(key) {
			return Vec::new();
		}
		self.selecting_node = None;
		match model.node(key) {
			Some(node) => vec![Effect::Intent(GraphIntent::SelectNode(Some(node.clone())))],
			None => Vec::new(),
		}
	}

	/// Whether `at` is close enough to the edge's target node to count as
	/// grabbing the arrowhead rather than the line.
	pub fn arrow_hit(&self, edge: &Edge, at: Point, model: &GraphModel) -> bool {
		model
			.node(&edge.target)
			.is_some_and(|target| distance(at, target.position()) < self.arrow_hit_radius)
	}

	fn edge_mouse_down(
		&mut self,
		key: &EdgeKey,
		at: Point,
		on_path: bool,
		model: &GraphModel,
	) -> Vec<Effect> {
		let Some(edge) = model.edge(key) else {
			warn!("interaction: pressed unknown edge {}", key);
			return Vec::new();
		};
		self.focused = true;
		if !self.read_only && on_path && self.arrow_hit(edge, at, model) {
			debug!("interaction: queued edge {} for swap", key);
			self.swap_queue = Some(edge.clone());
			self.drawing_edge = true;
			Vec::new()
		} else {
			vec![Effect::Intent(GraphIntent::SelectEdge(edge.clone()))]
		}
	}

	fn drag_started(&mut self, target: &DragTarget, at: Point, model: &GraphModel) {
		match target {
			DragTarget::Node(key) => {
				let Some(node) = model.node(key) else {
					warn!("interaction: drag started on unknown node {}", key);
					return;
				};
				self.gesture = if self.drawing_edge && !self.read_only {
					Gesture::DrawingEdge {
						source: key.clone(),
						pointer: node.position(),
					}
				} else {
					Gesture::DraggingNode {
						key: key.clone(),
						position: node.position(),
					}
				};
			}
			DragTarget::Edge(key) => {
				if self.read_only || !self.drawing_edge {
					return;
				}
				let Some(edge) = model.edge(key) else {
					warn!("interaction: drag started on unknown edge {}", key);
					return;
				};
				self.hidden_edge = Some(key.clone());
				self.gesture = Gesture::DrawingEdge {
					source: edge.source.clone(),
					pointer: at,
				};
			}
		}
		debug!("interaction: gesture {:?}", self.gesture);
	}

	fn dragged(&mut self, at: Point, dx: f64, dy: f64) -> Vec<Effect> {
		match &mut self.gesture {
			Gesture::DraggingNode { key, position } => {
				if self.read_only {
					return Vec::new();
				}
				*position = position.translate(dx, dy);
				vec![Effect::MoveNode {
					key: key.clone(),
					to: *position,
				}]
			}
			Gesture::DrawingEdge { pointer, .. } => {
				*pointer = at;
				Vec::new()
			}
			Gesture::Idle => Vec::new(),
		}
	}

	fn drag_ended(
		&mut self,
		over: Option<&NodeKey>,
		model: &GraphModel,
		policy: &dyn GraphPolicy,
	) -> Vec<Effect> {
		// Leaves during the drag were ignored; the release point decides.
		self.hovered = over.cloned();
		match std::mem::take(&mut self.gesture) {
			Gesture::Idle => Vec::new(),
			Gesture::DraggingNode { key, position } => {
				let mut effects = Vec::new();
				if !self.read_only {
					if let Some(node) = model.node(&key) {
						let mut node = node.clone();
						node.x = position.x;
						node.y = position.y;
						effects.push(Effect::Intent(GraphIntent::UpdateNode(node)));
					}
				}
				// The release of a node drag also completes the press.
				effects.extend(self.node_mouse_up(&key, model));
				effects
			}
			Gesture::DrawingEdge { source, .. } => {
				self.drawing_edge = false;
				self.selecting_node = None;
				let swap = self.swap_queue.take();
				let hidden = self.hidden_edge.take();
				match self.finish_edge(&source, swap, model, policy) {
					Ok(intent) => vec![Effect::Intent(intent)],
					Err(fault) => {
						warn!(
							"interaction: edge gesture cancelled: {} (restoring {:?})",
							fault, hidden
						);
						vec![Effect::Rollback(fault)]
					}
				}
			}
		}
	}

	fn finish_edge(
		&self,
		source: &NodeKey,
		swap: Option<Edge>,
		model: &GraphModel,
		policy: &dyn GraphPolicy,
	) -> Result<GraphIntent, Fault> {
		let target = self
			.hovered
			.as_ref()
			.and_then(|key| model.node(key))
			.ok_or(Fault::NoDropTarget)?;
		let source = model
			.node(source)
			.ok_or_else(|| Fault::UnresolvedEdge(EdgeKey::new(source.clone(), target.key.clone())))?;
		if !policy.can_create_edge(source, target) {
			return Err(Fault::PermissionDenied(Action::CreateEdge));
		}
		match swap {
			Some(old) => {
				if !policy.can_delete_edge(&old) {
					return Err(Fault::PermissionDenied(Action::SwapEdge));
				}
				if old.source == source.key && old.target == target.key {
					return Err(Fault::TrivialSwap(old.key()));
				}
				Ok(GraphIntent::SwapEdge {
					source: source.clone(),
					target: target.clone(),
					old,
				})
			}
			None => Ok(GraphIntent::CreateEdge {
				source: source.clone(),
				target: target.clone(),
			}),
		}
	}

	fn key_down(&mut self, key: &str, model: &GraphModel, policy: &dyn GraphPolicy) -> Vec<Effect> {
		if !self.focused || !matches!(key, "Delete" | "Backspace") {
			return Vec::new();
		}
		if self.read_only {
			return vec![Effect::Rollback(Fault::ReadOnly)];
		}
		let deletion = match model.selected() {
			Some(Selection::Node(_)) => model.selected_node().map(|node| {
				policy
					.can_delete_node(node)
					.then(|| GraphIntent::DeleteNode(node.clone()))
					.ok_or(Fault::PermissionDenied(Action::DeleteNode))
			}),
			Some(Selection::Edge(_)) => model.selected_edge().map(|edge| {
				policy
					.can_delete_edge(edge)
					.then(|| GraphIntent::DeleteEdge(edge.clone()))
					.ok_or(Fault::PermissionDenied(Action::DeleteEdge))
			}),
			None => None,
		};
		match deletion {
			Some(Ok(intent)) => vec![
				Effect::Intent(intent),
				Effect::Intent(GraphIntent::SelectNode(None)),
			],
			Some(Err(fault)) => {
				warn!("interaction: {}", fault);
				Vec::new()
			}
			None => Vec::new(),
		}
	}
}
