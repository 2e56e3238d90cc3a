//! Editor controller: the glue between DOM input, gesture state, the model
//! and the view.
//!
//! [`GraphEditor`] owns every piece of mutable editor state. The component
//! forwards raw pointer samples and DOM events to it; it converts screen
//! positions to world positions with the current transform, runs them
//! through the [`PointerTracker`] and the [`InteractionState`], applies the
//! resulting effects and hands back the intents the host should see.
//!
//! Two ownership modes:
//! - `manage_data = true` (standalone): data intents are applied to the
//!   in-memory model immediately and also reported.
//! - `manage_data = false` (embedded): data intents are only reported; the
//!   host applies them and pushes the new collections back via
//!   [`GraphEditor::set_data`].
//!
//! Selection intents and live drag moves are applied locally in both modes.

use std::collections::HashSet;
use std::rc::Rc;

use log::{debug, info, warn};

use super::config::GraphConfig;
use super::error::Fault;
use super::geometry::Point;
use super::input::{InputEvent, PointerSample, PointerTarget, PointerTracker};
use super::interaction::{Effect, InteractionState};
use super::model::GraphModel;
use super::policy::GraphPolicy;
use super::render::{Scene, build_scene};
use super::theme::GraphTheme;
use super::types::{EdgeKey, GraphData, GraphIntent, NodeKey, Selection};
use super::viewport::Viewport;

pub struct GraphEditor {
	config: GraphConfig,
	theme: GraphTheme,
	model: GraphModel,
	viewport: Viewport,
	interaction: InteractionState,
	tracker: PointerTracker,
	policy: Rc<dyn GraphPolicy>,
	manage_data: bool,
	/// Set whenever something visible changed since the last render.
	dirty: bool,
	/// Unresolved edges already logged; cleared once they resolve or go away.
	reported: HashSet<EdgeKey>,
}

impl GraphEditor {
	pub fn new(
		config: GraphConfig,
		theme: GraphTheme,
		data: GraphData,
		policy: Rc<dyn GraphPolicy>,
		manage_data: bool,
	) -> Self {
		info!(
			"editor: {} nodes, {} edges ({})",
			data.nodes.len(),
			data.edges.len(),
			if manage_data { "standalone" } else { "embedded" }
		);
		Self {
			viewport: Viewport::new(config.min_zoom, config.max_zoom),
			interaction: InteractionState::new(&config),
			model: GraphModel::new(data),
			tracker: PointerTracker::default(),
			config,
			theme,
			policy,
			manage_data,
			dirty: true,
			reported: HashSet::new(),
		}
	}

	pub fn config(&self) -> &GraphConfig {
		&self.config
	}

	pub fn theme(&self) -> &GraphTheme {
		&self.theme
	}

	pub fn model(&self) -> &GraphModel {
		&self.model
	}

	pub fn viewport(&self) -> &Viewport {
		&self.viewport
	}

	pub fn interaction(&self) -> &InteractionState {
		&self.interaction
	}

	pub fn zoom_level(&self) -> f64 {
		self.viewport.transform().k
	}

	fn sample(&self, screen: Point, shift: bool) -> PointerSample {
		PointerSample {
			screen,
			world: self.viewport.screen_to_world(screen),
			shift,
		}
	}

	pub fn pointer_down(&mut self, target: PointerTarget, screen: Point, shift: bool) -> Vec<GraphIntent> {
		let sample = self.sample(screen, shift);
		let events = self.tracker.down(target, sample);
		self.dispatch_all(events)
	}

	pub fn pointer_move(&mut self, screen: Point, shift: bool) -> Vec<GraphIntent> {
		let sample = self.sample(screen, shift);
		let events = self.tracker.moved(sample);
		self.dispatch_all(events)
	}

	pub fn pointer_up(&mut self, under: PointerTarget, screen: Point, shift: bool) -> Vec<GraphIntent> {
		let sample = self.sample(screen, shift);
		let events = self.tracker.up(under, sample);
		self.dispatch_all(events)
	}

	/// The pointer left the view mid-gesture.
	pub fn pointer_cancel(&mut self) -> Vec<GraphIntent> {
		let events = self.tracker.cancel();
		self.dispatch_all(events)
	}

	pub fn node_enter(&mut self, key: NodeKey) -> Vec<GraphIntent> {
		self.dispatch(InputEvent::NodeMouseEnter { key })
	}

	pub fn node_leave(&mut self, key: NodeKey, buttons: u16) -> Vec<GraphIntent> {
		self.dispatch(InputEvent::NodeMouseLeave { key, buttons })
	}

	pub fn key_down(&mut self, key: &str) -> Vec<GraphIntent> {
		self.dispatch(InputEvent::KeyDown { key: key.to_string() })
	}

	pub fn window_click(&mut self, inside_svg: bool) -> Vec<GraphIntent> {
		self.dispatch(InputEvent::WindowClick { inside_svg })
	}

	pub fn wheel(&mut self, screen: Point, delta_y: f64) -> Vec<GraphIntent> {
		self.dispatch(InputEvent::Wheel { screen, delta_y })
	}

	fn dispatch_all(&mut self, events: Vec<InputEvent>) -> Vec<GraphIntent> {
		events.into_iter().flat_map(|e| self.dispatch(e)).collect()
	}

	/// Feed one event through the state machine and apply its effects.
	pub fn dispatch(&mut self, event: InputEvent) -> Vec<GraphIntent> {
		match event {
			InputEvent::PanStart { screen } => {
				if self.interaction.focused() {
					self.viewport.begin_pan(screen);
				}
				Vec::new()
			}
			InputEvent::Pan { screen } => {
				if self.viewport.pan.active {
					self.viewport.pan_to(screen);
					self.dirty = true;
				}
				Vec::new()
			}
			InputEvent::PanEnd => {
				self.viewport.end_pan();
				Vec::new()
			}
			InputEvent::Wheel { screen, delta_y } => {
				if self.interaction.focused() {
					self.viewport.wheel(screen, delta_y);
					self.dirty = true;
				}
				Vec::new()
			}
			event => {
				let effects = self
					.interaction
					.handle(&event, &self.model, self.policy.as_ref());
				// Hover, focus and gesture state all show up in the scene.
				self.dirty = true;
				self.apply_effects(effects)
			}
		}
	}

	fn apply_effects(&mut self, effects: Vec<Effect>) -> Vec<GraphIntent> {
		let mut intents = Vec::new();
		for effect in effects {
			match effect {
				Effect::MoveNode { key, to } => {
					self.model.move_node(&key, to);
				}
				Effect::Rollback(fault) => {
					debug!("editor: rolled back gesture ({})", fault);
				}
				Effect::Intent(intent) => {
					let is_selection = matches!(
						intent,
						GraphIntent::SelectNode(_) | GraphIntent::SelectEdge(_)
					);
					if self.manage_data || is_selection {
						self.model.apply(&intent, &self.config.empty_type);
					}
					intents.push(intent);
				}
			}
		}
		intents
	}

	/// Replace the collections, e.g. after the host applied an intent.
	pub fn set_data(&mut self, data: GraphData) {
		self.model.replace(data);
		self.dirty = true;
	}

	pub fn set_selected(&mut self, selection: Option<Selection>) {
		self.model.set_selected(selection);
		self.dirty = true;
	}

	pub fn set_read_only(&mut self, read_only: bool) {
		self.interaction.set_read_only(read_only);
		self.dirty = true;
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.viewport.resize(width, height);
		self.dirty = true;
	}

	/// Animate the view so every node fits.
	pub fn zoom_to_fit(&mut self) {
		let bounds = self.model.bounds(self.config.node_size);
		self.viewport.zoom_to_fit(bounds, self.config.zoom_duration_ms);
		self.dirty = true;
	}

	pub fn set_zoom(&mut self, k: f64, x: f64, y: f64, duration_ms: f64) {
		self.viewport.set_zoom(k, x, y, duration_ms);
		self.dirty = true;
	}

	/// Change zoom by `delta` about the view centre.
	pub fn modify_zoom(&mut self, delta: f64) {
		self.viewport.modify_zoom(delta, 0.0);
		self.dirty = true;
	}

	/// Compute the next frame. Edges with a missing endpoint are skipped and
	/// logged once until they resolve.
	pub fn scene(&mut self) -> Scene {
		let scene = build_scene(
			&self.model,
			&self.interaction,
			self.viewport.transform(),
			&self.config,
			&self.theme,
		);
		self.reported.retain(|key| scene.unresolved.contains(key));
		for key in &scene.unresolved {
			if self.reported.insert(key.clone()) {
				warn!("editor: {}", Fault::UnresolvedEdge(key.clone()));
			}
		}
		scene
	}

	/// Edges currently skipped for a missing endpoint.
	pub fn unresolved_edges(&self) -> &HashSet<EdgeKey> {
		&self.reported
	}

	/// Advance view animation. Returns true when a render is due.
	pub fn tick(&mut self, now_ms: f64) -> bool {
		let animating = self.viewport.tick(now_ms);
		let due = self.dirty || animating;
		self.dirty = animating;
		due
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::super::policy::{Permissive, Predicates};
	use super::super::types::{Edge, EdgeKey, Node};
	use super::*;

	fn data() -> GraphData {
		GraphData {
			nodes: vec![
				Node::new(1, "A", 0.0, 0.0, "empty"),
				Node::new(2, "B", 400.0, 0.0, "empty"),
				Node::new(3, "C", 0.0, 400.0, "empty"),
			],
			edges: vec![Edge::new(1, 2, "")],
		}
	}

	fn editor(manage_data: bool) -> GraphEditor {
		editor_with(manage_data, Rc::new(Permissive))
	}

	fn editor_with(manage_data: bool, policy: Rc<dyn GraphPolicy>) -> GraphEditor {
		let mut editor = GraphEditor::new(
			GraphConfig::default(),
			GraphTheme::default(),
			data(),
			policy,
			manage_data,
		);
		editor.resize(800.0, 600.0);
		editor
	}

	fn node(key: u64) -> PointerTarget {
		PointerTarget::Node(NodeKey::from(key))
	}

	fn click(editor: &mut GraphEditor, target: PointerTarget, at: Point, shift: bool) -> Vec<GraphIntent> {
		let mut intents = editor.pointer_down(target.clone(), at, shift);
		intents.extend(editor.pointer_up(target, at, shift));
		intents
	}

	#[test]
	fn shift_click_creates_node_in_standalone_mode() {
		let mut editor = editor(true);
		let intents = click(&mut editor, PointerTarget::Background, Point::new(50.0, 60.0), true);
		assert_eq!(
			intents,
			vec![
				GraphIntent::SelectNode(None),
				GraphIntent::CreateNode { x: 50.0, y: 60.0 }
			]
		);
		let created = editor.model().node(&NodeKey::from(4)).unwrap();
		assert_eq!(created.title, "New Node");
		assert_eq!(created.position(), Point::new(50.0, 60.0));
	}

	#[test]
	fn embedded_mode_reports_without_mutating() {
		let mut editor = editor(false);
		click(&mut editor, PointerTarget::Background, Point::new(50.0, 60.0), true);
		assert_eq!(editor.model().nodes().len(), 3);

		let intents = click(&mut editor, node(2), Point::new(400.0, 0.0), false);
		assert_eq!(
			intents,
			vec![GraphIntent::SelectNode(Some(Node::new(2, "B", 400.0, 0.0, "empty")))]
		);
		assert_eq!(editor.model().selected(), Some(&Selection::Node(NodeKey::from(2))));
	}

	#[test]
	fn click_positions_map_through_view_transform() {
		let mut editor = editor(true);
		editor.set_zoom(0.5, 100.0, 50.0, 0.0);
		let intents = click(&mut editor, PointerTarget::Background, Point::new(200.0, 150.0), true);
		assert_eq!(intents[1], GraphIntent::CreateNode { x: 200.0, y: 200.0 });
	}

	#[test]
	fn dragging_node_moves_it_live_and_reports_once() {
		let mut editor = editor(false);
		let mut intents = editor.pointer_down(node(3), Point::new(0.0, 400.0), false);
		intents.extend(editor.pointer_move(Point::new(30.0, 420.0), false));
		assert_eq!(
			editor.model().node(&NodeKey::from(3)).unwrap().position(),
			Point::new(30.0, 420.0)
		);
		intents.extend(editor.pointer_up(node(3), Point::new(30.0, 420.0), false));

		let moved = Node::new(3, "C", 30.0, 420.0, "empty");
		assert_eq!(
			intents,
			vec![
				GraphIntent::UpdateNode(moved.clone()),
				GraphIntent::SelectNode(Some(moved)),
			]
		);
	}

	#[test]
	fn shift_drag_to_hovered_node_creates_edge() {
		let mut editor = editor(true);
		editor.node_enter(NodeKey::from(1));
		editor.pointer_down(node(1), Point::new(0.0, 0.0), true);
		editor.pointer_move(Point::new(0.0, 200.0), true);
		editor.node_leave(NodeKey::from(1), 1);
		assert!(editor.scene().drag_line.is_some());

		editor.node_enter(NodeKey::from(3));
		let intents = editor.pointer_up(node(3), Point::new(0.0, 400.0), true);
		assert!(matches!(&intents[..], [GraphIntent::CreateEdge { .. }]));
		assert!(editor.model().contains_edge(&EdgeKey::new(1, 3)));
		assert!(editor.scene().drag_line.is_none());
	}

	#[test]
	fn edge_released_on_canvas_after_leaving_source_creates_nothing() {
		let mut editor = editor(true);
		editor.node_enter(NodeKey::from(1));
		editor.pointer_down(node(1), Point::new(0.0, 0.0), true);
		editor.pointer_move(Point::new(0.0, 200.0), true);
		editor.node_leave(NodeKey::from(1), 1);
		let intents = editor.pointer_up(PointerTarget::Background, Point::new(0.0, 200.0), true);
		assert!(intents.is_empty());
		assert_eq!(editor.model().edges(), &[Edge::new(1, 2, "")]);
		assert_eq!(editor.interaction().hovered(), None);
	}

	#[test]
	fn shift_click_then_plain_drag_moves_node() {
		let mut editor = editor(true);
		click(&mut editor, node(1), Point::new(0.0, 0.0), true);
		editor.pointer_down(node(3), Point::new(0.0, 400.0), false);
		editor.pointer_move(Point::new(100.0, 400.0), false);
		editor.pointer_up(node(3), Point::new(100.0, 400.0), false);
		assert_eq!(
			editor.model().node(&NodeKey::from(3)).unwrap().position(),
			Point::new(100.0, 400.0)
		);
		assert_eq!(editor.model().edges(), &[Edge::new(1, 2, "")]);
	}

	#[test]
	fn arrow_click_then_shift_drag_creates_instead_of_swapping() {
		let mut editor = editor(true);
		click(
			&mut editor,
			PointerTarget::EdgePath(EdgeKey::new(1, 2)),
			Point::new(320.0, 0.0),
			false,
		);
		assert_eq!(editor.interaction().pending_swap(), None);

		editor.pointer_down(node(2), Point::new(400.0, 0.0), true);
		editor.pointer_move(Point::new(200.0, 200.0), true);
		editor.node_enter(NodeKey::from(3));
		let intents = editor.pointer_up(node(3), Point::new(0.0, 400.0), true);
		assert!(matches!(&intents[..], [GraphIntent::CreateEdge { .. }]));
		assert_eq!(
			editor.model().edges(),
			&[Edge::new(1, 2, ""), Edge::new(2, 3, "")]
		);
	}

	#[test]
	fn cancelled_edge_drag_restores_view() {
		let mut editor = editor(true);
		let edge = EdgeKey::new(1, 2);
		editor.pointer_down(PointerTarget::EdgePath(edge.clone()), Point::new(320.0, 0.0), false);
		editor.pointer_move(Point::new(200.0, 200.0), false);
		editor.node_enter(NodeKey::from(3));
		assert!(editor.pointer_cancel().is_empty());

		let scene = editor.scene();
		assert!(scene.drag_line.is_none());
		assert!(scene.edges.iter().all(|e| !e.hidden));
		assert_eq!(editor.model().edges(), &[Edge::new(1, 2, "")]);
	}

	#[test]
	fn read_only_switch_blocks_edits() {
		let mut editor = editor(true);
		editor.set_read_only(true);
		let intents = click(&mut editor, PointerTarget::Background, Point::new(50.0, 60.0), true);
		assert_eq!(intents, vec![GraphIntent::SelectNode(None)]);
		assert_eq!(editor.model().nodes().len(), 3);

		editor.set_read_only(false);
		click(&mut editor, PointerTarget::Background, Point::new(50.0, 60.0), true);
		assert_eq!(editor.model().nodes().len(), 4);
	}

	#[test]
	fn unresolved_edges_are_tracked_until_fixed() {
		let mut editor = editor(false);
		let mut broken = data();
		broken.edges.push(Edge::new(3, 9, ""));
		editor.set_data(broken);
		editor.scene();
		editor.scene();
		assert_eq!(
			editor.unresolved_edges().iter().collect::<Vec<_>>(),
			vec![&EdgeKey::new(3, 9)]
		);

		editor.set_data(data());
		editor.scene();
		assert!(editor.unresolved_edges().is_empty());
	}

	#[test]
	fn denied_edge_leaves_collection_unchanged() {
		let policy = Predicates::new().with_can_create_edge(|_, _| false);
		let mut editor = editor_with(true, Rc::new(policy));
		editor.pointer_down(node(1), Point::new(0.0, 0.0), true);
		editor.pointer_move(Point::new(0.0, 200.0), true);
		editor.node_enter(NodeKey::from(3));
		let intents = editor.pointer_up(node(3), Point::new(0.0, 400.0), true);
		assert!(intents.is_empty());
		assert_eq!(editor.model().edges(), &[Edge::new(1, 2, "")]);
	}

	#[test]
	fn arrow_drag_swaps_endpoint() {
		let mut editor = editor(true);
		let edge = EdgeKey::new(1, 2);
		editor.pointer_down(PointerTarget::EdgePath(edge.clone()), Point::new(320.0, 0.0), false);
		editor.pointer_move(Point::new(200.0, 200.0), false);
		let hidden = editor.scene();
		assert!(hidden.edges.iter().any(|e| e.key == edge && e.hidden));

		editor.node_enter(NodeKey::from(3));
		editor.pointer_up(node(3), Point::new(0.0, 400.0), false);
		assert_eq!(editor.model().edges(), &[Edge::new(1, 3, "")]);
	}

	#[test]
	fn failed_swap_restores_hidden_edge() {
		let mut editor = editor(true);
		let edge = EdgeKey::new(1, 2);
		editor.pointer_down(PointerTarget::EdgePath(edge.clone()), Point::new(320.0, 0.0), false);
		editor.pointer_move(Point::new(600.0, 300.0), false);
		let intents = editor.pointer_up(PointerTarget::Background, Point::new(600.0, 300.0), false);
		assert!(intents.is_empty());
		let scene = editor.scene();
		assert!(scene.edges.iter().all(|e| !e.hidden));
		assert_eq!(editor.model().edges(), &[Edge::new(1, 2, "")]);
	}

	#[test]
	fn delete_key_removes_selection_and_clears_it() {
		let mut editor = editor(true);
		click(&mut editor, node(1), Point::new(0.0, 0.0), false);
		let intents = editor.key_down("Delete");
		assert_eq!(intents.len(), 2);
		assert_eq!(editor.model().nodes().len(), 2);
		assert!(editor.model().edges().is_empty());
		assert_eq!(editor.model().selected(), None);
	}

	#[test]
	fn pan_and_wheel_are_gated_on_focus() {
		let mut config = GraphConfig::default();
		config.enable_focus = true;
		let mut editor = GraphEditor::new(config, GraphTheme::default(), data(), Rc::new(Permissive), true);
		editor.resize(800.0, 600.0);

		editor.pointer_down(PointerTarget::Background, Point::new(10.0, 10.0), false);
		editor.pointer_move(Point::new(60.0, 30.0), false);
		editor.pointer_up(PointerTarget::Background, Point::new(60.0, 30.0), false);
		assert_eq!(editor.viewport().transform().x, 50.0);
		assert_eq!(editor.viewport().transform().y, 20.0);

		editor.window_click(false);
		editor.wheel(Point::new(0.0, 0.0), -1.0);
		assert_eq!(editor.zoom_level(), 1.0);

		editor.pointer_down(PointerTarget::Background, Point::new(10.0, 10.0), false);
		editor.pointer_move(Point::new(60.0, 30.0), false);
		assert_eq!(editor.viewport().transform().x, 50.0);
	}

	#[test]
	fn wheel_zoom_is_clamped() {
		let mut editor = editor(true);
		for _ in 0..50 {
			editor.wheel(Point::new(400.0, 300.0), -1.0);
		}
		assert_eq!(editor.zoom_level(), 1.5);
		for _ in 0..100 {
			editor.wheel(Point::new(400.0, 300.0), 1.0);
		}
		assert_eq!(editor.zoom_level(), 0.15);
	}

	#[test]
	fn zoom_to_fit_animates_to_target() {
		let mut editor = editor(true);
		editor.zoom_to_fit();
		assert!(editor.tick(0.0));
		assert!(editor.tick(375.0));
		editor.tick(750.0);
		let expected = editor.viewport().fit_transform(editor.model().bounds(150.0));
		assert_eq!(editor.viewport().transform(), expected);
		assert!(!editor.tick(800.0));
	}

	#[test]
	fn host_data_replaces_model_and_keeps_valid_selection() {
		let mut editor = editor(false);
		click(&mut editor, node(1), Point::new(0.0, 0.0), false);
		let mut next = data();
		next.nodes.push(Node::new(7, "G", 0.0, 0.0, "empty"));
		editor.set_data(next);
		assert_eq!(editor.model().nodes().len(), 4);
		assert_eq!(editor.model().selected(), Some(&Selection::Node(NodeKey::from(1))));
	}
}
