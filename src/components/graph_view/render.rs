//! Scene computation and keyed reconciliation.
//!
//! A render pass happens in two steps:
//! 1. [`build_scene`] reads the model, interaction and view state and
//!    computes every attribute the view needs (transforms, path data,
//!    truncated titles, styles). This is pure, so identical inputs always
//!    produce an identical [`Scene`].
//! 2. [`Renderer::render`] diffs the scene against what is already drawn on
//!    a [`Surface`]: new keys are created and faded in, retained keys are
//!    updated in place, missing keys fade out and are removed.
//!
//! Edges are drawn below nodes; the surface keeps them in separate layers.

use std::collections::HashMap;
use std::hash::Hash;

use log::debug;

use super::config::GraphConfig;
use super::geometry::{Point, midpoint, theta};
use super::interaction::InteractionState;
use super::model::GraphModel;
use super::theme::GraphTheme;
use super::types::{EdgeKey, NodeKey, Selection};
use super::viewport::ViewTransform;

/// Title drawn for a node: cut to `max_chars` characters plus `...`.
pub fn truncate_title(title: &str, max_chars: usize) -> String {
	if title.chars().count() > max_chars {
		let mut cut: String = title.chars().take(max_chars).collect();
		cut.push_str("...");
		cut
	} else {
		title.to_string()
	}
}

pub fn node_transform(p: Point) -> String {
	format!("translate({},{})", p.x, p.y)
}

/// Straight-line SVG path data.
pub fn path_description(from: Point, to: Point) -> String {
	format!("M{},{}L{},{}", from.x, from.y, to.x, to.y)
}

/// Where a line between two node centres meets each node's boundary.
pub fn edge_endpoints(source: Point, target: Point, radius: f64) -> (Point, Point) {
	let angle = theta(source, target);
	let (dx, dy) = (radius * angle.cos(), radius * angle.sin());
	(source.translate(dx, dy), target.translate(-dx, -dy))
}

/// Places a `size`-square handle glyph centred on `mid`, rotated to `angle` radians.
pub fn edge_handle_transform(mid: Point, angle: f64, size: f64) -> String {
	format!(
		"translate({}, {}) rotate({}) translate({}, {})",
		mid.x,
		mid.y,
		angle.to_degrees(),
		-size / 2.0,
		-size / 2.0
	)
}

/// Vertical title offset. Empty-type titles sit over the shape; other
/// types leave room for an icon and drop the title below it.
pub fn text_dy(node_type: &str, empty_type: &str) -> f64 {
	if node_type == empty_type { -9.0 } else { 18.0 }
}

#[derive(Clone, Debug, PartialEq)]
pub struct NodeView {
	pub key: NodeKey,
	pub transform: String,
	pub shape: String,
	pub subtype_shape: Option<String>,
	pub title: String,
	pub text_dy: f64,
	pub selected: bool,
	pub hovered: bool,
	pub shape_style: String,
	pub text_style: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EdgeView {
	pub key: EdgeKey,
	pub path: String,
	pub handle_shape: String,
	pub handle_transform: String,
	pub selected: bool,
	/// Hidden while its arrowhead is being dragged to a new target.
	pub hidden: bool,
	pub style: String,
}

/// Everything one render pass draws.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
	pub view_transform: String,
	pub nodes: Vec<NodeView>,
	pub edges: Vec<EdgeView>,
	/// Path data of the transient edge being drawn, in world coordinates.
	pub drag_line: Option<String>,
	/// Edges left out because an endpoint is missing from the model.
	pub unresolved: Vec<EdgeKey>,
}

pub fn build_scene(
	model: &GraphModel,
	interaction: &InteractionState,
	transform: ViewTransform,
	config: &GraphConfig,
	theme: &GraphTheme,
) -> Scene {
	let selected = model.selected();

	let nodes = model
		.nodes()
		.iter()
		.map(|node| {
			let is_selected = matches!(selected, Some(Selection::Node(k)) if *k == node.key);
			NodeView {
				key: node.key.clone(),
				transform: node_transform(node.position()),
				shape: config.node_shape(&node.node_type).to_string(),
				subtype_shape: config.subtype_shape(node.subtype.as_deref()).map(str::to_string),
				title: truncate_title(&node.title, config.max_title_chars),
				text_dy: text_dy(&node.node_type, &config.empty_type),
				selected: is_selected,
				hovered: interaction.hovered() == Some(&node.key),
				shape_style: theme.node_css(is_selected),
				text_style: theme.text_css(is_selected),
			}
		})
		.collect();

	let mut unresolved = Vec::new();
	let edges = model
		.edges()
		.iter()
		.filter_map(|edge| {
			let key = edge.key();
			let (Some(source), Some(target)) = (model.node(&edge.source), model.node(&edge.target))
			else {
				unresolved.push(key);
				return None;
			};
			let (from, to) = edge_endpoints(source.position(), target.position(), config.node_radius());
			let is_selected = matches!(selected, Some(Selection::Edge(k)) if *k == key);
			Some(EdgeView {
				path: path_description(from, to),
				handle_shape: config.edge_shape(&edge.edge_type).to_string(),
				handle_transform: edge_handle_transform(
					midpoint(from, to),
					theta(from, to),
					config.edge_handle_size,
				),
				selected: is_selected,
				hidden: interaction.hidden_edge() == Some(&key),
				style: theme.edge_css(is_selected),
				key,
			})
		})
		.collect();

	Scene {
		view_transform: transform.to_svg(),
		nodes,
		edges,
		drag_line: interaction
			.drag_line(model)
			.map(|(from, to)| path_description(from, to)),
		unresolved,
	}
}

/// Lifecycle of a drawn shape.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Phase {
	Entering { since: f64 },
	Present,
	Exiting { since: f64 },
}

#[derive(Debug)]
struct Entry<H> {
	handle: H,
	phase: Phase,
}

/// Keys sorted by what a diff did with them.
#[derive(Clone, Debug, PartialEq)]
pub struct Diff<K> {
	/// Not drawn yet; the caller creates and inserts them.
	pub entered: Vec<K>,
	pub updated: Vec<K>,
	/// Started fading out in this diff.
	pub exited: Vec<K>,
}

/// Result of advancing fades.
#[derive(Debug)]
pub struct Fades<K, H> {
	pub opacity: Vec<(K, f64)>,
	/// Fully faded out; the caller detaches them.
	pub removed: Vec<H>,
}

fn fade_progress(since: f64, now: f64, fade_ms: f64) -> f64 {
	if fade_ms <= 0.0 {
		1.0
	} else {
		((now - since) / fade_ms).clamp(0.0, 1.0)
	}
}

/// Index from data identity to drawn handle, with time-based fades.
#[derive(Debug)]
pub struct Reconciler<K, H> {
	entries: HashMap<K, Entry<H>>,
	fade_ms: f64,
}

impl<K: Clone + Eq + Hash, H> Reconciler<K, H> {
	pub fn new(fade_ms: f64) -> Self {
		Self {
			entries: HashMap::new(),
			fade_ms,
		}
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn get(&self, key: &K) -> Option<&H> {
		self.entries.get(key).map(|e| &e.handle)
	}

	pub fn phase(&self, key: &K) -> Option<Phase> {
		self.entries.get(key).map(|e| e.phase)
	}

	/// Compare `keys` with the drawn set. Drawn keys that are missing start
	/// exiting; exiting keys that came back are revived in place.
	pub fn diff<'a>(&mut self, keys: impl IntoIterator<Item = &'a K>, now: f64) -> Diff<K>
	where
		K: 'a,
	{
		let mut diff = Diff {
			entered: Vec::new(),
			updated: Vec::new(),
			exited: Vec::new(),
		};
		let mut live = std::collections::HashSet::new();
		for key in keys {
			live.insert(key);
			match self.entries.get_mut(key) {
				Some(entry) => {
					if matches!(entry.phase, Phase::Exiting { .. }) {
						entry.phase = Phase::Entering { since: now };
					}
					diff.updated.push(key.clone());
				}
				None => diff.entered.push(key.clone()),
			}
		}
		for (key, entry) in self.entries.iter_mut() {
			if !live.contains(key) && !matches!(entry.phase, Phase::Exiting { .. }) {
				entry.phase = Phase::Exiting { since: now };
				diff.exited.push(key.clone());
			}
		}
		diff
	}

	pub fn insert(&mut self, key: K, handle: H, now: f64) {
		self.entries.insert(
			key,
			Entry {
				handle,
				phase: Phase::Entering { since: now },
			},
		);
	}

	/// Opacity of a shape at `now`, or `None` if the key is not drawn.
	pub fn opacity(&self, key: &K, now: f64) -> Option<f64> {
		self.entries.get(key).map(|e| match e.phase {
			Phase::Entering { since } => fade_progress(since, now, self.fade_ms),
			Phase::Present => 1.0,
			Phase::Exiting { since } => 1.0 - fade_progress(since, now, self.fade_ms),
		})
	}

	pub fn is_animating(&self) -> bool {
		self.entries
			.values()
			.any(|e| !matches!(e.phase, Phase::Present))
	}

	/// Advance every fade to `now`. Finished entries become present;
	/// finished exits are dropped from the index and handed back.
	pub fn tick(&mut self, now: f64) -> Fades<K, H> {
		let mut opacity = Vec::new();
		let mut done = Vec::new();
		for (key, entry) in self.entries.iter_mut() {
			match entry.phase {
				Phase::Present => {}
				Phase::Entering { since } => {
					let t = fade_progress(since, now, self.fade_ms);
					if t >= 1.0 {
						entry.phase = Phase::Present;
					}
					opacity.push((key.clone(), t));
				}
				Phase::Exiting { since } => {
					let t = fade_progress(since, now, self.fade_ms);
					if t >= 1.0 {
						done.push(key.clone());
					} else {
						opacity.push((key.clone(), 1.0 - t));
					}
				}
			}
		}
		let removed = done
			.iter()
			.filter_map(|key| self.entries.remove(key))
			.map(|e| e.handle)
			.collect();
		Fades { opacity, removed }
	}
}

/// Drawing backend the renderer reconciles against.
pub trait Surface {
	type Handle;
	type Error: std::fmt::Debug;

	fn set_view_transform(&mut self, transform: &str) -> Result<(), Self::Error>;
	fn create_node(&mut self, view: &NodeView) -> Result<Self::Handle, Self::Error>;
	fn update_node(&mut self, handle: &Self::Handle, view: &NodeView) -> Result<(), Self::Error>;
	fn create_edge(&mut self, view: &EdgeView) -> Result<Self::Handle, Self::Error>;
	fn update_edge(&mut self, handle: &Self::Handle, view: &EdgeView) -> Result<(), Self::Error>;
	fn set_opacity(&mut self, handle: &Self::Handle, opacity: f64) -> Result<(), Self::Error>;
	fn remove(&mut self, handle: Self::Handle);
	fn set_drag_line(&mut self, path: Option<&str>) -> Result<(), Self::Error>;
}

/// What a render pass changed.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderStats {
	pub nodes: Diff<NodeKey>,
	pub edges: Diff<EdgeKey>,
}

pub struct Renderer<S: Surface> {
	surface: S,
	nodes: Reconciler<NodeKey, S::Handle>,
	edges: Reconciler<EdgeKey, S::Handle>,
}

impl<S: Surface> Renderer<S> {
	pub fn new(surface: S, fade_ms: f64) -> Self {
		Self {
			surface,
			nodes: Reconciler::new(fade_ms),
			edges: Reconciler::new(fade_ms),
		}
	}

	pub fn surface(&self) -> &S {
		&self.surface
	}

	pub fn node_opacity(&self, key: &NodeKey, now: f64) -> Option<f64> {
		self.nodes.opacity(key, now)
	}

	pub fn edge_opacity(&self, key: &EdgeKey, now: f64) -> Option<f64> {
		self.edges.opacity(key, now)
	}

	pub fn render(&mut self, scene: &Scene, now: f64) -> Result<RenderStats, S::Error> {
		self.surface.set_view_transform(&scene.view_transform)?;

		let edges = self.edges.diff(scene.edges.iter().map(|e| &e.key), now);
		for view in &scene.edges {
			match self.edges.get(&view.key) {
				Some(handle) => self.surface.update_edge(handle, view)?,
				None => {
					let handle = self.surface.create_edge(view)?;
					self.surface.update_edge(&handle, view)?;
					self.surface.set_opacity(&handle, 0.0)?;
					self.edges.insert(view.key.clone(), handle, now);
				}
			}
		}

		let nodes = self.nodes.diff(scene.nodes.iter().map(|n| &n.key), now);
		for view in &scene.nodes {
			match self.nodes.get(&view.key) {
				Some(handle) => self.surface.update_node(handle, view)?,
				None => {
					let handle = self.surface.create_node(view)?;
					self.surface.update_node(&handle, view)?;
					self.surface.set_opacity(&handle, 0.0)?;
					self.nodes.insert(view.key.clone(), handle, now);
				}
			}
		}

		self.surface.set_drag_line(scene.drag_line.as_deref())?;

		if !(nodes.entered.is_empty() && nodes.exited.is_empty())
			|| !(edges.entered.is_empty() && edges.exited.is_empty())
		{
			debug!(
				"render: nodes +{} -{}, edges +{} -{}",
				nodes.entered.len(),
				nodes.exited.len(),
				edges.entered.len(),
				edges.exited.len()
			);
		}

		self.tick(now)?;
		Ok(RenderStats { nodes, edges })
	}

	/// Advance fades. Returns true while any shape is still fading.
	pub fn tick(&mut self, now: f64) -> Result<bool, S::Error> {
		let node_fades = self.nodes.tick(now);
		let edge_fades = self.edges.tick(now);

		for (key, opacity) in &node_fades.opacity {
			if let Some(handle) = self.nodes.get(key) {
				self.surface.set_opacity(handle, *opacity)?;
			}
		}
		for (key, opacity) in &edge_fades.opacity {
			if let Some(handle) = self.edges.get(key) {
				self.surface.set_opacity(handle, *opacity)?;
			}
		}
		for handle in node_fades.removed.into_iter().chain(edge_fades.removed) {
			self.surface.remove(handle);
		}
		Ok(self.nodes.is_animating() || self.edges.is_animating())
	}
}

#[cfg(test)]
mod tests {
	use std::convert::Infallible;

	use pretty_assertions::assert_eq;

	use super::*;
	use super::super::types::{Edge, GraphData, Node};

	fn model() -> GraphModel {
		GraphModel::new(GraphData {
			nodes: vec![
				Node::new(1, "A long node title", 0.0, 0.0, "empty"),
				Node::new(2, "B", 300.0, 0.0, "special").with_subtype("specialChild"),
				Node::new(3, "C", -200.0, 0.0, "mystery"),
			],
			edges: vec![Edge::new(1, 2, "specialEdge"), Edge::new(2, 9, "")],
		})
	}

	fn scene(model: &GraphModel) -> Scene {
		let config = GraphConfig::default();
		build_scene(
			model,
			&InteractionState::new(&config),
			ViewTransform::IDENTITY,
			&config,
			&GraphTheme::default(),
		)
	}

	/// Records every call as a line of text; handles are sequence numbers.
	#[derive(Default)]
	struct Recording {
		ops: Vec<String>,
		next: usize,
	}

	impl Surface for Recording {
		type Handle = usize;
		type Error = Infallible;

		fn set_view_transform(&mut self, _: &str) -> Result<(), Infallible> {
			Ok(())
		}

		fn create_node(&mut self, view: &NodeView) -> Result<usize, Infallible> {
			self.next += 1;
			self.ops.push(format!("create node {}", view.key));
			Ok(self.next)
		}

		fn update_node(&mut self, handle: &usize, _: &NodeView) -> Result<(), Infallible> {
			self.ops.push(format!("update {}", handle));
			Ok(())
		}

		fn create_edge(&mut self, view: &EdgeView) -> Result<usize, Infallible> {
			self.next += 1;
			self.ops.push(format!("create edge {}", view.key));
			Ok(self.next)
		}

		fn update_edge(&mut self, handle: &usize, _: &EdgeView) -> Result<(), Infallible> {
			self.ops.push(format!("update {}", handle));
			Ok(())
		}

		fn set_opacity(&mut self, _: &usize, _: f64) -> Result<(), Infallible> {
			Ok(())
		}

		fn remove(&mut self, handle: usize) {
			self.ops.push(format!("remove {}", handle));
		}

		fn set_drag_line(&mut self, _: Option<&str>) -> Result<(), Infallible> {
			Ok(())
		}
	}

	fn creations(surface: &Recording) -> usize {
		surface.ops.iter().filter(|op| op.starts_with("create")).count()
	}

	#[test]
	fn titles_are_truncated_with_ellipsis() {
		assert_eq!(truncate_title("A long node title", 9), "A long no...");
		assert_eq!(truncate_title("Exactly 9", 9), "Exactly 9");
		assert_eq!(truncate_title("", 9), "");
		assert_eq!(truncate_title("ééééééééééé", 9), "ééééééééé...");
	}

	#[test]
	fn edge_meets_node_boundary() {
		let (from, to) = edge_endpoints(Point::new(0.0, 0.0), Point::new(300.0, 400.0), 75.0);
		assert!((from.x - 45.0).abs() < 1e-9 && (from.y - 60.0).abs() < 1e-9);
		assert!((to.x - 255.0).abs() < 1e-9 && (to.y - 340.0).abs() < 1e-9);
		assert_eq!(
			path_description(Point::new(1.0, 2.0), Point::new(3.5, 4.0)),
			"M1,2L3.5,4"
		);
	}

	#[test]
	fn handle_sits_on_midpoint_rotated_to_edge() {
		assert_eq!(
			edge_handle_transform(Point::new(10.0, 20.0), std::f64::consts::PI, 50.0),
			"translate(10, 20) rotate(180) translate(-25, -25)"
		);
	}

	#[test]
	fn scene_reflects_types_and_skips_unresolved_edges() {
		let scene = scene(&model());
		assert_eq!(scene.view_transform, "translate(0,0) scale(1)");
		assert_eq!(scene.nodes.len(), 3);

		let [a, b, c] = &scene.nodes[..] else {
			panic!("expected three nodes");
		};
		assert_eq!(a.title, "A long no...");
		assert_eq!(a.text_dy, -9.0);
		assert_eq!(b.transform, "translate(300,0)");
		assert_eq!(b.shape, "#special");
		assert_eq!(b.subtype_shape.as_deref(), Some("#specialChild"));
		assert_eq!(b.text_dy, 18.0);
		assert_eq!(c.shape, "#empty");

		assert_eq!(scene.edges.len(), 1);
		assert_eq!(scene.edges[0].key, EdgeKey::new(1, 2));
		assert_eq!(scene.edges[0].path, "M75,0L225,0");
		assert_eq!(scene.edges[0].handle_shape, "#specialEdge");
		assert_eq!(scene.unresolved, vec![EdgeKey::new(2, 9)]);
		assert_eq!(scene.drag_line, None);
	}

	#[test]
	fn selection_changes_style_not_geometry() {
		let mut model = model();
		let before = scene(&model);
		model.set_selected(Some(Selection::Node(NodeKey::from(2))));
		let after = scene(&model);

		assert!(after.nodes[1].selected);
		assert_ne!(after.nodes[1].shape_style, before.nodes[1].shape_style);
		assert_eq!(after.nodes[1].transform, before.nodes[1].transform);
		assert_eq!(after.edges, before.edges);
	}

	#[test]
	fn scene_is_idempotent() {
		let model = model();
		assert_eq!(scene(&model), scene(&model));
	}

	#[test]
	fn rerender_with_unchanged_scene_creates_nothing() {
		let model = model();
		let mut renderer = Renderer::new(Recording::default(), 150.0);
		renderer.render(&scene(&model), 0.0).unwrap();
		assert_eq!(creations(renderer.surface()), 4);

		let stats = renderer.render(&scene(&model), 10.0).unwrap();
		assert_eq!(creations(renderer.surface()), 4);
		assert!(stats.nodes.entered.is_empty() && stats.nodes.exited.is_empty());
		assert_eq!(stats.nodes.updated.len(), 3);
	}

	#[test]
	fn removed_node_fades_out_then_detaches() {
		let mut model = model();
		let mut renderer = Renderer::new(Recording::default(), 150.0);
		renderer.render(&scene(&model), 0.0).unwrap();
		renderer.tick(200.0).unwrap();

		model.remove_node(&NodeKey::from(1));
		let stats = renderer.render(&scene(&model), 1000.0).unwrap();
		assert_eq!(stats.nodes.exited, vec![NodeKey::from(1)]);
		assert_eq!(stats.edges.exited, vec![EdgeKey::new(1, 2)]);

		let key = NodeKey::from(1);
		assert_eq!(renderer.node_opacity(&key, 1075.0), Some(0.5));
		assert!(renderer.tick(1100.0).unwrap());
		assert!(!renderer.tick(1150.0).unwrap());
		assert_eq!(renderer.node_opacity(&key, 1150.0), None);
		assert_eq!(
			renderer
				.surface()
				.ops
				.iter()
				.filter(|op| op.starts_with("remove"))
				.count(),
			2
		);
	}

	#[test]
	fn returning_key_is_revived_not_recreated() {
		let mut reconciler: Reconciler<&str, u32> = Reconciler::new(100.0);
		reconciler.diff([&"a"], 0.0);
		reconciler.insert("a", 7, 0.0);
		reconciler.tick(100.0);
		assert_eq!(reconciler.phase(&"a"), Some(Phase::Present));

		let diff = reconciler.diff(std::iter::empty(), 200.0);
		assert_eq!(diff.exited, vec!["a"]);
		let diff = reconciler.diff([&"a"], 250.0);
		assert_eq!(diff.updated, vec!["a"]);
		assert!(diff.entered.is_empty());
		assert_eq!(reconciler.get(&"a"), Some(&7));
		assert_eq!(reconciler.phase(&"a"), Some(Phase::Entering { since: 250.0 }));
	}

	#[test]
	fn zero_fade_is_immediate() {
		let mut reconciler: Reconciler<u8, u8> = Reconciler::new(0.0);
		reconciler.insert(1, 1, 0.0);
		assert_eq!(reconciler.opacity(&1, 0.0), Some(1.0));
		reconciler.diff(std::iter::empty(), 0.0);
		assert_eq!(reconciler.tick(0.0).removed, vec![1]);
		assert!(reconciler.is_empty());
	}
}
