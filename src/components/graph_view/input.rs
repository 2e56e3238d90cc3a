//! Input abstraction layer.
//!
//! The DOM delivers raw mouse events against whatever element is under the
//! pointer. [`PointerTracker`] folds that stream into the higher-level
//! [`InputEvent`]s the interaction state machine consumes: entity presses,
//! drag start/move/end (a drag begins on the first movement past a small
//! threshold), background pans and background clicks. Every press on an
//! entity closes with [`InputEvent::PressEnd`], dragged or not. Hover and keyboard
//! events map one-to-one and are constructed directly by the component.

use super::geometry::{Point, distance};
use super::types::{EdgeKey, NodeKey};

/// What a raw pointer event landed on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PointerTarget {
	Background,
	Node(NodeKey),
	/// The edge's line (arrowhead included, since markers are not hit targets).
	EdgePath(EdgeKey),
	/// The edge's mid-point handle glyph.
	EdgeHandle(EdgeKey),
}

/// The entity a drag gesture started on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DragTarget {
	Node(NodeKey),
	Edge(EdgeKey),
}

/// A normalized editor input event. Positions named `at` are world
/// coordinates; positions named `screen` are viewport pixels.
#[derive(Clone, Debug, PartialEq)]
pub enum InputEvent {
	/// Press and release on empty canvas without moving.
	CanvasClick { at: Point, shift: bool },
	/// A click anywhere in the window; `inside_svg` is false when it landed
	/// outside the editor's SVG element.
	WindowClick { inside_svg: bool },
	NodeMouseDown { key: NodeKey, shift: bool },
	NodeMouseUp { key: NodeKey },
	NodeMouseEnter { key: NodeKey },
	/// `buttons` is the DOM mouse-button bitmask at the time of the leave.
	NodeMouseLeave { key: NodeKey, buttons: u16 },
	/// `on_path` is false when the press landed on the handle glyph.
	EdgeMouseDown { edge: EdgeKey, at: Point, on_path: bool },
	DragStart { target: DragTarget, at: Point },
	/// `dx`/`dy` are the world-space movement since the previous drag event.
	Drag { at: Point, dx: f64, dy: f64 },
	/// `over` is the node under the pointer at release, if any.
	DragEnd { at: Point, over: Option<NodeKey> },
	/// The press on a node or edge is over; always the last event of it.
	PressEnd,
	KeyDown { key: String },
	PanStart { screen: Point },
	Pan { screen: Point },
	PanEnd,
	Wheel { screen: Point, delta_y: f64 },
}

/// One raw pointer sample in both coordinate spaces.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerSample {
	pub screen: Point,
	pub world: Point,
	pub shift: bool,
}

#[derive(Clone, Debug)]
struct Press {
	target: PointerTarget,
	origin: Point,
	last_world: Point,
	dragging: bool,
}

/// Screen-pixel movement after which a press becomes a drag.
pub const DRAG_THRESHOLD: f64 = 2.0;

/// Turns raw down/move/up samples into [`InputEvent`]s.
#[derive(Clone, Debug, Default)]
pub struct PointerTracker {
	press: Option<Press>,
}

impl PointerTracker {
	pub fn down(&mut self, target: PointerTarget, sample: PointerSample) -> Vec<InputEvent> {
		let event = match &target {
			PointerTarget::Background => InputEvent::PanStart {
				screen: sample.screen,
			},
			PointerTarget::Node(key) => InputEvent::NodeMouseDown {
				key: key.clone(),
				shift: sample.shift,
			},
			PointerTarget::EdgePath(edge) | PointerTarget::EdgeHandle(edge) => {
				InputEvent::EdgeMouseDown {
					edge: edge.clone(),
					at: sample.world,
					on_path: matches!(target, PointerTarget::EdgePath(_)),
				}
			}
		};
		self.press = Some(Press {
			target,
			origin: sample.screen,
			last_world: sample.world,
			dragging: false,
		});
		vec![event]
	}

	pub fn moved(&mut self, sample: PointerSample) -> Vec<InputEvent> {
		let Some(press) = self.press.as_mut() else {
			return Vec::new();
		};
		let mut events = Vec::new();
		if !press.dragging {
			if distance(press.origin, sample.screen) < DRAG_THRESHOLD {
				return events;
			}
			press.dragging = true;
			let target = match &press.target {
				PointerTarget::Background => None,
				PointerTarget::Node(key) => Some(DragTarget::Node(key.clone())),
				PointerTarget::EdgePath(edge) | PointerTarget::EdgeHandle(edge) => {
					Some(DragTarget::Edge(edge.clone()))
				}
			};
			if let Some(target) = target {
				events.push(InputEvent::DragStart {
					target,
					at: press.last_world,
				});
			}
		}
		match press.target {
			PointerTarget::Background => events.push(InputEvent::Pan {
				screen: sample.screen,
			}),
			_ => {
				events.push(InputEvent::Drag {
					at: sample.world,
					dx: sample.world.x - press.last_world.x,
					dy: sample.world.y - press.last_world.y,
				});
				press.last_world = sample.world;
			}
		}
		events
	}

	/// Release over `under`. A drag ends; an unmoved press becomes a
	/// mouse-up on the entity under the pointer, or a canvas click.
	pub fn up(&mut self, under: PointerTarget, sample: PointerSample) -> Vec<InputEvent> {
		let Some(press) = self.press.take() else {
			return Vec::new();
		};
		if press.target == PointerTarget::Background {
			let mut events = vec![InputEvent::PanEnd];
			if !press.dragging && under == PointerTarget::Background {
				events.push(InputEvent::CanvasClick {
					at: sample.world,
					shift: sample.shift,
				});
			}
			return events;
		}
		let mut events = Vec::new();
		match (press.dragging, under) {
			(true, under) => events.push(InputEvent::DragEnd {
				at: sample.world,
				over: match under {
					PointerTarget::Node(key) => Some(key),
					_ => None,
				},
			}),
			(false, PointerTarget::Node(key)) => events.push(InputEvent::NodeMouseUp { key }),
			(false, _) => {}
		}
		events.push(InputEvent::PressEnd);
		events
	}

	/// Abandon the current press (window blurred). A drag ends over nothing.
	pub fn cancel(&mut self) -> Vec<InputEvent> {
		let Some(press) = self.press.take() else {
			return Vec::new();
		};
		if press.target == PointerTarget::Background {
			return vec![InputEvent::PanEnd];
		}
		let mut events = Vec::new();
		if press.dragging {
			events.push(InputEvent::DragEnd {
				at: press.last_world,
				over: None,
			});
		}
		events.push(InputEvent::PressEnd);
		events
	}
}
