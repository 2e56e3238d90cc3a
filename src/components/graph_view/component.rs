//! Leptos component wrapping the graph editor.
//!
//! The component creates a wrapper `<div>`, builds the SVG skeleton inside it
//! on mount and wires DOM events to the [`GraphEditor`]. Pointer presses,
//! hover, wheel and touch are delegated handlers on the wrapper; pointer
//! moves and releases, clicks and keys are window-level listeners so a drag
//! keeps tracking once it leaves the view. An animation loop runs via
//! `requestAnimationFrame`, advancing view transitions and shape fades and
//! rendering whenever the editor reports a change.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use leptos::prelude::*;
use log::{debug, warn};
use wasm_bindgen::prelude::*;
use web_sys::{Element, Event, HtmlDivElement, KeyboardEvent, MouseEvent, TouchEvent, WheelEvent, Window};

use super::config::GraphConfig;
use super::controls::GraphControls;
use super::editor::GraphEditor;
use super::geometry::Point;
use super::input::PointerTarget;
use super::policy::{GraphPolicy, Permissive};
use super::render::Renderer;
use super::svg::SvgSurface;
use super::theme::GraphTheme;
use super::types::{EdgeKey, GraphData, GraphIntent, NodeKey, Selection};

/// Receives every intent the editor emits.
pub type IntentHandler = Rc<dyn Fn(GraphIntent)>;

/// A window event subscription, removed when dropped.
struct WindowListener {
	event: &'static str,
	closure: Closure<dyn FnMut(Event)>,
}

impl WindowListener {
	fn new(window: &Window, event: &'static str, handler: impl FnMut(Event) + 'static) -> Result<Self, JsValue> {
		let closure = Closure::<dyn FnMut(Event)>::new(handler);
		window.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())?;
		Ok(Self { event, closure })
	}
}

impl Drop for WindowListener {
	fn drop(&mut self) {
		if let Some(window) = web_sys::window() {
			let _ = window
				.remove_event_listener_with_callback(self.event, self.closure.as_ref().unchecked_ref());
		}
		debug!("graph view: released {} listener", self.event);
	}
}

/// Map a DOM event target to the entity it belongs to.
fn pointer_target(event: &Event) -> PointerTarget {
	let Some(element) = event.target().and_then(|t| t.dyn_into::<Element>().ok()) else {
		return PointerTarget::Background;
	};
	if let Ok(Some(node)) = element.closest("g.node") {
		if let Some(key) = node.get_attribute("data-key") {
			return PointerTarget::Node(NodeKey(key));
		}
	}
	if let Ok(Some(edge)) = element.closest("g.edge") {
		if let (Some(source), Some(target)) =
			(edge.get_attribute("data-source"), edge.get_attribute("data-target"))
		{
			let key = EdgeKey::new(NodeKey(source), NodeKey(target));
			return if element.tag_name() == "use" {
				PointerTarget::EdgeHandle(key)
			} else {
				PointerTarget::EdgePath(key)
			};
		}
	}
	PointerTarget::Background
}

/// Key of the node group an element belongs to, if any.
fn node_key_of(target: Option<web_sys::EventTarget>) -> Option<NodeKey> {
	let element = target?.dyn_into::<Element>().ok()?;
	let node = element.closest("g.node").ok()??;
	node.get_attribute("data-key").map(NodeKey)
}

/// Pointer position relative to the wrapper's top-left corner.
fn local_point(wrapper: &Element, ev: &MouseEvent) -> Point {
	let rect = wrapper.get_bounding_client_rect();
	Point::new(
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	)
}

fn now_ms() -> f64 {
	web_sys::window()
		.and_then(|w| w.performance())
		.map(|p| p.now())
		.unwrap_or_else(js_sys::Date::now)
}

/// Run `action` against the editor and forward what it emits. An event that
/// arrives while the editor is already borrowed (mid-render) is dropped.
fn run(
	editor: &Rc<RefCell<GraphEditor>>,
	on_intent: &Option<IntentHandler>,
	action: impl FnOnce(&mut GraphEditor) -> Vec<GraphIntent>,
) {
	let intents = match editor.try_borrow_mut() {
		Ok(mut editor) => action(&mut editor),
		Err(_) => {
			warn!("graph view: event dropped during render");
			return;
		}
	};
	if let Some(handler) = on_intent {
		for intent in intents {
			handler(intent);
		}
	}
}

/// Subscribe the window-level listeners: drag tracking, click-outside and keys.
fn window_listeners(
	window: &Window,
	wrapper: &HtmlDivElement,
	editor: &Rc<RefCell<GraphEditor>>,
	on_intent: &Option<IntentHandler>,
) -> Result<Vec<WindowListener>, JsValue> {
	let mut listeners = Vec::new();

	let (ed, cb, wr) = (editor.clone(), on_intent.clone(), wrapper.clone());
	listeners.push(WindowListener::new(window, "mousemove", move |ev| {
		let Some(ev) = ev.dyn_ref::<MouseEvent>() else {
			return;
		};
		let at = local_point(&wr, ev);
		run(&ed, &cb, |e| e.pointer_move(at, ev.shift_key()));
	})?);

	let (ed, cb, wr) = (editor.clone(), on_intent.clone(), wrapper.clone());
	listeners.push(WindowListener::new(window, "mouseup", move |ev| {
		let Some(mouse) = ev.dyn_ref::<MouseEvent>() else {
			return;
		};
		let at = local_point(&wr, mouse);
		let under = pointer_target(&ev);
		run(&ed, &cb, |e| e.pointer_up(under, at, mouse.shift_key()));
	})?);

	let (ed, cb, wr) = (editor.clone(), on_intent.clone(), wrapper.clone());
	listeners.push(WindowListener::new(window, "click", move |ev| {
		let inside = ev
			.target()
			.and_then(|t| t.dyn_into::<web_sys::Node>().ok())
			.is_some_and(|node| wr.contains(Some(&node)));
		run(&ed, &cb, |e| e.window_click(inside));
	})?);

	let (ed, cb) = (editor.clone(), on_intent.clone());
	listeners.push(WindowListener::new(window, "keydown", move |ev| {
		if let Some(key) = ev.dyn_ref::<KeyboardEvent>().map(KeyboardEvent::key) {
			run(&ed, &cb, |e| e.key_down(&key));
		}
	})?);

	// A release outside the browser window never arrives; drop the press.
	let (ed, cb) = (editor.clone(), on_intent.clone());
	listeners.push(WindowListener::new(window, "blur", move |_| {
		run(&ed, &cb, GraphEditor::pointer_cancel);
	})?);

	let (ed, wr) = (editor.clone(), wrapper.clone());
	listeners.push(WindowListener::new(window, "resize", move |_| {
		if let Ok(mut editor) = ed.try_borrow_mut() {
			editor.resize(wr.client_width() as f64, wr.client_height() as f64);
		}
	})?);

	Ok(listeners)
}

/// Renders an interactive node/edge editor in an SVG canvas.
///
/// Pass graph data via the reactive `data` signal. With `manage_data` (the
/// default) the editor applies its own edits; otherwise every edit is only
/// reported through `on_intent` and the host pushes updated data back.
/// The component sizes itself to its parent; set `fullscreen = true` to fill
/// the window instead.
#[component]
pub fn GraphView(
	#[prop(into)] data: Signal<GraphData>,
	#[prop(optional)] config: Option<GraphConfig>,
	#[prop(optional)] theme: Option<GraphTheme>,
	#[prop(optional)] policy: Option<Rc<dyn GraphPolicy>>,
	#[prop(optional)] on_intent: Option<IntentHandler>,
	/// Host-controlled selection; overrides the editor's own when it changes.
	#[prop(optional, into)]
	selected: Option<Signal<Option<Selection>>>,
	/// Host-controlled read-only switch; overrides `config.read_only`.
	#[prop(optional, into)]
	read_only: Option<Signal<bool>>,
	#[prop(default = true)] manage_data: bool,
	#[prop(default = false)] fullscreen: bool,
) -> impl IntoView {
	let config = config.unwrap_or_default();
	let theme = theme.unwrap_or_else(|| {
		GraphTheme::by_name(&config.theme).unwrap_or_else(|| {
			warn!("graph view: unknown theme {:?}, using light", config.theme);
			GraphTheme::default()
		})
	});
	let policy = policy.unwrap_or_else(|| Rc::new(Permissive));
	let (min_zoom, max_zoom, zoom_delay) = (config.min_zoom, config.max_zoom, config.zoom_delay_ms);
	let wrapper_style = format!(
		"{} display: flex; overflow: hidden; background: {};",
		if fullscreen {
			"position: fixed; inset: 0;"
		} else {
			"position: relative; width: 100%; height: 100%;"
		},
		theme.background.to_css()
	);

	let editor = Rc::new(RefCell::new(GraphEditor::new(
		config,
		theme,
		data.get_untracked(),
		policy,
		manage_data,
	)));
	let renderer: Rc<RefCell<Option<Renderer<SvgSurface>>>> = Rc::new(RefCell::new(None));
	let animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let listeners = StoredValue::new_local(Vec::<WindowListener>::new());
	let alive = StoredValue::new(());
	let (zoom_level, set_zoom_level) = signal(1.0_f64);
	let wrapper_ref = NodeRef::<leptos::html::Div>::new();

	let (editor_mount, renderer_mount, animate_init, on_intent_mount) =
		(editor.clone(), renderer.clone(), animate.clone(), on_intent.clone());
	Effect::new(move |_| {
		let Some(wrapper) = wrapper_ref.get() else {
			return;
		};
		let Some(window) = web_sys::window() else {
			return;
		};
		let Some(document) = window.document() else {
			return;
		};

		{
			let mut editor = editor_mount.borrow_mut();
			editor.resize(wrapper.client_width() as f64, wrapper.client_height() as f64);
			match SvgSurface::install(document, &wrapper, editor.config(), editor.theme()) {
				Ok(surface) => {
					*renderer_mount.borrow_mut() =
						Some(Renderer::new(surface, editor.config().transition_ms));
				}
				Err(err) => {
					warn!("graph view: failed to build svg: {:?}", err);
					return;
				}
			}
		}

		match window_listeners(&window, &wrapper, &editor_mount, &on_intent_mount) {
			Ok(subscribed) => listeners.update_value(|l| *l = subscribed),
			Err(err) => warn!("graph view: failed to subscribe window listeners: {:?}", err),
		}

		let editor_fit = editor_mount.clone();
		set_timeout(
			move || {
				if let Ok(mut editor) = editor_fit.try_borrow_mut() {
					editor.zoom_to_fit();
				}
			},
			Duration::from_millis(zoom_delay as u64),
		);

		let (editor_anim, renderer_anim, animate_inner) =
			(editor_mount.clone(), renderer_mount.clone(), animate_init.clone());
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			if alive.try_get_value().is_none() {
				// The closure owns an `Rc` to its own slot; empty the slot so
				// the loop is freed once this last frame returns.
				let _ = animate_inner.borrow_mut().take();
				return;
			}
			if let (Ok(mut editor), Ok(mut renderer)) =
				(editor_anim.try_borrow_mut(), renderer_anim.try_borrow_mut())
			{
				let now = now_ms();
				let due = editor.tick(now);
				if let Some(renderer) = renderer.as_mut() {
					let result = if due {
						renderer.render(&editor.scene(), now).map(|_| ())
					} else {
						renderer.tick(now).map(|_| ())
					};
					if let Err(err) = result {
						warn!("graph view: render failed: {:?}", err);
					}
				}
				let k = editor.zoom_level();
				if (zoom_level.get_untracked() - k).abs() > 1e-6 {
					set_zoom_level.set(k);
				}
			}
			if let (Some(cb), Some(window)) = (animate_inner.borrow().as_ref(), web_sys::window()) {
				let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(cb) = animate_init.borrow().as_ref() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	let editor_data = editor.clone();
	Effect::new(move |prev: Option<()>| {
		let next = data.get();
		if prev.is_some() {
			editor_data.borrow_mut().set_data(next);
		}
	});

	if let Some(read_only) = read_only {
		let editor_ro = editor.clone();
		Effect::new(move |_| {
			let read_only = read_only.get();
			editor_ro.borrow_mut().set_read_only(read_only);
		});
	}

	if let Some(selected) = selected {
		let editor_sel = editor.clone();
		Effect::new(move |_| {
			let selection = selected.get();
			editor_sel.borrow_mut().set_selected(selection);
		});
	}

	let (editor_md, cb_md) = (editor.clone(), on_intent.clone());
	let on_mousedown = move |ev: MouseEvent| {
		if ev.button() != 0 {
			return;
		}
		let Some(wrapper) = wrapper_ref.get_untracked() else {
			return;
		};
		ev.prevent_default();
		let at = local_point(&wrapper, &ev);
		let target = pointer_target(&ev);
		run(&editor_md, &cb_md, |e| e.pointer_down(target, at, ev.shift_key()));
	};

	let (editor_over, cb_over) = (editor.clone(), on_intent.clone());
	let on_mouseover = move |ev: MouseEvent| {
		let entered = node_key_of(ev.target());
		if entered.is_some() && entered != node_key_of(ev.related_target()) {
			if let Some(key) = entered {
				run(&editor_over, &cb_over, |e| e.node_enter(key));
			}
		}
	};

	let (editor_out, cb_out) = (editor.clone(), on_intent.clone());
	let on_mouseout = move |ev: MouseEvent| {
		let left = node_key_of(ev.target());
		if left.is_some() && left != node_key_of(ev.related_target()) {
			if let Some(key) = left {
				run(&editor_out, &cb_out, |e| e.node_leave(key, ev.buttons()));
			}
		}
	};

	let (editor_wh, cb_wh) = (editor.clone(), on_intent.clone());
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some(wrapper) = wrapper_ref.get_untracked() else {
			return;
		};
		let at = local_point(&wrapper, &ev);
		run(&editor_wh, &cb_wh, |e| e.wheel(at, ev.delta_y()));
	};

	let editor_zoom = editor.clone();
	let on_zoom: Rc<dyn Fn(f64)> = Rc::new(move |delta| {
		if let Ok(mut editor) = editor_zoom.try_borrow_mut() {
			editor.modify_zoom(delta);
		}
	});
	let editor_fit = editor.clone();
	let on_fit: Rc<dyn Fn()> = Rc::new(move || {
		if let Ok(mut editor) = editor_fit.try_borrow_mut() {
			editor.zoom_to_fit();
		}
	});

	view! {
		<div class="graph-view" style="position: relative; width: 100%; height: 100%;">
			<div
				node_ref=wrapper_ref
				class="graph-view-wrapper"
				style=wrapper_style
				on:mousedown=on_mousedown
				on:mouseover=on_mouseover
				on:mouseout=on_mouseout
				on:wheel=on_wheel
				on:touchstart=|ev: TouchEvent| ev.prevent_default()
				on:touchmove=|ev: TouchEvent| ev.prevent_default()
			/>
			<GraphControls
				zoom=zoom_level
				min_zoom=min_zoom
				max_zoom=max_zoom
				on_zoom=on_zoom
				on_fit=on_fit
			/>
		</div>
	}
}
