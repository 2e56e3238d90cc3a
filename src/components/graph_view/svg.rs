//! SVG drawing surface.
//!
//! Builds the static chrome once (symbols, arrow marker, dotted grid,
//! drop shadow, background) and then creates, updates and removes one `<g>`
//! per node and per edge as the [`Renderer`](super::render::Renderer) asks.
//! Every entity group carries `data-*` attributes so delegated event handlers
//! can map a DOM target back to a model key.

use wasm_bindgen::JsValue;
use web_sys::{Document, Element};

use super::config::GraphConfig;
use super::render::{EdgeView, NodeView, Surface};
use super::theme::GraphTheme;

pub const SVG_NS: &str = "http://www.w3.org/2000/svg";

/// `<defs>` content: node and edge-handle symbols, the arrowhead marker,
/// the dotted grid pattern and the drop-shadow filter.
pub fn defs_markup(config: &GraphConfig, theme: &GraphTheme) -> String {
	let arrow = config.edge_arrow_size;
	let half_arrow = arrow / 2.0;
	let spacing = config.grid_spacing;
	format!(
		concat!(
			r#"<symbol viewBox="0 0 100 100" id="empty"><circle cx="50" cy="50" r="45"></circle></symbol>"#,
			r#"<symbol viewBox="0 0 100 100" id="special"><rect transform="translate(50) rotate(45)" x="0" y="0" width="60" height="60"></rect></symbol>"#,
			r#"<symbol viewBox="0 0 100 100" id="specialChild"><rect x="5" y="5" width="90" height="90"></rect></symbol>"#,
			r#"<symbol viewBox="0 0 50 50" id="emptyEdge"><circle cx="25" cy="25" r="8" fill="currentColor"></circle></symbol>"#,
			r#"<symbol viewBox="0 0 50 50" id="specialEdge"><rect transform="rotate(45)" x="25" y="-4.5" width="15" height="15" fill="currentColor"></rect></symbol>"#,
			r#"<marker id="end-arrow" viewBox="0 -{half} {arrow} {arrow}" refX="{half}" markerWidth="{arrow}" markerHeight="{arrow}" orient="auto">"#,
			r#"<path class="arrow" style="fill: {accent};" d="M0,-{half}L{arrow},0L0,{half}"></path></marker>"#,
			r#"<pattern id="grid" width="{spacing}" height="{spacing}" patternUnits="userSpaceOnUse">"#,
			r#"<circle cx="{grid_center}" cy="{grid_center}" r="{dot}" fill="{dot_color}"></circle></pattern>"#,
			r#"<filter id="dropshadow" height="130%"><feGaussianBlur in="SourceAlpha" stdDeviation="3"></feGaussianBlur>"#,
			r#"<feOffset dx="2" dy="2" result="offsetblur"></feOffset>"#,
			r#"<feComponentTransfer><feFuncA type="linear" slope="{shadow}"></feFuncA></feComponentTransfer>"#,
			r#"<feMerge><feMergeNode></feMergeNode><feMergeNode in="SourceGraphic"></feMergeNode></feMerge></filter>"#,
		),
		half = half_arrow,
		arrow = arrow,
		accent = theme.accent.to_css(),
		spacing = spacing,
		grid_center = spacing / 2.0,
		dot = config.grid_dot,
		dot_color = theme.grid_dot.to_css(),
		shadow = theme.shadow_opacity,
	)
}

/// Drawn entity: its group plus the child elements updates touch.
pub struct Shape {
	group: Element,
	parts: Vec<Element>,
}

pub struct SvgSurface {
	document: Document,
	view: Element,
	edges: Element,
	nodes: Element,
	drag_line: Element,
	node_size: f64,
	handle_size: f64,
}

impl SvgSurface {
	/// Build the SVG skeleton inside `wrapper`.
	pub fn install(
		document: Document,
		wrapper: &Element,
		config: &GraphConfig,
		theme: &GraphTheme,
	) -> Result<Self, JsValue> {
		let create = |tag: &str| document.create_element_ns(Some(SVG_NS), tag);

		let svg = create("svg")?;
		svg.set_attribute("class", "graph-view")?;
		svg.set_attribute("width", "100%")?;
		svg.set_attribute("height", "100%")?;
		svg.set_attribute("style", "flex: 1; display: block; user-select: none;")?;

		let defs = create("defs")?;
		defs.set_inner_html(&defs_markup(config, theme));
		svg.append_child(&defs)?;

		let view = create("g")?;
		view.set_attribute("class", "view")?;
		svg.append_child(&view)?;

		let background = create("rect")?;
		let offset = (-config.grid_size / 4.0).to_string();
		let size = config.grid_size.to_string();
		background.set_attribute("class", "background")?;
		background.set_attribute("x", &offset)?;
		background.set_attribute("y", &offset)?;
		background.set_attribute("width", &size)?;
		background.set_attribute("height", &size)?;
		background.set_attribute("fill", "url(#grid)")?;
		view.append_child(&background)?;

		let entities = create("g")?;
		entities.set_attribute("class", "entities")?;
		view.append_child(&entities)?;

		let edges = create("g")?;
		edges.set_attribute("class", "edges")?;
		entities.append_child(&edges)?;

		let drag_line = create("path")?;
		drag_line.set_attribute("class", "drag-line")?;
		drag_line.set_attribute("style", &theme.drag_line_css())?;
		drag_line.set_attribute("display", "none")?;
		// Releases must hit the node under the line's end.
		drag_line.set_attribute("pointer-events", "none")?;
		entities.append_child(&drag_line)?;

		let nodes = create("g")?;
		nodes.set_attribute("class", "nodes")?;
		entities.append_child(&nodes)?;

		wrapper.append_child(&svg)?;

		Ok(Self {
			document,
			view,
			edges,
			nodes,
			drag_line,
			node_size: config.node_size,
			handle_size: config.edge_handle_size,
		})
	}

	fn create(&self, tag: &str) -> Result<Element, JsValue> {
		self.document.create_element_ns(Some(SVG_NS), tag)
	}

	fn node_use(&self, class: &str) -> Result<Element, JsValue> {
		let shape = self.create("use")?;
		let half = (-self.node_size / 2.0).to_string();
		let size = self.node_size.to_string();
		shape.set_attribute("class", class)?;
		shape.set_attribute("x", &half)?;
		shape.set_attribute("y", &half)?;
		shape.set_attribute("width", &size)?;
		shape.set_attribute("height", &size)?;
		Ok(shape)
	}
}

fn class_list(base: &str, selected: bool, hovered: bool) -> String {
	let mut class = base.to_string();
	if selected {
		class.push_str(" selected");
	}
	if hovered {
		class.push_str(" hovered");
	}
	class
}

impl Surface for SvgSurface {
	type Handle = Shape;
	type Error = JsValue;

	fn set_view_transform(&mut self, transform: &str) -> Result<(), JsValue> {
		self.view.set_attribute("transform", transform)
	}

	fn create_node(&mut self, view: &NodeView) -> Result<Shape, JsValue> {
		let group = self.create("g")?;
		group.set_attribute("data-key", view.key.as_str())?;

		let subtype = self.node_use("subtypeShape")?;
		let shape = self.node_use("shape")?;
		let text = self.create("text")?;
		text.set_attribute("text-anchor", "middle")?;

		group.append_child(&subtype)?;
		group.append_child(&shape)?;
		group.append_child(&text)?;
		self.nodes.append_child(&group)?;

		Ok(Shape {
			group,
			parts: vec![subtype, shape, text],
		})
	}

	fn update_node(&mut self, handle: &Shape, view: &NodeView) -> Result<(), JsValue> {
		let [subtype, shape, text] = &handle.parts[..] else {
			return Err(JsValue::from_str("node shape is missing parts"));
		};
		handle.group.set_attribute("class", &class_list("node", view.selected, view.hovered))?;
		handle.group.set_attribute("transform", &view.transform)?;
		handle.group.set_attribute("style", &view.shape_style)?;
		match &view.subtype_shape {
			Some(href) => {
				subtype.set_attribute("href", href)?;
				subtype.remove_attribute("display")?;
			}
			None => subtype.set_attribute("display", "none")?,
		}
		shape.set_attribute("href", &view.shape)?;
		text.set_attribute("dy", &view.text_dy.to_string())?;
		text.set_attribute("style", &view.text_style)?;
		text.set_text_content(Some(&view.title));
		Ok(())
	}

	fn create_edge(&mut self, view: &EdgeView) -> Result<Shape, JsValue> {
		let group = self.create("g")?;
		group.set_attribute("data-source", view.key.source.as_str())?;
		group.set_attribute("data-target", view.key.target.as_str())?;

		let path = self.create("path")?;
		let glyph = self.create("use")?;
		let size = self.handle_size.to_string();
		glyph.set_attribute("width", &size)?;
		glyph.set_attribute("height", &size)?;

		group.append_child(&path)?;
		group.append_child(&glyph)?;
		self.edges.append_child(&group)?;

		Ok(Shape {
			group,
			parts: vec![path, glyph],
		})
	}

	fn update_edge(&mut self, handle: &Shape, view: &EdgeView) -> Result<(), JsValue> {
		let [path, glyph] = &handle.parts[..] else {
			return Err(JsValue::from_str("edge shape is missing parts"));
		};
		handle.group.set_attribute("class", &class_list("edge", view.selected, false))?;
		handle.group.set_attribute("style", &view.style)?;
		if view.hidden {
			handle.group.set_attribute("display", "none")?;
		} else {
			handle.group.remove_attribute("display")?;
		}
		path.set_attribute("d", &view.path)?;
		glyph.set_attribute("href", &view.handle_shape)?;
		glyph.set_attribute("transform", &view.handle_transform)?;
		Ok(())
	}

	fn set_opacity(&mut self, handle: &Shape, opacity: f64) -> Result<(), JsValue> {
		handle.group.set_attribute("opacity", &opacity.to_string())
	}

	fn remove(&mut self, handle: Shape) {
		handle.group.remove();
	}

	fn set_drag_line(&mut self, path: Option<&str>) -> Result<(), JsValue> {
		match path {
			Some(d) => {
				self.drag_line.set_attribute("d", d)?;
				self.drag_line.remove_attribute("display")
			}
			None => self.drag_line.set_attribute("display", "none"),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn defs_follow_config_sizes() {
		let config = GraphConfig {
			edge_arrow_size: 10.0,
			grid_spacing: 40.0,
			grid_dot: 3.0,
			..GraphConfig::default()
		};
		let defs = defs_markup(&config, &GraphTheme::default());
		assert!(defs.contains(r#"<marker id="end-arrow" viewBox="0 -5 10 10" refX="5" markerWidth="10""#));
		assert!(defs.contains(r#"d="M0,-5L10,0L0,5""#));
		assert!(defs.contains(r#"<pattern id="grid" width="40" height="40""#));
		assert!(defs.contains(r##"cx="20" cy="20" r="3" fill="#d3d3d3""##));
		assert!(defs.contains(r#"slope="0.2""#));
	}

	#[test]
	fn defs_declare_every_default_shape() {
		let config = GraphConfig::default();
		let defs = defs_markup(&config, &GraphTheme::default());
		let shapes = config
			.node_types
			.values()
			.chain(config.node_subtypes.values())
			.chain(config.edge_types.values())
			.map(|spec| spec.shape_id.trim_start_matches('#').to_string());
		for id in shapes {
			assert!(defs.contains(&format!(r#"id="{id}""#)), "missing symbol {id}");
		}
	}

	#[test]
	fn classes_reflect_state() {
		assert_eq!(class_list("node", false, false), "node");
		assert_eq!(class_list("node", true, true), "node selected hovered");
	}
}
