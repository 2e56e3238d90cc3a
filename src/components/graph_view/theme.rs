//! Visual theming for the graph editor.
//!
//! Provides the color set used for canvas chrome, nodes, edges and the
//! transient drag line, plus the selection-dependent styles the renderer asks for.

/// RGBA color representation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
	pub r: u8,
	pub g: u8,
	pub b: u8,
	pub a: f64,
}

impl Color {
	pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
		Self { r, g, b, a: 1.0 }
	}

	pub fn to_css(self) -> String {
		if (self.a - 1.0).abs() < 0.001 {
			format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
		} else {
			format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
		}
	}
}

/// CSS `dodgerblue`.
pub const DODGER_BLUE: Color = Color::rgb(30, 144, 255);
pub const WHITE: Color = Color::rgb(255, 255, 255);
pub const BLACK: Color = Color::rgb(0, 0, 0);

/// Colors of one node shape.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeStyle {
	pub fill: Color,
	pub text: Color,
	/// `currentColor` inside the node's symbols.
	pub icon: Color,
}

/// Complete visual theme.
#[derive(Clone, Debug, PartialEq)]
pub struct GraphTheme {
	pub name: &'static str,
	/// Fill behind the grid pattern.
	pub background: Color,
	pub grid_dot: Color,
	/// Used for whatever is selected.
	pub accent: Color,
	pub node: NodeStyle,
	pub node_selected: NodeStyle,
	/// Edge line color.
	pub stroke: Color,
	/// Handle glyph color.
	pub edge: Color,
	pub edge_selected: Color,
	pub drag_line: Color,
	/// Opacity of the drop shadow under node shapes.
	pub shadow_opacity: f64,
}

impl Default for GraphTheme {
	fn default() -> Self {
		Self::light()
	}
}

impl GraphTheme {
	/// White shapes on a light grey dotted canvas (default)
	pub fn light() -> Self {
		Self {
			name: "light",
			background: Color::rgb(249, 249, 249),
			grid_dot: Color::rgb(211, 211, 211),
			accent: DODGER_BLUE,
			node: NodeStyle {
				fill: WHITE,
				text: BLACK,
				icon: DODGER_BLUE,
			},
			node_selected: NodeStyle {
				fill: DODGER_BLUE,
				text: WHITE,
				icon: WHITE,
			},
			stroke: DODGER_BLUE,
			edge: WHITE,
			edge_selected: DODGER_BLUE,
			drag_line: DODGER_BLUE,
			shadow_opacity: 0.2,
		}
	}

	/// Dark canvas variant with the same accent
	pub fn midnight() -> Self {
		Self {
			name: "midnight",
			background: Color::rgb(22, 27, 34),
			grid_dot: Color::rgb(48, 54, 61),
			node: NodeStyle {
				fill: Color::rgb(201, 209, 217),
				text: Color::rgb(22, 27, 34),
				icon: DODGER_BLUE,
			},
			edge: Color::rgb(139, 148, 158),
			shadow_opacity: 0.6,
			..Self::light()
		}
	}

	pub fn by_name(name: &str) -> Option<Self> {
		match name {
			"light" => Some(Self::light()),
			"midnight" => Some(Self::midnight()),
			_ => None,
		}
	}

	pub fn node_style(&self, selected: bool) -> NodeStyle {
		if selected { self.node_selected } else { self.node }
	}

	pub fn edge_color(&self, selected: bool) -> Color {
		if selected { self.edge_selected } else { self.edge }
	}

	/// Inline `style` for a node group.
	pub fn node_css(&self, selected: bool) -> String {
		let style = self.node_style(selected);
		let fill = style.fill.to_css();
		format!(
			"color: {}; stroke: {fill}; fill: {fill}; filter: url(#dropshadow); stroke-width: 0.5px; cursor: pointer;",
			style.icon.to_css()
		)
	}

	pub fn text_css(&self, selected: bool) -> String {
		let text = self.node_style(selected).text.to_css();
		format!("fill: {text}; stroke: {text};")
	}

	/// Inline `style` for an edge group: the line takes the stroke, the
	/// handle glyph takes `currentColor`.
	pub fn edge_css(&self, selected: bool) -> String {
		format!(
			"color: {}; stroke: {}; stroke-width: 2px; marker-end: url(#end-arrow); cursor: pointer;",
			self.edge_color(selected).to_css(),
			self.stroke.to_css()
		)
	}

	pub fn drag_line_css(&self) -> String {
		let color = self.drag_line.to_css();
		format!(
			"color: {color}; stroke: {color}; stroke-width: 2px; marker-end: url(#end-arrow); pointer-events: none;"
		)
	}
}
