//! Editor configuration: identity field, type registries, sizing and timing.
//!
//! Every field has a default, so a host can deserialize a partial JSON object
//! (e.g. `{ "readOnly": true }`) and get a working configuration.

use std::collections::HashMap;

use serde::Deserialize;

use super::error::LoadError;

/// Symbol and label registered for a node, subtype or edge type tag.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeSpec {
	/// `href` of the `<symbol>` drawn for this tag, e.g. `#empty`.
	pub shape_id: String,
	/// Human-readable name of the tag.
	#[serde(default)]
	pub type_text: String,
}

impl TypeSpec {
	pub fn new(shape_id: &str, type_text: &str) -> Self {
		Self {
			shape_id: shape_id.to_string(),
			type_text: type_text.to_string(),
		}
	}
}

/// Shape used when a node's type has no registry entry.
pub const FALLBACK_NODE_SHAPE: &str = "#empty";
/// Handle glyph used when an edge's type has no registry entry.
pub const FALLBACK_EDGE_SHAPE: &str = "#specialEdge";
pub const DEFAULT_MIN_ZOOM: f64 = 0.15;
pub const DEFAULT_MAX_ZOOM: f64 = 1.5;

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GraphConfig {
	/// Name of the JSON field holding each node's identity.
	pub node_key: String,
	/// Type tag whose title is drawn over the shape instead of below it.
	pub empty_type: String,
	pub node_types: HashMap<String, TypeSpec>,
	pub node_subtypes: HashMap<String, TypeSpec>,
	pub edge_types: HashMap<String, TypeSpec>,
	/// Titles longer than this are cut and suffixed with `...`.
	pub max_title_chars: usize,
	pub read_only: bool,
	/// When set, clicking outside the SVG removes focus from the editor.
	pub enable_focus: bool,
	/// Node symbol width and height in world units.
	pub node_size: f64,
	pub edge_arrow_size: f64,
	pub edge_handle_size: f64,
	/// Extra slack around the arrowhead for the swap hit test.
	pub arrow_hit_margin: f64,
	pub min_zoom: f64,
	pub max_zoom: f64,
	/// Delay before the initial zoom-to-fit after mount.
	pub zoom_delay_ms: f64,
	/// Duration of animated zoom-to-fit transitions.
	pub zoom_duration_ms: f64,
	/// Fade duration for entering and exiting shapes.
	pub transition_ms: f64,
	pub grid_size: f64,
	pub grid_spacing: f64,
	pub grid_dot: f64,
	/// Named color theme, `light` or `midnight`.
	pub theme: String,
}

impl Default for GraphConfig {
	fn default() -> Self {
		Self {
			node_key: "id".into(),
			empty_type: "empty".into(),
			node_types: HashMap::from([
				("empty".to_string(), TypeSpec::new("#empty", "None")),
				("special".to_string(), TypeSpec::new("#special", "Special")),
			]),
			node_subtypes: HashMap::from([(
				"specialChild".to_string(),
				TypeSpec::new("#specialChild", "Special Child"),
			)]),
			edge_types: HashMap::from([
				("emptyEdge".to_string(), TypeSpec::new("#emptyEdge", "")),
				("specialEdge".to_string(), TypeSpec::new("#specialEdge", "")),
			]),
			max_title_chars: 9,
			read_only: false,
			enable_focus: false,
			node_size: 150.0,
			edge_arrow_size: 8.0,
			edge_handle_size: 50.0,
			arrow_hit_margin: 10.0,
			min_zoom: DEFAULT_MIN_ZOOM,
			max_zoom: DEFAULT_MAX_ZOOM,
			zoom_delay_ms: 500.0,
			zoom_duration_ms: 750.0,
			transition_ms: 150.0,
			grid_size: 40960.0,
			grid_spacing: 36.0,
			grid_dot: 2.0,
			theme: "light".into(),
		}
	}
}

impl GraphConfig {
	pub fn from_json(text: &str) -> Result<Self, LoadError> {
		let config: Self = serde_json::from_str(text)?;
		if !valid_zoom_range(config.min_zoom, config.max_zoom) {
			return Err(LoadError::ZoomRange {
				min: config.min_zoom,
				max: config.max_zoom,
			});
		}
		Ok(config)
	}

	/// Distance from a node centre to its drawn perimeter.
	pub fn node_radius(&self) -> f64 {
		self.node_size / 2.0
	}

	/// Radius around an edge's target node inside which a press counts as
	/// grabbing the arrowhead.
	pub fn arrow_hit_radius(&self) -> f64 {
		self.node_radius() + self.edge_arrow_size + self.arrow_hit_margin
	}

	pub fn node_shape(&self, node_type: &str) -> &str {
		self.node_types
			.get(node_type)
			.map(|spec| spec.shape_id.as_str())
			.unwrap_or(FALLBACK_NODE_SHAPE)
	}

	pub fn subtype_shape(&self, subtype: Option<&str>) -> Option<&str> {
		subtype
			.and_then(|s| self.node_subtypes.get(s))
			.map(|spec| spec.shape_id.as_str())
	}

	pub fn edge_shape(&self, edge_type: &str) -> &str {
		self.edge_types
			.get(edge_type)
			.map(|spec| spec.shape_id.as_str())
			.unwrap_or(FALLBACK_EDGE_SHAPE)
	}
}

/// Zoom bounds must be finite, positive and ordered.
pub fn valid_zoom_range(min_zoom: f64, max_zoom: f64) -> bool {
	min_zoom.is_finite() && max_zoom.is_finite() && 0.0 < min_zoom && min_zoom <= max_zoom
}
