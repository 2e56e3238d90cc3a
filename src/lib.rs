//! digraph-editor: Interactive node-and-edge diagram editor.
//!
//! This crate provides a WASM-based editor component that draws a directed
//! graph into an SVG canvas with pan/zoom, node dragging, drag-to-connect,
//! edge re-targeting and keyboard deletion.

use std::rc::Rc;

use leptos::prelude::*;
use leptos_meta::*;
use log::{Level, info, warn};
use wasm_bindgen::JsCast;
use web_sys::{HtmlScriptElement, Window};

pub mod components;

pub use components::graph_view::{
	Edge, GraphConfig, GraphData, GraphIntent, GraphView, IntentHandler, Node, NodeKey, Selection,
};

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("digraph-editor: logging initialized");
}

/// Text content of the `<script>` element with the given id.
fn script_text(id: &str) -> Option<String> {
	let window: Window = web_sys::window()?;
	let document = window.document()?;
	let element = document.get_element_by_id(id)?;
	let script: HtmlScriptElement = element.dyn_into().ok()?;
	script.text().ok()
}

/// Load editor configuration from a script element with id="graph-config".
/// Any subset of fields may be given; the rest keep their defaults.
fn load_config() -> GraphConfig {
	let Some(json_text) = script_text("graph-config") else {
		return GraphConfig::default();
	};
	match GraphConfig::from_json(&json_text) {
		Ok(config) => config,
		Err(e) => {
			warn!("digraph-editor: failed to parse config: {}", e);
			GraphConfig::default()
		}
	}
}

/// Load graph data from a script element with id="graph-data".
/// Expected format: JSON with { nodes: [...], edges: [...] }, each node
/// carrying its identity under `config.node_key`.
fn load_graph_data(config: &GraphConfig) -> Option<GraphData> {
	let json_text = script_text("graph-data")?;
	match GraphData::from_json(&json_text, &config.node_key) {
		Ok(data) => {
			info!(
				"digraph-editor: loaded {} nodes, {} edges",
				data.nodes.len(),
				data.edges.len()
			);
			Some(data)
		}
		Err(e) => {
			warn!("digraph-editor: failed to parse graph data: {}", e);
			None
		}
	}
}

/// Three connected nodes shown when the page embeds no data.
pub fn sample_data() -> GraphData {
	GraphData {
		nodes: vec![
			Node::new(1, "Node A", 258.3976135253906, 331.9783248901367, "special"),
			Node::new(2, "Node B", 593.9393920898438, 260.6060791015625, "empty")
				.with_subtype("specialChild"),
			Node::new(3, "Node C", 237.5757598876953, 61.81818389892578, "empty"),
		],
		edges: vec![Edge::new(1, 2, "specialEdge"), Edge::new(2, 3, "specialEdge")],
	}
}

/// Main application component.
/// Loads configuration and graph data from the DOM and renders the editor.
#[component]
pub fn App() -> impl IntoView {
	provide_meta_context();

	let config = load_config();
	let graph_data = load_graph_data(&config).unwrap_or_else(sample_data);
	let graph_signal = Signal::derive(move || graph_data.clone());
	let on_intent: IntentHandler = Rc::new(|intent: GraphIntent| info!("digraph-editor: {:?}", intent));

	view! {
		<Html attr:lang="en" attr:dir="ltr" />
		<Title text="Diagram Editor" />
		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<div class="fullscreen-graph">
			<GraphView data=graph_signal config=config on_intent=on_intent fullscreen=true />
			<div class="graph-overlay">
				<h1>"Diagram Editor"</h1>
				<p class="subtitle">
					"Shift-click to add a node. Shift-drag between nodes to connect. Drag an arrowhead to re-target. Delete removes the selection."
				</p>
			</div>
		</div>
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn sample_data_is_consistent() {
		let data = sample_data();
		assert_eq!(data.nodes.len(), 3);
		for edge in &data.edges {
			assert!(data.nodes.iter().any(|n| n.key == edge.source));
			assert!(data.nodes.iter().any(|n| n.key == edge.target));
		}
	}
}
