//! Interactive node/edge diagram editor.
//!
//! Draws a directed graph in an SVG canvas with:
//! - Pan (background drag) and zoom (wheel, slider, animated zoom-to-fit)
//! - Node dragging, shift-click to create a node, shift-drag to connect nodes
//! - Dragging an edge's arrowhead onto another node to re-target it
//! - Delete/Backspace to remove the selection, subject to host permissions
//! - Keyed enter/update/exit rendering with fade transitions
//!
//! # Example
//!
//! ```ignore
//! use digraph_editor::components::graph_view::{GraphData, GraphView, Node, Edge};
//!
//! let data = GraphData {
//!     nodes: vec![
//!         Node::new(1, "Node A", 0.0, 0.0, "special"),
//!         Node::new(2, "Node B", 300.0, 0.0, "empty"),
//!     ],
//!     edges: vec![Edge::new(1, 2, "specialEdge")],
//! };
//!
//! view! { <GraphView data=Signal::stored(data) fullscreen=true /> }
//! ```

mod component;
pub mod config;
mod controls;
pub mod editor;
pub mod error;
pub mod geometry;
pub mod input;
pub mod interaction;
pub mod model;
pub mod policy;
pub mod render;
mod svg;
pub mod theme;
pub mod types;
pub mod viewport;

pub use component::{GraphView, IntentHandler};
pub use config::GraphConfig;
pub use policy::{GraphPolicy, Permissive, Predicates};
pub use theme::GraphTheme;
pub use types::{Edge, EdgeKey, GraphData, GraphIntent, Node, NodeKey, Selection};
