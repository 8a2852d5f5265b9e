//! dependency-graph: force-directed dependency graph as a browser custom element.
//!
//! This crate provides a WASM custom element that renders a node-link graph as
//! SVG, positioned by a force simulation, with pan/zoom and drag-to-pin.

use log::{Level, info};

pub mod components;
pub mod error;
pub mod simulation;

pub use components::dependency_graph::{GraphData, GraphLink, GraphNode, GraphView, LayoutConfig, define_graph_view};
pub use error::GraphError;
pub use simulation::Simulation;

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("dependency-graph: logging initialized");
}
