//! Scene description and tick-driven redraw.
//!
//! [`SceneModel`] is the static part of the scene, computed once per render:
//! one [`LinkShape`] per link and one [`NodeShape`] per node, in payload
//! order. [`SceneSignals`] is the moving part: one position signal per node
//! plus the zoom transform. The view reads both; the frame loop rewrites every
//! position signal after each simulation tick.

use leptos::prelude::*;

use super::geometry::{Point, ViewBox};
use super::interaction::ZoomTransform;
use super::theme::Theme;
use super::types::GraphData;
use crate::simulation::{LinkForce, Simulation};

/// A link line bound to its resolved endpoints.
#[derive(Clone, Debug, PartialEq)]
pub struct LinkShape {
	pub source: usize,
	pub target: usize,
	pub stroke_width: f64,
}

/// A node group: circle filled with the node's group, plus its id as label.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeShape {
	pub id: String,
	pub fill: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SceneModel {
	pub width: f64,
	pub height: f64,
	pub view_box: ViewBox,
	pub theme: Theme,
	pub links: Vec<LinkShape>,
	pub nodes: Vec<NodeShape>,
}

impl SceneModel {
	/// Describe the scene for `data` laid out by `simulation`.
	///
	/// Link endpoints come from the simulation's `link` force, which resolved
	/// every link of `data` (or failed to initialize), so the two line up
	/// one-to-one.
	pub fn new(data: &GraphData, simulation: &Simulation, width: f64, height: f64) -> Self {
		let resolved = simulation
			.force::<LinkForce>("link")
			.map(LinkForce::links)
			.unwrap_or_default();
		debug_assert_eq!(resolved.len(), data.links.len());

		let links = data
			.links
			.iter()
			.zip(resolved)
			.map(|(link, r)| LinkShape {
				source: r.source,
				target: r.target,
				stroke_width: link.value.sqrt(),
			})
			.collect();
		let nodes = data
			.nodes
			.iter()
			.map(|n| NodeShape {
				id: n.id.clone(),
				fill: n.group.as_ref().map(ToString::to_string),
			})
			.collect();

		Self {
			width,
			height,
			view_box: ViewBox::centered(width, height),
			theme: Theme::default(),
			links,
			nodes,
		}
	}
}

/// `transform` attribute of a node group.
pub fn translate(p: Point) -> String {
	format!("translate({}, {})", p.x, p.y)
}

/// Reactive state read by the scene view.
#[derive(Clone, Debug)]
pub struct SceneSignals {
	pub positions: Vec<RwSignal<Point>>,
	pub transform: RwSignal<ZoomTransform>,
}

impl SceneSignals {
	/// Create signals seeded from the simulation's current positions. Call
	/// inside the reactive owner that should dispose them.
	pub fn new(simulation: &Simulation) -> Self {
		Self {
			positions: simulation
				.nodes()
				.iter()
				.map(|n| RwSignal::new(Point::new(n.x, n.y)))
				.collect(),
			transform: RwSignal::new(ZoomTransform::IDENTITY),
		}
	}

	/// Redraw: push every node's current position.
	pub fn sync_positions(&self, simulation: &Simulation) {
		for (signal, node) in self.positions.iter().zip(simulation.nodes()) {
			signal.set(Point::new(node.x, node.y));
		}
	}
}
