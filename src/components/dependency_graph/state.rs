//! Mutable state shared by the frame loop and the event handlers.

use super::geometry::{ClientRect, Point, ViewBox};
use super::interaction::{DragEvent, DragGesture, Gesture, PointerId, ZoomEvent, ZoomGesture, ZoomTransform};
use super::layout::LayoutConfig;
use crate::simulation::{Simulation, Step};

/// Simulation plus the interaction state layered over it.
///
/// Lives behind one `Rc<RefCell<_>>` per mounted scene. Holds no reactive
/// handles, so everything here can be driven without a browser.
pub struct GraphState {
	simulation: Simulation,
	transform: ZoomTransform,
	zoom: ZoomGesture,
	drag: DragGesture,
	view_box: ViewBox,
}

impl GraphState {
	pub fn new(simulation: Simulation, view_box: ViewBox, config: &LayoutConfig) -> Self {
		Self {
			simulation,
			transform: ZoomTransform::IDENTITY,
			zoom: ZoomGesture::default(),
			drag: DragGesture::new(config.reheat_alpha_target),
			view_box,
		}
	}

	pub fn simulation(&self) -> &Simulation {
		&self.simulation
	}

	pub fn transform(&self) -> ZoomTransform {
		self.transform
	}

	pub fn view_box(&self) -> ViewBox {
		self.view_box
	}

	/// Client pixels to viewBox units, the space the zoom transform acts in.
	pub fn to_view(&self, rect: ClientRect, client: Point) -> Point {
		rect.to_view(&self.view_box, client)
	}

	/// Client pixels to simulation coordinates under the current zoom.
	pub fn to_graph(&self, rect: ClientRect, client: Point) -> Point {
		self.transform.invert(self.to_view(rect, client))
	}

	/// Advance the layout by one frame.
	pub fn step(&mut self) -> Step {
		self.simulation.step()
	}

	pub fn drag(&mut self, event: DragEvent) -> bool {
		self.drag.handle(event, &mut self.simulation)
	}

	pub fn zoom(&mut self, event: ZoomEvent) -> bool {
		self.zoom.handle(event, &mut self.transform)
	}

	pub fn is_dragging(&self, pointer: PointerId) -> bool {
		self.drag.is_dragging(pointer)
	}

	pub fn is_panning(&self) -> bool {
		self.zoom.is_panning()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::dependency_graph::types::GraphData;
	use crate::components::dependency_graph::layout::build_simulation;

	fn state() -> GraphState {
		let data = GraphData::from_json(
			r#"{"nodes":[{"id":"A","x":0,"y":0},{"id":"B","x":40,"y":0}],
			    "links":[{"source":"A","target":"B","value":1}]}"#,
		)
		.unwrap();
		let config = LayoutConfig::default();
		let sim = build_simulation(&data, &config).unwrap();
		GraphState::new(sim, ViewBox::centered(800.0, 600.0), &config)
	}

	const RECT: ClientRect = ClientRect {
		left: 0.0,
		top: 0.0,
		width: 800.0,
		height: 600.0,
	};

	#[test]
	fn client_points_map_through_the_zoom() {
		let mut state = state();
		assert_eq!(state.to_graph(RECT, Point::new(400.0, 300.0)), Point::new(0.0, 0.0));

		state.zoom(ZoomEvent::DoubleClick {
			at: Point::new(0.0, 0.0),
			shift: false,
		});
		assert_eq!(state.transform().k, 2.0);
		assert_eq!(state.to_view(RECT, Point::new(500.0, 300.0)), Point::new(100.0, 0.0));
		assert_eq!(state.to_graph(RECT, Point::new(500.0, 300.0)), Point::new(50.0, 0.0));
	}

	#[test]
	fn dragging_pins_the_node_until_release() {
		let mut state = state();
		let at = state.to_graph(RECT, Point::new(440.0, 300.0));
		assert!(state.drag(DragEvent::Start { pointer: 7, node: 1, at }));
		assert!(state.is_dragging(7));

		state.drag(DragEvent::Drag {
			pointer: 7,
			at: Point::new(100.0, 50.0),
		});
		state.step();
		let b = &state.simulation().nodes()[1];
		assert_eq!((b.x, b.y), (100.0, 50.0));

		state.drag(DragEvent::End { pointer: 7 });
		assert!(!state.simulation().nodes()[1].is_pinned());
		assert!(!state.is_dragging(7));
	}

	#[test]
	fn pan_only_moves_the_view() {
		let mut state = state();
		let before = state.simulation().nodes()[0].clone();
		state.zoom(ZoomEvent::PanStart { at: Point::new(0.0, 0.0) });
		assert!(state.is_panning());
		state.zoom(ZoomEvent::PanMove { at: Point::new(15.0, -5.0) });
		state.zoom(ZoomEvent::PanEnd);
		assert_eq!(state.transform(), ZoomTransform { x: 15.0, y: -5.0, k: 1.0 });
		assert_eq!(state.simulation().nodes()[0], before);
	}
}
