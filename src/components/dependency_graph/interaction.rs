//! Pan/zoom and node-drag gestures.
//!
//! Gestures are plain state machines fed with already-mapped events; the
//! component translates DOM pointer and wheel events into [`ZoomEvent`]s and
//! [`DragEvent`]s. Each gesture mutates one store: the zoom gesture the view
//! transform, the drag gesture the simulation's pin coordinates.

use std::fmt;

use log::debug;

use super::geometry::Point;
use crate::simulation::Simulation;

/// A gesture recogniser driving one piece of shared state.
pub trait Gesture<S> {
	type Event;

	/// Feed one event. Returns `true` when `store` changed.
	fn handle(&mut self, event: Self::Event, store: &mut S) -> bool;
}

/// Affine pan/zoom transform: `screen = world * k + (x, y)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ZoomTransform {
	pub x: f64,
	pub y: f64,
	/// Zoom factor. Unbounded; 1.0 = 100%.
	pub k: f64,
}

impl ZoomTransform {
	pub const IDENTITY: Self = Self {
		x: 0.0,
		y: 0.0,
		k: 1.0,
	};

	pub fn apply(&self, p: Point) -> Point {
		Point::new(p.x * self.k + self.x, p.y * self.k + self.y)
	}

	pub fn invert(&self, p: Point) -> Point {
		Point::new((p.x - self.x) / self.k, (p.y - self.y) / self.k)
	}

	pub fn scaled(self, k: f64) -> Self {
		Self { k, ..self }
	}

	/// Shift so that `world` lands on `screen`.
	pub fn anchored(self, screen: Point, world: Point) -> Self {
		Self {
			x: screen.x - world.x * self.k,
			y: screen.y - world.y * self.k,
			k: self.k,
		}
	}

	/// Zoom to `k`, keeping whatever is under `at` in place.
	pub fn zoom_about(self, at: Point, k: f64) -> Self {
		let world = self.invert(at);
		self.scaled(k).anchored(at, world)
	}
}

impl Default for ZoomTransform {
	fn default() -> Self {
		Self::IDENTITY
	}
}

impl fmt::Display for ZoomTransform {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "translate({},{}) scale({})", self.x, self.y, self.k)
	}
}

/// Unit of a wheel event's delta, as in `WheelEvent.deltaMode`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeltaMode {
	Pixel,
	Line,
	Page,
}

impl From<u32> for DeltaMode {
	fn from(mode: u32) -> Self {
		match mode {
			1 => DeltaMode::Line,
			2 => DeltaMode::Page,
			_ => DeltaMode::Pixel,
		}
	}
}

/// Input to [`ZoomGesture`], positions in viewBox units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ZoomEvent {
	Wheel {
		at: Point,
		delta_y: f64,
		mode: DeltaMode,
		ctrl: bool,
	},
	PanStart {
		at: Point,
	},
	PanMove {
		at: Point,
	},
	PanEnd,
	DoubleClick {
		at: Point,
		shift: bool,
	},
}

/// Wheel zoom, background-drag pan and double-click zoom.
#[derive(Clone, Debug, Default)]
pub struct ZoomGesture {
	/// World point grabbed when the pan started.
	grabbed: Option<Point>,
}

impl ZoomGesture {
	pub fn is_panning(&self) -> bool {
		self.grabbed.is_some()
	}

	/// Zoom exponent for one wheel event; `k` is multiplied by `2^delta`.
	pub fn wheel_delta(delta_y: f64, mode: DeltaMode, ctrl: bool) -> f64 {
		let unit = match mode {
			DeltaMode::Pixel => 0.002,
			DeltaMode::Line => 0.05,
			DeltaMode::Page => 1.0,
		};
		-delta_y * unit * if ctrl { 10.0 } else { 1.0 }
	}
}

impl Gesture<ZoomTransform> for ZoomGesture {
	type Event = ZoomEvent;

	fn handle(&mut self, event: ZoomEvent, transform: &mut ZoomTransform) -> bool {
		let next = match event {
			ZoomEvent::Wheel {
				at,
				delta_y,
				mode,
				ctrl,
			} => {
				let k = transform.k * 2f64.powf(Self::wheel_delta(delta_y, mode, ctrl));
				transform.zoom_about(at, k)
			}
			ZoomEvent::DoubleClick { at, shift } => {
				let k = transform.k * if shift { 0.5 } else { 2.0 };
				transform.zoom_about(at, k)
			}
			ZoomEvent::PanStart { at } => {
				self.grabbed = Some(transform.invert(at));
				return false;
			}
			ZoomEvent::PanMove { at } => match self.grabbed {
				Some(world) => transform.anchored(at, world),
				None => return false,
			},
			ZoomEvent::PanEnd => {
				self.grabbed = None;
				return false;
			}
		};
		let changed = next != *transform;
		*transform = next;
		changed
	}
}

/// Identifies one pointer across a drag.
pub type PointerId = i32;

/// Input to [`DragGesture`], positions in graph (simulation) units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DragEvent {
	Start {
		pointer: PointerId,
		node: usize,
		at: Point,
	},
	Drag {
		pointer: PointerId,
		at: Point,
	},
	End {
		pointer: PointerId,
	},
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct ActiveDrag {
	pointer: PointerId,
	node: usize,
	/// Node position minus pointer position at start.
	offset: Point,
}

/// Drag-to-pin: a node follows the pointer while dragged and is released
/// back to the forces afterwards.
///
/// The first concurrent drag reheats the layout and the last one lets it
/// cool, so multi-touch drags keep the simulation warm until every finger
/// lifts.
#[derive(Clone, Debug)]
pub struct DragGesture {
	active: Vec<ActiveDrag>,
	reheat_alpha_target: f64,
}

impl DragGesture {
	pub fn new(reheat_alpha_target: f64) -> Self {
		Self {
			active: Vec::new(),
			reheat_alpha_target,
		}
	}

	pub fn is_dragging(&self, pointer: PointerId) -> bool {
		self.active.iter().any(|d| d.pointer == pointer)
	}

	pub fn dragged_node(&self, pointer: PointerId) -> Option<usize> {
		self.active
			.iter()
			.find(|d| d.pointer == pointer)
			.map(|d| d.node)
	}
}

impl Default for DragGesture {
	fn default() -> Self {
		Self::new(0.3)
	}
}

impl Gesture<Simulation> for DragGesture {
	type Event = DragEvent;

	fn handle(&mut self, event: DragEvent, simulation: &mut Simulation) -> bool {
		match event {
			DragEvent::Start { pointer, node, at } => {
				if self.is_dragging(pointer) {
					return false;
				}
				let Some(sim_node) = simulation.node(node) else {
					return false;
				};
				let (x, y) = (sim_node.x, sim_node.y);
				if self.active.is_empty() {
					simulation.set_alpha_target(self.reheat_alpha_target);
					simulation.restart();
					debug!("drag start on node {node}: reheating layout");
				}
				if let Some(n) = simulation.node_mut(node) {
					n.pin(x, y);
				}
				self.active.push(ActiveDrag {
					pointer,
					node,
					offset: Point::new(x - at.x, y - at.y),
				});
				true
			}
			DragEvent::Drag { pointer, at } => {
				let Some(drag) = self.active.iter().find(|d| d.pointer == pointer) else {
					return false;
				};
				match simulation.node_mut(drag.node) {
					Some(n) => {
						n.pin(at.x + drag.offset.x, at.y + drag.offset.y);
						true
					}
					None => false,
				}
			}
			DragEvent::End { pointer } => {
				let Some(pos) = self.active.iter().position(|d| d.pointer == pointer) else {
					return false;
				};
				let drag = self.active.swap_remove(pos);
				if self.active.is_empty() {
					simulation.set_alpha_target(0.0);
				}
				if let Some(n) = simulation.node_mut(drag.node) {
					n.unpin();
				}
				true
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::simulation::{NodeSeed, Step};

	fn sim() -> Simulation {
		Simulation::new(vec![
			NodeSeed::new("A").at(10.0, 20.0),
			NodeSeed::new("B").at(-5.0, 0.0),
		])
	}

	#[test]
	fn transform_string_matches_svg_syntax() {
		let t = ZoomTransform { x: 12.5, y: -3.0, k: 2.0 };
		assert_eq!(t.to_string(), "translate(12.5,-3) scale(2)");
		assert_eq!(ZoomTransform::IDENTITY.to_string(), "translate(0,0) scale(1)");
	}

	#[test]
	fn invert_undoes_apply() {
		let t = ZoomTransform { x: 40.0, y: -10.0, k: 1.5 };
		let p = Point::new(3.0, 7.0);
		let back = t.invert(t.apply(p));
		assert!((back.x - p.x).abs() < 1e-12 && (back.y - p.y).abs() < 1e-12);
	}

	#[test]
	fn wheel_zoom_keeps_the_point_under_the_cursor() {
		let mut zoom = ZoomGesture::default();
		let mut t = ZoomTransform::IDENTITY;
		let at = Point::new(100.0, 50.0);
		let changed = zoom.handle(
			ZoomEvent::Wheel {
				at,
				delta_y: -500.0,
				mode: DeltaMode::Pixel,
				ctrl: false,
			},
			&mut t,
		);
		assert!(changed);
		assert!((t.k - 2.0).abs() < 1e-12);
		assert_eq!(t.apply(Point::new(100.0, 50.0)), at);
	}

	#[test]
	fn wheel_units_follow_delta_mode() {
		assert_eq!(ZoomGesture::wheel_delta(100.0, DeltaMode::Pixel, false), -0.2);
		assert_eq!(ZoomGesture::wheel_delta(2.0, DeltaMode::Line, false), -0.1);
		assert_eq!(ZoomGesture::wheel_delta(1.0, DeltaMode::Page, true), -10.0);
		assert_eq!(DeltaMode::from(1), DeltaMode::Line);
	}

	#[test]
	fn zoom_is_unbounded() {
		let mut zoom = ZoomGesture::default();
		let mut t = ZoomTransform::IDENTITY;
		for _ in 0..40 {
			zoom.handle(
				ZoomEvent::DoubleClick {
					at: Point::default(),
					shift: false,
				},
				&mut t,
			);
		}
		assert_eq!(t.k, 2f64.powi(40));
	}

	#[test]
	fn pan_drags_the_grabbed_point_along() {
		let mut zoom = ZoomGesture::default();
		let mut t = ZoomTransform { x: 0.0, y: 0.0, k: 2.0 };
		assert!(!zoom.handle(ZoomEvent::PanStart { at: Point::new(10.0, 10.0) }, &mut t));
		assert!(zoom.is_panning());
		assert!(zoom.handle(ZoomEvent::PanMove { at: Point::new(30.0, 5.0) }, &mut t));
		assert_eq!(t, ZoomTransform { x: 20.0, y: -5.0, k: 2.0 });
		zoom.handle(ZoomEvent::PanEnd, &mut t);
		assert!(!zoom.handle(ZoomEvent::PanMove { at: Point::new(99.0, 99.0) }, &mut t));
	}

	#[test]
	fn pins_exist_only_between_start_and_end() {
		let mut sim = sim();
		let mut drag = DragGesture::default();
		assert!(!sim.nodes()[0].is_pinned());

		drag.handle(DragEvent::Start { pointer: 1, node: 0, at: Point::new(12.0, 18.0) }, &mut sim);
		assert_eq!((sim.nodes()[0].fx, sim.nodes()[0].fy), (Some(10.0), Some(20.0)));

		drag.handle(DragEvent::Drag { pointer: 1, at: Point::new(52.0, -2.0) }, &mut sim);
		// The grab offset (-2, +2) is preserved.
		assert_eq!((sim.nodes()[0].fx, sim.nodes()[0].fy), (Some(50.0), Some(0.0)));

		drag.handle(DragEvent::End { pointer: 1 }, &mut sim);
		assert_eq!((sim.nodes()[0].fx, sim.nodes()[0].fy), (None, None));
		assert!(!drag.is_dragging(1));
	}

	#[test]
	fn drag_reheats_then_releases_the_layout() {
		let mut sim = sim();
		while sim.step() != Step::End {}

		let mut drag = DragGesture::default();
		drag.handle(DragEvent::Start { pointer: 1, node: 1, at: Point::new(-5.0, 0.0) }, &mut sim);
		assert!(sim.is_running());
		assert_eq!(sim.alpha_target(), 0.3);

		drag.handle(DragEvent::End { pointer: 1 }, &mut sim);
		assert_eq!(sim.alpha_target(), 0.0);
	}

	#[test]
	fn concurrent_drags_cool_only_after_the_last_release() {
		let mut sim = sim();
		let mut drag = DragGesture::default();
		drag.handle(DragEvent::Start { pointer: 1, node: 0, at: Point::default() }, &mut sim);
		drag.handle(DragEvent::Start { pointer: 2, node: 1, at: Point::default() }, &mut sim);

		drag.handle(DragEvent::End { pointer: 1 }, &mut sim);
		assert_eq!(sim.alpha_target(), 0.3);
		assert!(!sim.nodes()[0].is_pinned());
		assert!(sim.nodes()[1].is_pinned());

		drag.handle(DragEvent::End { pointer: 2 }, &mut sim);
		assert_eq!(sim.alpha_target(), 0.0);
	}

	#[test]
	fn events_for_unknown_pointers_or_nodes_are_ignored() {
		let mut sim = sim();
		let mut drag = DragGesture::default();
		assert!(!drag.handle(DragEvent::Drag { pointer: 9, at: Point::default() }, &mut sim));
		assert!(!drag.handle(DragEvent::End { pointer: 9 }, &mut sim));
		assert!(!drag.handle(DragEvent::Start { pointer: 1, node: 42, at: Point::default() }, &mut sim));
		assert_eq!(sim.alpha_target(), 0.0);
	}
}
