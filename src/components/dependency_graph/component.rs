//! Leptos view of the graph scene.
//!
//! The view is an `svg` holding one zoom group, which in turn holds the link
//! lines and the node groups. Geometry attributes read the scene signals, so
//! the frame loop only has to update signals. Pointer, wheel and dblclick
//! handlers translate DOM events into gesture events on the shared
//! [`GraphState`].

use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Element, Event, MouseEvent, PointerEvent, WheelEvent};

use super::frames::FrameWaker;
use super::geometry::{ClientRect, Point};
use super::interaction::{DeltaMode, DragEvent, ZoomEvent};
use super::render::{SceneModel, SceneSignals, translate};
use super::state::GraphState;

/// The `svg` element an event was dispatched within.
fn event_svg(ev: &Event) -> Option<Element> {
	let target: Element = ev.current_target()?.dyn_into().ok()?;
	target.closest("svg").ok()?
}

fn client_rect(svg: &Element) -> ClientRect {
	let rect = svg.get_bounding_client_rect();
	ClientRect {
		left: rect.left(),
		top: rect.top(),
		width: rect.width(),
		height: rect.height(),
	}
}

fn client_point(ev: &MouseEvent) -> Point {
	Point::new(ev.client_x() as f64, ev.client_y() as f64)
}

/// Primary button without ctrl; everything else is left to the browser.
fn is_primary(ev: &MouseEvent) -> bool {
	ev.button() == 0 && !ev.ctrl_key()
}

/// Whether the event started on a node group rather than the background.
fn from_node(ev: &Event) -> bool {
	ev.target()
		.and_then(|t| t.dyn_into::<Element>().ok())
		.and_then(|el| el.closest("g.node").ok().flatten())
		.is_some()
}

/// Renders the scene for `model` and wires interaction into `state`. `frames`
/// resumes the frame loop when a drag reheats a settled layout.
#[component]
pub fn GraphScene(
	model: SceneModel,
	signals: SceneSignals,
	state: Rc<RefCell<GraphState>>,
	frames: FrameWaker,
) -> impl IntoView {
	let SceneModel {
		width,
		height,
		view_box,
		theme,
		links,
		nodes,
	} = model;
	let transform = signals.transform;

	let state_wheel = state.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some(svg) = event_svg(&ev) else {
			return;
		};
		let mut s = state_wheel.borrow_mut();
		let at = s.to_view(client_rect(&svg), client_point(&ev));
		let changed = s.zoom(ZoomEvent::Wheel {
			at,
			delta_y: ev.delta_y(),
			mode: DeltaMode::from(ev.delta_mode()),
			ctrl: ev.ctrl_key(),
		});
		if changed {
			transform.set(s.transform());
		}
	};

	let state_down = state.clone();
	let on_pointerdown = move |ev: PointerEvent| {
		if !is_primary(&ev) || from_node(&ev) {
			return;
		}
		let Some(svg) = event_svg(&ev) else {
			return;
		};
		let _ = svg.set_pointer_capture(ev.pointer_id());
		let mut s = state_down.borrow_mut();
		let at = s.to_view(client_rect(&svg), client_point(&ev));
		s.zoom(ZoomEvent::PanStart { at });
	};

	let state_move = state.clone();
	let on_pointermove = move |ev: PointerEvent| {
		let Some(svg) = event_svg(&ev) else {
			return;
		};
		let rect = client_rect(&svg);
		let mut s = state_move.borrow_mut();
		let pointer = ev.pointer_id();
		if s.is_dragging(pointer) {
			let at = s.to_graph(rect, client_point(&ev));
			s.drag(DragEvent::Drag { pointer, at });
		} else if s.is_panning() {
			let at = s.to_view(rect, client_point(&ev));
			if s.zoom(ZoomEvent::PanMove { at }) {
				transform.set(s.transform());
			}
		}
	};

	let state_up = state.clone();
	let on_pointerup = move |ev: PointerEvent| {
		let mut s = state_up.borrow_mut();
		let pointer = ev.pointer_id();
		if !s.drag(DragEvent::End { pointer }) {
			s.zoom(ZoomEvent::PanEnd);
		}
	};
	let on_pointercancel = on_pointerup.clone();

	let state_dbl = state.clone();
	let on_dblclick = move |ev: MouseEvent| {
		let Some(svg) = event_svg(&ev) else {
			return;
		};
		let mut s = state_dbl.borrow_mut();
		let at = s.to_view(client_rect(&svg), client_point(&ev));
		if s.zoom(ZoomEvent::DoubleClick { at, shift: ev.shift_key() }) {
			transform.set(s.transform());
		}
	};

	let lines = links
		.into_iter()
		.map(|link| {
			let (source, target) = (signals.positions[link.source], signals.positions[link.target]);
			view! {
				<line
					stroke-width=link.stroke_width.to_string()
					x1=move || source.get().x.to_string()
					y1=move || source.get().y.to_string()
					x2=move || target.get().x.to_string()
					y2=move || target.get().y.to_string()
				/>
			}
		})
		.collect_view();

	let label_style = theme.label_style();
	let node_groups = nodes
		.into_iter()
		.enumerate()
		.map(|(index, node)| {
			let position = signals.positions[index];
			let (state_node, frames_node) = (state.clone(), frames.clone());
			let on_node_down = move |ev: PointerEvent| {
				if !is_primary(&ev) {
					return;
				}
				ev.stop_propagation();
				let Some(svg) = event_svg(&ev) else {
					return;
				};
				let _ = svg.set_pointer_capture(ev.pointer_id());
				let started = {
					let mut s = state_node.borrow_mut();
					let at = s.to_graph(client_rect(&svg), client_point(&ev));
					s.drag(DragEvent::Start {
						pointer: ev.pointer_id(),
						node: index,
						at,
					})
				};
				if started {
					frames_node.wake();
				}
			};
			view! {
				<g
					class="node"
					style=theme.node_style
					transform=move || translate(position.get())
					on:pointerdown=on_node_down
				>
					<circle r=theme.node_radius.to_string() fill=node.fill />
					<text
						x=theme.label_dx.to_string()
						y=theme.label_dy.to_string()
						style=label_style.clone()
					>
						{node.id}
					</text>
				</g>
			}
		})
		.collect_view();

	view! {
		<svg
			width=width.to_string()
			height=height.to_string()
			viewBox=view_box.to_string()
			style=theme.svg_style
			on:wheel=on_wheel
			on:pointerdown=on_pointerdown
			on:pointermove=on_pointermove
			on:pointerup=on_pointerup
			on:pointercancel=on_pointercancel
			on:dblclick=on_dblclick
		>
			<g transform=move || transform.get().to_string()>
				<g stroke=theme.link_stroke stroke-opacity=theme.link_stroke_opacity.to_string()>
					{lines}
				</g>
				<g>{node_groups}</g>
			</g>
		</svg>
	}
}
