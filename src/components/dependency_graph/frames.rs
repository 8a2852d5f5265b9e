//! `requestAnimationFrame` loop stepping the simulation.
//!
//! The loop re-arms itself only while the simulation keeps ticking. Once the
//! layout settles no further frames are requested until something calls
//! [`FrameWaker::wake`], which the drag handler does after reheating.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use log::{debug, error};
use wasm_bindgen::prelude::*;

use super::render::SceneSignals;
use super::state::GraphState;
use crate::error::{GraphError, Result};
use crate::simulation::Step;

struct Frames {
	/// Id of the pending animation frame, if one is requested.
	request: Cell<Option<i32>>,
	callback: RefCell<Option<Closure<dyn FnMut()>>>,
}

impl Frames {
	fn request(&self) -> Result<()> {
		if self.request.get().is_some() {
			return Ok(());
		}
		let callback = self.callback.borrow();
		let Some(cb) = callback.as_ref() else {
			return Ok(());
		};
		let window = web_sys::window().ok_or_else(|| GraphError::Dom("no window".into()))?;
		let id = window
			.request_animation_frame(cb.as_ref().unchecked_ref())
			.map_err(GraphError::dom)?;
		self.request.set(Some(id));
		Ok(())
	}
}

/// Handle that resumes a paused [`FrameLoop`].
#[derive(Clone)]
pub struct FrameWaker(Rc<Frames>);

impl FrameWaker {
	/// Request a frame unless one is already pending or the loop is gone.
	pub fn wake(&self) {
		if let Err(err) = self.0.request() {
			error!("dependency-graph: {err}");
		}
	}
}

/// Steps the simulation once per animation frame and pushes positions into
/// the scene signals. Cancelled on drop.
pub struct FrameLoop {
	frames: Rc<Frames>,
}

impl FrameLoop {
	pub fn start(state: Rc<RefCell<GraphState>>, signals: SceneSignals) -> Result<Self> {
		let frames = Rc::new(Frames {
			request: Cell::new(None),
			callback: RefCell::new(None),
		});

		let inner = frames.clone();
		*frames.callback.borrow_mut() = Some(Closure::new(move || {
			inner.request.set(None);
			let step = state.borrow_mut().step();
			if step == Step::Idle {
				return;
			}
			let s = state.borrow();
			signals.sync_positions(s.simulation());
			match step {
				Step::Tick => {
					if let Err(err) = inner.request() {
						error!("dependency-graph: {err}");
					}
				}
				_ => debug!(
					"dependency-graph: layout settled after {} ticks, pausing frames",
					s.simulation().ticks()
				),
			}
		}));

		frames.request()?;
		Ok(Self { frames })
	}

	pub fn waker(&self) -> FrameWaker {
		FrameWaker(self.frames.clone())
	}

	/// Whether an animation frame is pending.
	pub fn is_running(&self) -> bool {
		self.frames.request.get().is_some()
	}
}

impl Drop for FrameLoop {
	fn drop(&mut self) {
		if let (Some(id), Some(window)) = (self.frames.request.take(), web_sys::window()) {
			let _ = window.cancel_animation_frame(id);
		}
		// Breaks the closure's reference to the loop; wakers become no-ops.
		self.frames.callback.borrow_mut().take();
	}
}
