//! The `<dependency-graph>` custom element.
//!
//! A small JS class forwards `connectedCallback`/`disconnectedCallback` to
//! Rust. Each connected element gets a [`GraphView`] in a thread-local
//! registry; disconnecting drops it, which stops its frame loop, unmounts its
//! scene and disconnects its payload observer.

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use js_sys::Array;
use leptos::mount::mount_to;
use leptos::prelude::*;
use log::{debug, error, info};
use wasm_bindgen::prelude::*;
use web_sys::{Element, HtmlElement, HtmlScriptElement, MutationObserver, MutationObserverInit, MutationRecord, Node, NodeList};

use super::component::GraphScene;
use super::frames::FrameLoop;
use super::interaction::ZoomTransform;
use super::layout::{LayoutConfig, build_simulation};
use super::render::{SceneModel, SceneSignals};
use super::state::GraphState;
use super::types::GraphData;
use crate::error::{GraphError, Result};

/// Tag used when [`define_graph_view`] is called without one.
pub const DEFAULT_TAG: &str = "dependency-graph";

/// Boolean attribute that turns on re-rendering when the payload changes.
pub const LIVE_ATTRIBUTE: &str = "live";

const PAYLOAD_SELECTOR: &str = r#"script[type="application/json"]"#;

#[wasm_bindgen(inline_js = r#"
export function defineGraphViewElement(tag, connected, disconnected) {
	if (customElements.get(tag)) {
		return false;
	}
	customElements.define(tag, class extends HTMLElement {
		connectedCallback() {
			connected(this);
		}
		disconnectedCallback() {
			disconnected(this);
		}
	});
	return true;
}
"#)]
extern "C" {
	#[wasm_bindgen(js_name = defineGraphViewElement, catch)]
	fn define_element(
		tag: &str,
		connected: &Closure<dyn FnMut(HtmlElement) -> Result<(), JsValue>>,
		disconnected: &Closure<dyn FnMut(HtmlElement)>,
	) -> Result<bool, JsValue>;
}

thread_local! {
	static VIEWS: RefCell<Vec<GraphView>> = const { RefCell::new(Vec::new()) };
}

/// Register the graph element under `tag` (default `dependency-graph`).
///
/// Returns `false` when the tag is already defined.
#[wasm_bindgen(js_name = defineGraphView)]
pub fn define_graph_view(tag: Option<String>) -> Result<bool, JsValue> {
	let tag = tag.unwrap_or_else(|| DEFAULT_TAG.to_string());
	let connected = Closure::<dyn FnMut(HtmlElement) -> Result<(), JsValue>>::new(|host: HtmlElement| {
		attach(host).map_err(report)
	});
	let disconnected = Closure::<dyn FnMut(HtmlElement)>::new(detach);

	let defined = define_element(&tag, &connected, &disconnected)?;
	if defined {
		// The element class calls these for as long as the page lives.
		connected.forget();
		disconnected.forget();
		info!("dependency-graph: defined <{tag}>");
	} else {
		debug!("dependency-graph: <{tag}> already defined");
	}
	Ok(defined)
}

/// Run `f` against the view mounted on `host`, if any.
pub fn with_view<R>(host: &HtmlElement, f: impl FnOnce(&GraphView) -> R) -> Option<R> {
	VIEWS.with_borrow(|views| views.iter().find(|v| v.host == *host).map(f))
}

fn report(err: GraphError) -> JsValue {
	error!("dependency-graph: {err}");
	err.into()
}

fn attach(host: HtmlElement) -> Result<()> {
	detach(host.clone());
	let mut view = GraphView::new(host);
	view.render()?;
	if view.host.has_attribute(LIVE_ATTRIBUTE) {
		view.watch()?;
	}
	VIEWS.with_borrow_mut(|views| views.push(view));
	Ok(())
}

fn detach(host: HtmlElement) {
	let removed = VIEWS.with_borrow_mut(|views| {
		views
			.iter()
			.position(|v| v.host == host)
			.map(|i| views.swap_remove(i))
	});
	if removed.is_some() {
		debug!("dependency-graph: detached, scene stopped");
	}
}

fn rerender(host: &HtmlElement) {
	VIEWS.with_borrow_mut(|views| {
		let Some(view) = views.iter_mut().find(|v| v.host == *host) else {
			return;
		};
		debug!("dependency-graph: payload changed, re-rendering");
		if let Err(err) = view.render() {
			error!("dependency-graph: {err}");
		}
	});
}

/// Read and parse the JSON payload script inside `host`.
pub fn load_graph_data(host: &Element) -> Result<GraphData> {
	let script: HtmlScriptElement = host
		.query_selector(PAYLOAD_SELECTOR)
		.map_err(GraphError::dom)?
		.ok_or(GraphError::MissingPayload)?
		.dyn_into()
		.map_err(|_| GraphError::MissingPayload)?;
	let text = script.text().map_err(GraphError::dom)?;
	GraphData::from_json(&text)
}

fn viewport_size() -> Result<(f64, f64)> {
	let window = web_sys::window().ok_or_else(|| GraphError::Dom("no window".into()))?;
	let dimension = |value: std::result::Result<JsValue, JsValue>| {
		value
			.map_err(GraphError::dom)?
			.as_f64()
			.ok_or_else(|| GraphError::Dom("viewport size is not a number".into()))
	};
	Ok((dimension(window.inner_width())?, dimension(window.inner_height())?))
}

/// Remove every `svg` inside `host`, including ones left behind by earlier
/// renders.
fn remove_stale_scenes(host: &Element) -> Result<()> {
	let stale = host.query_selector_all("svg").map_err(GraphError::dom)?;
	for node in nodes(stale) {
		if let Ok(svg) = node.dyn_into::<Element>() {
			svg.remove();
		}
	}
	Ok(())
}

fn nodes(list: NodeList) -> impl Iterator<Item = Node> {
	(0..list.length()).filter_map(move |i| list.item(i))
}

/// One element's rendered graph.
pub struct GraphView {
	host: HtmlElement,
	scene: Option<MountedScene>,
	observer: Option<PayloadObserver>,
}

impl GraphView {
	pub fn new(host: HtmlElement) -> Self {
		Self {
			host,
			scene: None,
			observer: None,
		}
	}

	pub fn host(&self) -> &HtmlElement {
		&self.host
	}

	/// Replace whatever was rendered before with a fresh scene built from the
	/// current payload. On error nothing is left mounted.
	pub fn render(&mut self) -> Result<()> {
		self.scene = None;
		remove_stale_scenes(&self.host)?;

		let data = load_graph_data(&self.host)?;
		let (width, height) = viewport_size()?;
		let config = LayoutConfig::default().with_overrides(|name| self.host.get_attribute(name));
		let simulation = build_simulation(&data, &config)?;
		let model = SceneModel::new(&data, &simulation, width, height);
		info!(
			"dependency-graph: rendering {} nodes, {} links",
			data.nodes.len(),
			data.links.len()
		);

		let state = GraphState::new(simulation, model.view_box, &config);
		self.scene = Some(MountedScene::mount(self.host.clone(), model, state)?);
		Ok(())
	}

	/// Re-render whenever the payload script changes.
	pub fn watch(&mut self) -> Result<()> {
		if self.observer.is_none() {
			self.observer = Some(PayloadObserver::observe(&self.host)?);
		}
		Ok(())
	}

	pub fn is_mounted(&self) -> bool {
		self.scene.is_some()
	}

	/// Whether the frame loop has an animation frame pending. False once the
	/// layout has settled.
	pub fn is_animating(&self) -> bool {
		self.scene.as_ref().is_some_and(|scene| scene.frames.is_running())
	}

	/// Current pan/zoom transform of the mounted scene.
	pub fn transform(&self) -> Option<ZoomTransform> {
		self.with_state(GraphState::transform)
	}

	pub fn with_state<R>(&self, f: impl FnOnce(&GraphState) -> R) -> Option<R> {
		self.scene.as_ref().map(|scene| f(&scene.state.borrow()))
	}
}

/// A mounted scene and everything keeping it alive. Field order is drop
/// order: the frame loop stops before the view is unmounted.
struct MountedScene {
	frames: FrameLoop,
	state: Rc<RefCell<GraphState>>,
	_mount: Box<dyn Any>,
	_owner: Owner,
}

impl MountedScene {
	fn mount(host: HtmlElement, model: SceneModel, state: GraphState) -> Result<Self> {
		let owner = Owner::new();
		let state = Rc::new(RefCell::new(state));
		let (frames, mount) = owner.with(|| -> Result<_> {
			let signals = SceneSignals::new(state.borrow().simulation());
			let frames = FrameLoop::start(state.clone(), signals.clone())?;
			let (waker, scene_state) = (frames.waker(), state.clone());
			let mount = mount_to(host, move || {
				view! { <GraphScene model=model signals=signals state=scene_state frames=waker /> }
			});
			Ok((frames, mount))
		})?;
		Ok(Self {
			frames,
			state,
			_mount: Box::new(mount),
			_owner: owner,
		})
	}
}


/// Watches a host's payload script and re-renders its view on change.
struct PayloadObserver {
	observer: MutationObserver,
	_callback: Closure<dyn FnMut(Array, MutationObserver)>,
}

impl PayloadObserver {
	fn observe(host: &HtmlElement) -> Result<Self> {
		let target = host.clone();
		let callback = Closure::<dyn FnMut(Array, MutationObserver)>::new(move |records: Array, _: MutationObserver| {
			let changed = records
				.iter()
				.filter_map(|r| r.dyn_into::<MutationRecord>().ok())
				.any(|r| touches_payload(&r));
			if changed {
				rerender(&target);
			}
		});
		let observer = MutationObserver::new(callback.as_ref().unchecked_ref()).map_err(GraphError::dom)?;

		let options = MutationObserverInit::new();
		options.set_child_list(true);
		options.set_subtree(true);
		options.set_character_data(true);
		observer
			.observe_with_options(host, &options)
			.map_err(GraphError::dom)?;
		Ok(Self {
			observer,
			_callback: callback,
		})
	}
}

impl Drop for PayloadObserver {
	fn drop(&mut self) {
		self.observer.disconnect();
	}
}

/// Whether a mutation added, removed or edited the payload script. The
/// scene's own DOM updates never match.
fn touches_payload(record: &MutationRecord) -> bool {
	let in_payload = |node: Node| {
		let element = match node.dyn_into::<Element>() {
			Ok(element) => Some(element),
			Err(node) => node.parent_element(),
		};
		element
			.and_then(|el| el.closest(PAYLOAD_SELECTOR).ok().flatten())
			.is_some()
	};
	record.target().is_some_and(in_payload)
		|| nodes(record.added_nodes()).any(in_payload)
		|| nodes(record.removed_nodes()).any(in_payload)
}
