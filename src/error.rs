//! Error type shared by payload loading, simulation setup and scene mounting.

use wasm_bindgen::JsValue;

/// Everything that can stop a graph from rendering.
///
/// None of these are recovered from: the element boundary logs the error and
/// rethrows it to the host page as a JS `Error`.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
	/// The element has no `<script type="application/json">` child.
	#[error("missing <script type=\"application/json\"> graph payload")]
	MissingPayload,
	/// The payload text is not a `{ nodes, links }` JSON document.
	#[error("invalid graph payload: {0}")]
	Json(#[from] serde_json::Error),
	/// A link names a node id that is not in `nodes`.
	#[error("node not found: {0}")]
	UnknownNode(String),
	/// A browser API call failed.
	#[error("DOM operation failed: {0}")]
	Dom(String),
}

impl GraphError {
	pub(crate) fn dom(err: JsValue) -> Self {
		Self::Dom(format!("{err:?}"))
	}
}

impl From<GraphError> for JsValue {
	fn from(err: GraphError) -> Self {
		js_sys::Error::new(&err.to_string()).into()
	}
}

/// Result alias defaulting to [`GraphError`].
pub type Result<T, E = GraphError> = std::result::Result<T, E>;
