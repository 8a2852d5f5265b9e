//! Force-directed dependency graph rendered as SVG.
//!
//! The `<dependency-graph>` element reads a `{ nodes, links }` JSON payload
//! from a child `<script type="application/json">` and mounts:
//! - a force layout (link springs, charge, collision, centering)
//! - an SVG scene of link lines and labelled node circles
//! - pan/zoom on the background and drag-to-pin on nodes
//!
//! # Example
//!
//! ```html
//! <dependency-graph link-distance="80">
//!   <script type="application/json">
//!     { "nodes": [{ "id": "A", "group": "#1f77b4" }, { "id": "B" }],
//!       "links": [{ "source": "A", "target": "B", "value": 4 }] }
//!   </script>
//! </dependency-graph>
//! ```

mod component;
mod element;
mod frames;
pub mod geometry;
pub mod interaction;
pub mod layout;
pub mod render;
mod state;
pub mod theme;
mod types;

pub use component::GraphScene;
pub use element::{DEFAULT_TAG, GraphView, LIVE_ATTRIBUTE, define_graph_view, load_graph_data, with_view};
pub use frames::FrameWaker;
pub use interaction::ZoomTransform;
pub use layout::{LayoutConfig, build_simulation};
pub use render::{SceneModel, SceneSignals};
pub use state::GraphState;
pub use theme::Theme;
pub use types::{GraphData, GraphLink, GraphNode, Group};
