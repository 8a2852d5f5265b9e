//! Visual style of the rendered scene.

/// Fixed presentation attributes for links, nodes and labels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Theme {
	/// Stroke colour shared by every link line.
	pub link_stroke: &'static str,
	pub link_stroke_opacity: f64,
	/// Circle radius in graph units. Smaller than the collision radius so
	/// neighbouring nodes keep a visible gap.
	pub node_radius: f64,
	pub label_fill: &'static str,
	pub label_font_size: &'static str,
	/// Label anchor relative to the node centre.
	pub label_dx: f64,
	pub label_dy: f64,
	/// Inline style on the root `<svg>`. Touch panning is handled by the
	/// zoom gesture, not the browser.
	pub svg_style: &'static str,
	/// Inline style on each node group, so touch drags reach the drag gesture.
	pub node_style: &'static str,
}

impl Theme {
	pub fn label_style(&self) -> String {
		format!("fill: {}; font-size: {};", self.label_fill, self.label_font_size)
	}
}

impl Default for Theme {
	fn default() -> Self {
		Self {
			link_stroke: "#999",
			link_stroke_opacity: 0.6,
			node_radius: 5.0,
			label_fill: "#000",
			label_font_size: "12px",
			label_dx: 6.0,
			label_dy: 3.0,
			svg_style: "max-width: 100%; height: auto; touch-action: none;",
			node_style: "touch-action: none;",
		}
	}
}
