//! Coordinate types and the mapping from client pixels into the SVG viewBox.

use std::fmt;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
	pub x: f64,
	pub y: f64,
}

impl Point {
	pub const fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}
}

/// SVG `viewBox`. The graph uses one centred on the origin so the centering
/// forces pull nodes toward the middle of the viewport.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewBox {
	pub min_x: f64,
	pub min_y: f64,
	pub width: f64,
	pub height: f64,
}

impl ViewBox {
	pub fn centered(width: f64, height: f64) -> Self {
		Self {
			min_x: -width / 2.0,
			min_y: -height / 2.0,
			width,
			height,
		}
	}
}

impl fmt::Display for ViewBox {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{},{},{},{}", self.min_x, self.min_y, self.width, self.height)
	}
}

/// On-screen box of the SVG element, as reported by `getBoundingClientRect`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClientRect {
	pub left: f64,
	pub top: f64,
	pub width: f64,
	pub height: f64,
}

impl ClientRect {
	/// Map a client-space point into viewBox units, following the default
	/// `preserveAspectRatio="xMidYMid meet"` fit.
	pub fn to_view(&self, view_box: &ViewBox, client: Point) -> Point {
		let scale = (self.width / view_box.width).min(self.height / view_box.height);
		if !scale.is_finite() || scale <= 0.0 {
			return Point::new(client.x - self.left + view_box.min_x, client.y - self.top + view_box.min_y);
		}
		let left = self.left + (self.width - view_box.width * scale) / 2.0;
		let top = self.top + (self.height - view_box.height * scale) / 2.0;
		Point::new(
			view_box.min_x + (client.x - left) / scale,
			view_box.min_y + (client.y - top) / scale,
		)
	}
}
