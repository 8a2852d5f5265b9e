//! Arena-backed point quadtree used by the charge and collision forces.
//!
//! Leaves hold every point that shares a cell; exactly coincident points stay
//! together in one leaf. Each quad carries scratch fields (`value`, `cx`, `cy`,
//! `r`) that the forces fill in during a post-order pass.

/// Subdivision stops here and the remaining points share a leaf.
const MAX_DEPTH: usize = 48;

#[derive(Clone, Debug, PartialEq)]
pub enum QuadKind {
	/// Children in order top-left, top-right, bottom-left, bottom-right.
	Internal([Option<usize>; 4]),
	/// Indices of the points stored in this cell.
	Leaf(Vec<usize>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Quad {
	pub x0: f64,
	pub y0: f64,
	pub x1: f64,
	pub y1: f64,
	pub kind: QuadKind,
	/// Aggregated charge.
	pub value: f64,
	/// Charge-weighted centre.
	pub cx: f64,
	pub cy: f64,
	/// Largest collision radius below this quad.
	pub r: f64,
}

impl Quad {
	fn new(x0: f64, y0: f64, x1: f64, y1: f64, kind: QuadKind) -> Self {
		Self {
			x0,
			y0,
			x1,
			y1,
			kind,
			value: 0.0,
			cx: 0.0,
			cy: 0.0,
			r: 0.0,
		}
	}

	pub fn width(&self) -> f64 {
		self.x1 - self.x0
	}

	pub fn is_leaf(&self) -> bool {
		matches!(self.kind, QuadKind::Leaf(_))
	}

	pub fn children(&self) -> impl Iterator<Item = usize> + '_ {
		let slots: &[Option<usize>] = match &self.kind {
			QuadKind::Internal(children) => children,
			QuadKind::Leaf(_) => &[],
		};
		slots.iter().flatten().copied()
	}

	pub fn members(&self) -> &[usize] {
		match &self.kind {
			QuadKind::Leaf(members) => members,
			QuadKind::Internal(_) => &[],
		}
	}
}

#[derive(Clone, Debug, Default)]
pub struct QuadTree {
	quads: Vec<Quad>,
	root: Option<usize>,
}

impl QuadTree {
	/// Build a tree over `points`; leaf members are indices into `points`.
	/// Non-finite points are left out.
	pub fn build(points: &[(f64, f64)]) -> Self {
		let mut tree = Self::default();
		let members: Vec<usize> = points
			.iter()
			.enumerate()
			.filter(|(_, (x, y))| x.is_finite() && y.is_finite())
			.map(|(i, _)| i)
			.collect();
		if members.is_empty() {
			return tree;
		}

		let (mut x0, mut y0, mut x1, mut y1) = (
			f64::INFINITY,
			f64::INFINITY,
			f64::NEG_INFINITY,
			f64::NEG_INFINITY,
		);
		for &i in &members {
			let (x, y) = points[i];
			x0 = x0.min(x);
			y0 = y0.min(y);
			x1 = x1.max(x);
			y1 = y1.max(y);
		}
		let mut side = (x1 - x0).max(y1 - y0);
		if side <= 0.0 {
			side = 1.0;
		}

		tree.root = Some(tree.subdivide(points, members, (x0, y0, x0 + side, y0 + side), 0));
		tree
	}

	fn subdivide(
		&mut self,
		points: &[(f64, f64)],
		members: Vec<usize>,
		(x0, y0, x1, y1): (f64, f64, f64, f64),
		depth: usize,
	) -> usize {
		let first = points[members[0]];
		let coincident = members.iter().all(|&i| points[i] == first);
		if coincident || depth >= MAX_DEPTH {
			self.quads
				.push(Quad::new(x0, y0, x1, y1, QuadKind::Leaf(members)));
			return self.quads.len() - 1;
		}

		let (xm, ym) = ((x0 + x1) / 2.0, (y0 + y1) / 2.0);
		let mut buckets: [Vec<usize>; 4] = Default::default();
		for i in members {
			let (x, y) = points[i];
			let right = (x >= xm) as usize;
			let bottom = (y >= ym) as usize;
			buckets[bottom << 1 | right].push(i);
		}

		let index = self.quads.len();
		self.quads
			.push(Quad::new(x0, y0, x1, y1, QuadKind::Internal([None; 4])));

		let mut children = [None; 4];
		for (slot, bucket) in buckets.into_iter().enumerate() {
			if bucket.is_empty() {
				continue;
			}
			let (cx0, cx1) = if slot & 1 == 1 { (xm, x1) } else { (x0, xm) };
			let (cy0, cy1) = if slot & 2 == 2 { (ym, y1) } else { (y0, ym) };
			children[slot] = Some(self.subdivide(points, bucket, (cx0, cy0, cx1, cy1), depth + 1));
		}
		self.quads[index].kind = QuadKind::Internal(children);
		index
	}

	pub fn root(&self) -> Option<usize> {
		self.root
	}

	pub fn is_empty(&self) -> bool {
		self.root.is_none()
	}

	pub fn quad(&self, index: usize) -> &Quad {
		&self.quads[index]
	}

	pub fn quad_mut(&mut self, index: usize) -> &mut Quad {
		&mut self.quads[index]
	}

	/// Quad indices with every child listed before its parent.
	pub fn post_order(&self) -> Vec<usize> {
		let mut order = Vec::with_capacity(self.quads.len());
		let mut stack: Vec<(usize, bool)> = self.root.map(|r| (r, false)).into_iter().collect();
		while let Some((index, expanded)) = stack.pop() {
			if expanded {
				order.push(index);
				continue;
			}
			stack.push((index, true));
			stack.extend(self.quads[index].children().map(|c| (c, false)));
		}
		order
	}

	/// Pre-order traversal. Returning `true` from `visit` skips the quad's
	/// children.
	pub fn visit(&self, mut visit: impl FnMut(&Quad) -> bool) {
		let mut stack: Vec<usize> = self.root.into_iter().collect();
		while let Some(index) = stack.pop() {
			let quad = &self.quads[index];
			if visit(quad) {
				continue;
			}
			// Reverse so the top-left child is visited first.
			let children: Vec<usize> = quad.children().collect();
			stack.extend(children.into_iter().rev());
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn leaves(tree: &QuadTree) -> Vec<Vec<usize>> {
		let mut out = Vec::new();
		tree.visit(|q| {
			if q.is_leaf() {
				out.push(q.members().to_vec());
			}
			false
		});
		out
	}

	#[test]
	fn empty_input_builds_empty_tree() {
		assert!(QuadTree::build(&[]).is_empty());
		assert!(QuadTree::build(&[(f64::NAN, 0.0)]).is_empty());
	}

	#[test]
	fn separates_points_into_quadrants() {
		let tree = QuadTree::build(&[(0.0, 0.0), (10.0, 0.0), (0.0, 10.0), (10.0, 10.0)]);
		let root = tree.quad(tree.root().unwrap());
		assert!(!root.is_leaf());
		assert_eq!(root.children().count(), 4);
		assert_eq!(leaves(&tree), vec![vec![0], vec![1], vec![2], vec![3]]);
	}

	#[test]
	fn coincident_points_share_a_leaf() {
		let tree = QuadTree::build(&[(3.0, 3.0), (3.0, 3.0), (9.0, 1.0)]);
		let mut groups = leaves(&tree);
		groups.sort();
		assert_eq!(groups, vec![vec![0, 1], vec![2]]);
	}

	#[test]
	fn post_order_lists_children_before_parents() {
		let tree = QuadTree::build(&[(0.0, 0.0), (1.0, 1.0), (5.0, 5.0), (9.0, 0.5)]);
		let order = tree.post_order();
		assert_eq!(order.last().copied(), tree.root());
		for (pos, &index) in order.iter().enumerate() {
			for child in tree.quad(index).children() {
				let child_pos = order.iter().position(|&i| i == child).unwrap();
				assert!(child_pos < pos);
			}
		}
	}

	#[test]
	fn visit_can_prune_subtrees() {
		let tree = QuadTree::build(&[(0.0, 0.0), (10.0, 10.0)]);
		let mut seen = 0;
		tree.visit(|_| {
			seen += 1;
			true
		});
		assert_eq!(seen, 1);
	}
}
