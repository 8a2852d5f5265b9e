//! Barnes-Hut charge force with a reused approximation tree.
//!
//! Building the quadtree and aggregating charges is the expensive part of the
//! force, so the aggregated tree is kept between ticks and only rebuilt every
//! `reuse_interval` ticks. In between, far-away clusters are approximated by
//! their last known centre of charge.

use std::any::Any;

use super::{Force, Lcg, QuadTree, SimNode};
use crate::error::Result;

pub struct ManyBodyForce {
	strength: f64,
	theta2: f64,
	distance_min2: f64,
	distance_max2: f64,
	reuse_interval: u64,
	strengths: Vec<f64>,
	tree: Option<QuadTree>,
	ticks: u64,
}

impl Default for ManyBodyForce {
	fn default() -> Self {
		Self {
			strength: -30.0,
			theta2: 0.81,
			distance_min2: 1.0,
			distance_max2: f64::INFINITY,
			reuse_interval: 13,
			strengths: Vec::new(),
			tree: None,
			ticks: 0,
		}
	}
}

impl ManyBodyForce {
	pub fn new() -> Self {
		Self::default()
	}

	/// Negative values repel, positive values attract.
	pub fn strength(mut self, strength: f64) -> Self {
		self.strength = strength;
		self
	}

	/// Rebuild the approximation tree every `ticks` ticks (1 = every tick).
	pub fn reuse_interval(mut self, ticks: u64) -> Self {
		self.reuse_interval = ticks.max(1);
		self
	}

	pub fn theta(mut self, theta: f64) -> Self {
		self.theta2 = theta * theta;
		self
	}

	fn rebuild(&mut self, nodes: &[SimNode]) {
		let points: Vec<(f64, f64)> = nodes.iter().map(|n| (n.x, n.y)).collect();
		let mut tree = QuadTree::build(&points);

		for index in tree.post_order() {
			let quad = tree.quad(index);
			let (value, cx, cy) = if quad.is_leaf() {
				let members = quad.members();
				let value: f64 = members.iter().map(|&i| self.strengths[i]).sum();
				let n = members.len() as f64;
				let cx = members.iter().map(|&i| points[i].0).sum::<f64>() / n;
				let cy = members.iter().map(|&i| points[i].1).sum::<f64>() / n;
				(value, cx, cy)
			} else {
				let (mut value, mut weight, mut x, mut y) = (0.0, 0.0, 0.0, 0.0);
				for child in quad.children().map(|c| tree.quad(c)) {
					let c = child.value.abs();
					if c != 0.0 {
						value += child.value;
						weight += c;
						x += c * child.cx;
						y += c * child.cy;
					}
				}
				if weight > 0.0 {
					(value, x / weight, y / weight)
				} else {
					(value, (quad.x0 + quad.x1) / 2.0, (quad.y0 + quad.y1) / 2.0)
				}
			};
			let quad = tree.quad_mut(index);
			quad.value = value;
			quad.cx = cx;
			quad.cy = cy;
		}
		self.tree = Some(tree);
	}
}

impl Force for ManyBodyForce {
	fn initialize(&mut self, nodes: &[SimNode], _random: &mut Lcg) -> Result<()> {
		self.strengths = vec![self.strength; nodes.len()];
		self.tree = None;
		self.ticks = 0;
		Ok(())
	}

	fn apply(&mut self, nodes: &mut [SimNode], alpha: f64, random: &mut Lcg) {
		if self.tree.is_none() || self.ticks % self.reuse_interval == 0 {
			self.rebuild(nodes);
		}
		self.ticks += 1;

		let Some(tree) = self.tree.as_ref() else {
			return;
		};
		let (theta2, min2, max2) = (self.theta2, self.distance_min2, self.distance_max2);
		let strengths = &self.strengths;

		for node in nodes.iter_mut() {
			let (nx, ny, me) = (node.x, node.y, node.index);
			let (mut dvx, mut dvy) = (0.0, 0.0);

			tree.visit(|quad| {
				if quad.value == 0.0 {
					return true;
				}
				let (mut x, mut y) = (quad.cx - nx, quad.cy - ny);
				let w = quad.width();
				let mut l = x * x + y * y;

				// Far enough away to treat the whole cell as one body.
				if w * w / theta2 < l {
					if l < max2 {
						if x == 0.0 {
							x = random.jiggle();
							l += x * x;
						}
						if y == 0.0 {
							y = random.jiggle();
							l += y * y;
						}
						if l < min2 {
							l = (min2 * l).sqrt();
						}
						dvx += x * quad.value * alpha / l;
						dvy += y * quad.value * alpha / l;
					}
					return true;
				}
				if !quad.is_leaf() || l >= max2 {
					return false;
				}

				let members = quad.members();
				if members != [me] {
					if x == 0.0 {
						x = random.jiggle();
						l += x * x;
					}
					if y == 0.0 {
						y = random.jiggle();
						l += y * y;
					}
					if l < min2 {
						l = (min2 * l).sqrt();
					}
				}
				for &other in members {
					if other != me {
						let w = strengths[other] * alpha / l;
						dvx += x * w;
						dvy += y * w;
					}
				}
				true
			});

			node.vx += dvx;
			node.vy += dvy;
		}
	}

	fn as_any(&self) -> &dyn Any {
		self
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::simulation::{NodeSeed, Simulation};

	fn spread(n: usize) -> Simulation {
		Simulation::new((0..n).map(|i| NodeSeed::new(i.to_string())))
	}

	fn mean_distance_from_origin(sim: &Simulation) -> f64 {
		let nodes = sim.nodes();
		nodes.iter().map(|n| n.x.hypot(n.y)).sum::<f64>() / nodes.len() as f64
	}

	#[test]
	fn negative_strength_pushes_nodes_apart() {
		let mut sim = spread(20)
			.with_force("charge", ManyBodyForce::new().strength(-100.0))
			.unwrap();
		let before = mean_distance_from_origin(&sim);
		for _ in 0..10 {
			sim.tick();
		}
		assert!(mean_distance_from_origin(&sim) > before);
	}

	#[test]
	fn two_bodies_repel_symmetrically() {
		let mut sim = Simulation::new(vec![
			NodeSeed::new("a").at(-5.0, 0.0),
			NodeSeed::new("b").at(5.0, 0.0),
		])
		.with_force("charge", ManyBodyForce::new().strength(-100.0))
		.unwrap();
		sim.tick();
		let (a, b) = (&sim.nodes()[0], &sim.nodes()[1]);
		assert!(a.vx < 0.0 && b.vx > 0.0);
		assert!((a.vx + b.vx).abs() < 1e-9);
	}

	#[test]
	fn coincident_nodes_are_separated() {
		let mut sim = Simulation::new(vec![
			NodeSeed::new("a").at(1.0, 1.0),
			NodeSeed::new("b").at(1.0, 1.0),
		])
		.with_force("charge", ManyBodyForce::new().strength(-100.0))
		.unwrap();
		for _ in 0..5 {
			sim.tick();
		}
		let (a, b) = (&sim.nodes()[0], &sim.nodes()[1]);
		assert!(a.x != b.x || a.y != b.y);
	}

	#[test]
	fn first_tick_matches_a_fresh_tree() {
		let mut exact = spread(30)
			.with_force("charge", ManyBodyForce::new().strength(-100.0).reuse_interval(1))
			.unwrap();
		let mut reused = spread(30)
			.with_force("charge", ManyBodyForce::new().strength(-100.0))
			.unwrap();
		exact.tick();
		reused.tick();
		assert_eq!(exact.nodes(), reused.nodes());
	}
}
