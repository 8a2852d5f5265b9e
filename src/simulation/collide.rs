//! Collision force treating every node as a disc.

use std::any::Any;

use super::{Force, Lcg, QuadTree, SimNode};
use crate::error::Result;

pub struct CollideForce {
	radius: f64,
	strength: f64,
	iterations: usize,
	radii: Vec<f64>,
}

impl CollideForce {
	pub fn new(radius: f64) -> Self {
		Self {
			radius,
			strength: 1.0,
			iterations: 1,
			radii: Vec::new(),
		}
	}

	pub fn strength(mut self, strength: f64) -> Self {
		self.strength = strength;
		self
	}

	pub fn iterations(mut self, iterations: usize) -> Self {
		self.iterations = iterations.max(1);
		self
	}

	pub fn radius(&self) -> f64 {
		self.radius
	}
}

impl Force for CollideForce {
	fn initialize(&mut self, nodes: &[SimNode], _random: &mut Lcg) -> Result<()> {
		self.radii = vec![self.radius; nodes.len()];
		Ok(())
	}

	fn apply(&mut self, nodes: &mut [SimNode], _alpha: f64, random: &mut Lcg) {
		let radii = &self.radii;
		let strength = self.strength;

		for _ in 0..self.iterations {
			// Work on predicted positions so overlaps are resolved before they happen.
			let points: Vec<(f64, f64)> = nodes.iter().map(|n| (n.x + n.vx, n.y + n.vy)).collect();
			let mut tree = QuadTree::build(&points);
			for index in tree.post_order() {
				let quad = tree.quad(index);
				let r = if quad.is_leaf() {
					quad.members().iter().map(|&i| radii[i]).fold(0.0, f64::max)
				} else {
					quad.children().map(|c| tree.quad(c).r).fold(0.0, f64::max)
				};
				tree.quad_mut(index).r = r;
			}

			for i in 0..nodes.len() {
				let ri = radii[i];
				let ri2 = ri * ri;
				let (xi, yi) = (nodes[i].x + nodes[i].vx, nodes[i].y + nodes[i].vy);

				tree.visit(|quad| {
					if quad.is_leaf() {
						for &j in quad.members() {
							if j <= i {
								continue;
							}
							let rj = radii[j];
							let r = ri + rj;
							let mut x = xi - nodes[j].x - nodes[j].vx;
							let mut y = yi - nodes[j].y - nodes[j].vy;
							let mut l = x * x + y * y;
							if l >= r * r {
								continue;
							}
							if x == 0.0 {
								x = random.jiggle();
								l += x * x;
							}
							if y == 0.0 {
								y = random.jiggle();
								l += y * y;
							}
							let len = l.sqrt();
							let push = (r - len) / len * strength;
							let (x, y) = (x * push, y * push);
							let rj2 = rj * rj;
							let share = rj2 / (ri2 + rj2);
							nodes[i].vx += x * share;
							nodes[i].vy += y * share;
							nodes[j].vx -= x * (1.0 - share);
							nodes[j].vy -= y * (1.0 - share);
						}
						return true;
					}
					let r = ri + quad.r;
					quad.x0 > xi + r || quad.x1 < xi - r || quad.y0 > yi + r || quad.y1 < yi - r
				});
			}
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

	fn gap(sim: &Simulation) -> f64 {
		let (a, b) = (&sim.nodes()[0], &sim.nodes()[1]);
		(b.x - a.x).hypot(b.y - a.y)
	}

	#[test]
	fn overlapping_discs_are_pushed_apart() {
		let mut sim = Simulation::new(vec![
			NodeSeed::new("a").at(0.0, 0.0),
			NodeSeed::new("b").at(4.0, 0.0),
		])
		.with_force("collide", CollideForce::new(9.0))
		.unwrap();
		sim.tick();
		assert!(gap(&sim) > 4.0);
		assert!(sim.nodes()[0].vx < 0.0 && sim.nodes()[1].vx > 0.0);
	}

	#[test]
	fn separated_discs_are_left_alone() {
		let mut sim = Simulation::new(vec![
			NodeSeed::new("a").at(0.0, 0.0),
			NodeSeed::new("b").at(30.0, 0.0),
		])
		.with_force("collide", CollideForce::new(9.0))
		.unwrap();
		sim.tick();
		assert_eq!(gap(&sim), 30.0);
	}

	#[test]
	fn many_overlaps_resolve_to_at_least_a_diameter() {
		let seeds = (0..6).map(|i| NodeSeed::new(i.to_string()).at(i as f64, 0.0));
		let mut sim = Simulation::new(seeds)
			.with_force("collide", CollideForce::new(9.0).iterations(4))
			.unwrap();
		for _ in 0..200 {
			sim.tick();
		}
		let nodes = sim.nodes();
		for a in nodes {
			for b in nodes.iter().filter(|b| b.index > a.index) {
				let d = (b.x - a.x).hypot(b.y - a.y);
				assert!(d > 17.0, "{} and {} only {d} apart", a.id, b.id);
			}
		}
	}
}
