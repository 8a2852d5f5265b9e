//! Per-axis centering force.

use std::any::Any;

use super::{Force, Lcg, SimNode};
use crate::error::Result;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
	X,
	Y,
}

/// Pulls every node toward `target` along one axis, proportionally to its
/// distance from it.
pub struct PositionForce {
	axis: Axis,
	target: f64,
	strength: f64,
}

impl PositionForce {
	pub fn new(axis: Axis, target: f64) -> Self {
		Self {
			axis,
			target,
			strength: 0.1,
		}
	}

	pub fn strength(mut self, strength: f64) -> Self {
		self.strength = strength;
		self
	}

	pub fn target(&self) -> f64 {
		self.target
	}
}

impl Force for PositionForce {
	fn initialize(&mut self, _nodes: &[SimNode], _random: &mut Lcg) -> Result<()> {
		Ok(())
	}

	fn apply(&mut self, nodes: &mut [SimNode], alpha: f64, _random: &mut Lcg) {
		let k = self.strength * alpha;
		for node in nodes {
			match self.axis {
				Axis::X => node.vx += (self.target - node.x) * k,
				Axis::Y => node.vy += (self.target - node.y) * k,
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

	#[test]
	fn each_axis_pulls_independently() {
		let mut sim = Simulation::new(vec![NodeSeed::new("a").at(50.0, -20.0)])
			.with_force("x", PositionForce::new(Axis::X, 0.0))
			.unwrap();
		sim.tick();
		let node = &sim.nodes()[0];
		assert!(node.x < 50.0);
		assert_eq!(node.y, -20.0);

		sim.add_force("y", PositionForce::new(Axis::Y, 0.0)).unwrap();
		sim.tick();
		assert!(sim.nodes()[0].y > -20.0);
	}
}
