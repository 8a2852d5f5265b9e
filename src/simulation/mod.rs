//! Force-directed layout engine.
//!
//! A [`Simulation`] owns a set of [`SimNode`]s and a named, ordered list of
//! [`Force`]s. Each [`Simulation::tick`] lets alpha approach its target, asks
//! every force to adjust node velocities, then integrates velocities into
//! positions. Pinned nodes (`fx`/`fy`) are snapped to their pin instead.
//!
//! [`Simulation::step`] is the timer-facing entry point: it ticks while the
//! simulation is running and stops it once alpha cools below `alpha_min`.

mod collide;
mod link;
mod many_body;
mod position;
mod quadtree;
mod random;

use std::any::Any;
use std::f64::consts::PI;

pub use collide::CollideForce;
pub use link::{LinkForce, LinkSpec, ResolvedLink};
pub use many_body::ManyBodyForce;
pub use position::{Axis, PositionForce};
pub use quadtree::{Quad, QuadKind, QuadTree};
pub use random::Lcg;

use crate::error::Result;

const INITIAL_RADIUS: f64 = 10.0;

/// A node as the simulation sees it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SimNode {
	/// Position of this node in the simulation's node list.
	pub index: usize,
	/// Identifier used by [`LinkForce`] to resolve link endpoints.
	pub id: String,
	pub x: f64,
	pub y: f64,
	pub vx: f64,
	pub vy: f64,
	/// Pinned x coordinate; `Some` removes the node from free motion on x.
	pub fx: Option<f64>,
	/// Pinned y coordinate; `Some` removes the node from free motion on y.
	pub fy: Option<f64>,
}

impl SimNode {
	/// Fix the node at `(x, y)` until [`SimNode::unpin`].
	pub fn pin(&mut self, x: f64, y: f64) {
		self.fx = Some(x);
		self.fy = Some(y);
	}

	/// Hand the node back to the forces.
	pub fn unpin(&mut self) {
		self.fx = None;
		self.fy = None;
	}

	pub fn is_pinned(&self) -> bool {
		self.fx.is_some() || self.fy.is_some()
	}
}

/// Initial state for a node. Missing coordinates are filled in by a
/// phyllotaxis spiral around the origin.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NodeSeed {
	pub id: String,
	pub x: Option<f64>,
	pub y: Option<f64>,
	pub fx: Option<f64>,
	pub fy: Option<f64>,
}

impl NodeSeed {
	pub fn new(id: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			..Self::default()
		}
	}

	pub fn at(mut self, x: f64, y: f64) -> Self {
		self.x = Some(x);
		self.y = Some(y);
		self
	}
}

/// A force contributes velocity changes to nodes on every tick.
pub trait Force: Any {
	/// Called whenever the force is attached to a simulation.
	fn initialize(&mut self, nodes: &[SimNode], random: &mut Lcg) -> Result<()>;

	/// Adjust velocities (or, for collision, predicted positions) for `alpha`.
	fn apply(&mut self, nodes: &mut [SimNode], alpha: f64, random: &mut Lcg);

	fn as_any(&self) -> &dyn Any;
}

/// What a timer step did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
	/// The simulation is stopped; nothing moved.
	Idle,
	/// One tick ran and the simulation keeps going.
	Tick,
	/// One tick ran and alpha dropped below `alpha_min`; the simulation stopped.
	End,
}

/// Iterative force layout with alpha cooling.
pub struct Simulation {
	nodes: Vec<SimNode>,
	forces: Vec<(&'static str, Box<dyn Force>)>,
	alpha: f64,
	alpha_min: f64,
	alpha_decay: f64,
	alpha_target: f64,
	velocity_decay: f64,
	random: Lcg,
	running: bool,
	ticks: u64,
}

impl Simulation {
	/// Create a running simulation over `seeds`, placing unseeded nodes.
	pub fn new(seeds: impl IntoIterator<Item = NodeSeed>) -> Self {
		let initial_angle = PI * (3.0 - 5f64.sqrt());
		let nodes = seeds
			.into_iter()
			.enumerate()
			.map(|(index, seed)| {
				let (mut x, mut y) = (seed.fx.or(seed.x), seed.fy.or(seed.y));
				if x.is_none() || y.is_none() {
					let radius = INITIAL_RADIUS * (0.5 + index as f64).sqrt();
					let angle = index as f64 * initial_angle;
					x = Some(radius * angle.cos());
					y = Some(radius * angle.sin());
				}
				SimNode {
					index,
					id: seed.id,
					x: x.unwrap_or_default(),
					y: y.unwrap_or_default(),
					vx: 0.0,
					vy: 0.0,
					fx: seed.fx,
					fy: seed.fy,
				}
			})
			.collect();
		let alpha_min: f64 = 0.001;

		Self {
			nodes,
			forces: Vec::new(),
			alpha: 1.0,
			alpha_min,
			alpha_decay: 1.0 - alpha_min.powf(1.0 / 300.0),
			alpha_target: 0.0,
			velocity_decay: 0.6,
			random: Lcg::default(),
			running: true,
			ticks: 0,
		}
	}

	/// Builder form of [`Simulation::add_force`].
	pub fn with_force(mut self, name: &'static str, force: impl Force) -> Result<Self> {
		self.add_force(name, force)?;
		Ok(self)
	}

	/// Attach `force` under `name`, replacing any force with the same name.
	/// Forces run in registration order.
	pub fn add_force(&mut self, name: &'static str, force: impl Force) -> Result<()> {
		let mut force: Box<dyn Force> = Box::new(force);
		force.initialize(&self.nodes, &mut self.random)?;
		match self.forces.iter_mut().find(|(n, _)| *n == name) {
			Some(slot) => slot.1 = force,
			None => self.forces.push((name, force)),
		}
		Ok(())
	}

	/// Look up a force by name and concrete type.
	pub fn force<F: Force>(&self, name: &str) -> Option<&F> {
		self.forces
			.iter()
			.find(|(n, _)| *n == name)
			.and_then(|(_, f)| f.as_any().downcast_ref::<F>())
	}

	pub fn force_names(&self) -> impl Iterator<Item = &'static str> + '_ {
		self.forces.iter().map(|(n, _)| *n)
	}

	pub fn nodes(&self) -> &[SimNode] {
		&self.nodes
	}

	pub fn node(&self, index: usize) -> Option<&SimNode> {
		self.nodes.get(index)
	}

	pub fn node_mut(&mut self, index: usize) -> Option<&mut SimNode> {
		self.nodes.get_mut(index)
	}

	pub fn alpha(&self) -> f64 {
		self.alpha
	}

	pub fn set_alpha(&mut self, alpha: f64) {
		self.alpha = alpha;
	}

	pub fn alpha_min(&self) -> f64 {
		self.alpha_min
	}

	pub fn alpha_decay(&self) -> f64 {
		self.alpha_decay
	}

	/// Fraction of the gap to the alpha target closed per tick. Larger values
	/// settle the layout in fewer ticks.
	pub fn set_alpha_decay(&mut self, decay: f64) {
		self.alpha_decay = decay;
	}

	pub fn alpha_target(&self) -> f64 {
		self.alpha_target
	}

	pub fn set_alpha_target(&mut self, target: f64) {
		self.alpha_target = target;
	}

	pub fn is_running(&self) -> bool {
		self.running
	}

	/// Number of ticks run so far.
	pub fn ticks(&self) -> u64 {
		self.ticks
	}

	/// Resume stepping. Alpha is left untouched, so pair with an alpha target
	/// above `alpha_min` to actually warm the layout back up.
	pub fn restart(&mut self) {
		self.running = true;
	}

	pub fn stop(&mut self) {
		self.running = false;
	}

	/// Advance the layout by one iteration, regardless of `running`.
	pub fn tick(&mut self) {
		self.alpha += (self.alpha_target - self.alpha) * self.alpha_decay;
		let alpha = self.alpha;

		for (_, force) in self.forces.iter_mut() {
			force.apply(&mut self.nodes, alpha, &mut self.random);
		}

		let decay = self.velocity_decay;
		for node in &mut self.nodes {
			match node.fx {
				Some(fx) => {
					node.x = fx;
					node.vx = 0.0;
				}
				None => {
					node.vx *= decay;
					node.x += node.vx;
				}
			}
			match node.fy {
				Some(fy) => {
					node.y = fy;
					node.vy = 0.0;
				}
				None => {
					node.vy *= decay;
					node.y += node.vy;
				}
			}
		}
		self.ticks += 1;
	}

	/// One timer callback: tick if running, stop once cooled.
	pub fn step(&mut self) -> Step {
		if !self.running {
			return Step::Idle;
		}
		self.tick();
		if self.alpha < self.alpha_min {
			self.running = false;
			Step::End
		} else {
			Step::Tick
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn seeds(n: usize) -> Vec<NodeSeed> {
		(0..n).map(|i| NodeSeed::new(i.to_string())).collect()
	}

	#[test]
	fn unseeded_nodes_are_spread_on_a_spiral() {
		let sim = Simulation::new(seeds(5));
		let nodes = sim.nodes();
		assert_eq!(nodes.len(), 5);
		assert!((nodes[0].x - INITIAL_RADIUS * 0.5f64.sqrt()).abs() < 1e-9);
		assert!(nodes[0].y.abs() < 1e-9);
		for pair in nodes.windows(2) {
			assert!(pair[0].x != pair[1].x || pair[0].y != pair[1].y);
		}
	}

	#[test]
	fn seeds_and_pins_set_the_start_position() {
		let mut pinned = NodeSeed::new("p").at(1.0, 1.0);
		pinned.fx = Some(40.0);
		pinned.fy = Some(-3.0);
		let sim = Simulation::new(vec![NodeSeed::new("a").at(7.0, 8.0), pinned]);
		assert_eq!((sim.nodes()[0].x, sim.nodes()[0].y), (7.0, 8.0));
		assert_eq!((sim.nodes()[1].x, sim.nodes()[1].y), (40.0, -3.0));
	}

	#[test]
	fn cools_down_and_stops_after_about_three_hundred_ticks() {
		let mut sim = Simulation::new(seeds(3));
		let mut steps = 0;
		loop {
			steps += 1;
			match sim.step() {
				Step::Tick => continue,
				Step::End => break,
				Step::Idle => panic!("stopped without an end step"),
			}
		}
		assert!((295..=305).contains(&steps), "took {steps} steps");
		assert!(!sim.is_running());
		assert_eq!(sim.step(), Step::Idle);
	}

	#[test]
	fn reheating_resumes_a_stopped_simulation() {
		let mut sim = Simulation::new(seeds(2));
		while sim.step() != Step::End {}
		sim.set_alpha_target(0.3);
		sim.restart();
		assert_eq!(sim.step(), Step::Tick);
		assert!(sim.alpha() > sim.alpha_min());
	}

	#[test]
	fn pinned_nodes_snap_to_their_pin() {
		let mut sim = Simulation::new(seeds(2))
			.with_force("x", PositionForce::new(Axis::X, 100.0))
			.unwrap();
		sim.node_mut(0).unwrap().pin(-5.0, 6.0);
		sim.tick();
		let node = &sim.nodes()[0];
		assert_eq!((node.x, node.y, node.vx, node.vy), (-5.0, 6.0, 0.0, 0.0));
		assert!(sim.nodes()[1].vx > 0.0);
	}

	#[test]
	fn forces_keep_registration_order_and_replace_by_name() {
		let mut sim = Simulation::new(seeds(2))
			.with_force("x", PositionForce::new(Axis::X, 0.0))
			.unwrap()
			.with_force("y", PositionForce::new(Axis::Y, 0.0))
			.unwrap();
		sim.add_force("x", PositionForce::new(Axis::X, 5.0)).unwrap();
		assert_eq!(sim.force_names().collect::<Vec<_>>(), ["x", "y"]);
		assert_eq!(sim.force::<PositionForce>("x").unwrap().target(), 5.0);
		assert!(sim.force::<LinkForce>("x").is_none());
	}
}
