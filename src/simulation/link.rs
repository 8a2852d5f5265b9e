//! Spring force pulling linked nodes toward a rest distance.

use std::any::Any;
use std::collections::HashMap;

use super::{Force, Lcg, SimNode};
use crate::error::{GraphError, Result};

/// A link as given by the payload, endpoints named by node id.
#[derive(Clone, Debug, PartialEq)]
pub struct LinkSpec {
	pub source: String,
	pub target: String,
}

impl LinkSpec {
	pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
		Self {
			source: source.into(),
			target: target.into(),
		}
	}
}

/// A link whose endpoints have been resolved to node indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResolvedLink {
	pub source: usize,
	pub target: usize,
}

pub struct LinkForce {
	specs: Vec<LinkSpec>,
	links: Vec<ResolvedLink>,
	distance: f64,
	strengths: Vec<f64>,
	bias: Vec<f64>,
}

impl LinkForce {
	pub fn new(specs: Vec<LinkSpec>) -> Self {
		Self {
			specs,
			links: Vec::new(),
			distance: 30.0,
			strengths: Vec::new(),
			bias: Vec::new(),
		}
	}

	pub fn distance(mut self, distance: f64) -> Self {
		self.distance = distance;
		self
	}

	pub fn rest_distance(&self) -> f64 {
		self.distance
	}

	/// Links resolved against the simulation's nodes, in payload order.
	/// Empty until the force is attached.
	pub fn links(&self) -> &[ResolvedLink] {
		&self.links
	}
}

impl Force for LinkForce {
	fn initialize(&mut self, nodes: &[SimNode], _random: &mut Lcg) -> Result<()> {
		let by_id: HashMap<&str, usize> = nodes.iter().map(|n| (n.id.as_str(), n.index)).collect();
		let find = |id: &str| {
			by_id
				.get(id)
				.copied()
				.ok_or_else(|| GraphError::UnknownNode(id.to_string()))
		};

		let links = self
			.specs
			.iter()
			.map(|link| -> Result<ResolvedLink> {
				Ok(ResolvedLink {
					source: find(&link.source)?,
					target: find(&link.target)?,
				})
			})
			.collect::<Result<Vec<_>>>()?;

		let mut degree = vec![0usize; nodes.len()];
		for link in &links {
			degree[link.source] += 1;
			degree[link.target] += 1;
		}
		self.strengths = links
			.iter()
			.map(|l| 1.0 / degree[l.source].min(degree[l.target]) as f64)
			.collect();
		self.bias = links
			.iter()
			.map(|l| degree[l.source] as f64 / (degree[l.source] + degree[l.target]) as f64)
			.collect();
		self.links = links;
		Ok(())
	}

	fn apply(&mut self, nodes: &mut [SimNode], alpha: f64, random: &mut Lcg) {
		for (i, link) in self.links.iter().enumerate() {
			let (s, t) = (&nodes[link.source], &nodes[link.target]);
			let mut x = t.x + t.vx - s.x - s.vx;
			let mut y = t.y + t.vy - s.y - s.vy;
			if x == 0.0 {
				x = random.jiggle();
			}
			if y == 0.0 {
				y = random.jiggle();
			}
			let len = (x * x + y * y).sqrt();
			let l = (len - self.distance) / len * alpha * self.strengths[i];
			let (x, y) = (x * l, y * l);
			let b = self.bias[i];

			let target = &mut nodes[link.target];
			target.vx -= x * b;
			target.vy -= y * b;
			let source = &mut nodes[link.source];
			source.vx += x * (1.0 - b);
			source.vy += y * (1.0 - b);
		}
	}

	fn as_any(&self) -> &dyn Any {
		self
	}
}
