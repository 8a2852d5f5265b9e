//! Force layout configuration and simulation setup.

use log::warn;

use super::types::GraphData;
use crate::error::Result;
use crate::simulation::{Axis, CollideForce, LinkForce, ManyBodyForce, PositionForce, Simulation};

/// Tuning surface of the force layout.
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutConfig {
	/// Rest length of every link.
	pub link_distance: f64,
	/// Many-body strength; negative repels.
	pub charge_strength: f64,
	/// Radius of the disc each node occupies for collision.
	pub collide_radius: f64,
	/// Strength of the per-axis pull toward the origin.
	pub center_strength: f64,
	/// Fraction of the remaining alpha removed per tick; the default cools
	/// from 1 to `alpha_min` in 300 ticks.
	pub alpha_decay: f64,
	/// Alpha target while a node is being dragged.
	pub reheat_alpha_target: f64,
	/// Ticks between rebuilds of the charge approximation tree.
	pub charge_reuse_interval: u64,
}

impl Default for LayoutConfig {
	fn default() -> Self {
		Self {
			link_distance: 100.0,
			charge_strength: -100.0,
			collide_radius: 9.0,
			center_strength: 0.1,
			alpha_decay: 1.0 - 0.001f64.powf(1.0 / 300.0),
			reheat_alpha_target: 0.3,
			charge_reuse_interval: 13,
		}
	}
}

impl LayoutConfig {
	/// Element attributes that may override the defaults.
	pub const ATTRIBUTES: [&'static str; 5] = [
		"link-distance",
		"charge-strength",
		"collide-radius",
		"center-strength",
		"alpha-decay",
	];

	/// Apply overrides looked up by attribute name. Values that are not
	/// finite numbers, or an `alpha-decay` outside `[0, 1]`, are ignored with
	/// a warning.
	pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
		let [distance, charge, radius, center, decay] = Self::ATTRIBUTES;
		let any = |_: f64| true;
		let fraction = |v: f64| (0.0..=1.0).contains(&v);
		let slots: [(&str, &mut f64, &dyn Fn(f64) -> bool); 5] = [
			(distance, &mut self.link_distance, &any),
			(charge, &mut self.charge_strength, &any),
			(radius, &mut self.collide_radius, &any),
			(center, &mut self.center_strength, &any),
			(decay, &mut self.alpha_decay, &fraction),
		];
		for (name, slot, accepts) in slots {
			let Some(raw) = lookup(name) else {
				continue;
			};
			match raw.trim().parse::<f64>() {
				Ok(value) if value.is_finite() && accepts(value) => *slot = value,
				_ => warn!("dependency-graph: ignoring {name}={raw:?}, expected a number"),
			}
		}
		self
	}
}

/// Build the simulation for `data`: link springs, charge, collision and
/// centering on both axes, in that order.
pub fn build_simulation(data: &GraphData, config: &LayoutConfig) -> Result<Simulation> {
	let mut simulation = Simulation::new(data.node_seeds());
	simulation.set_alpha_decay(config.alpha_decay);
	simulation
		.with_force(
			"link",
			LinkForce::new(data.link_specs()).distance(config.link_distance),
		)?
		.with_force(
			"charge",
			ManyBodyForce::new()
				.strength(config.charge_strength)
				.reuse_interval(config.charge_reuse_interval),
		)?
		.with_force("collide", CollideForce::new(config.collide_radius))?
		.with_force(
			"x",
			PositionForce::new(Axis::X, 0.0).strength(config.center_strength),
		)?
		.with_force(
			"y",
			PositionForce::new(Axis::Y, 0.0).strength(config.center_strength),
		)
}

#[cfg(test)]
mod tests {
	use std::collections::HashMap;

	use super::*;
	use crate::error::GraphError;
	use crate::simulation::{ResolvedLink, Step};

	const AB: &str = r#"{"nodes":[{"id":"A","group":1},{"id":"B","group":2}],
		"links":[{"source":"A","target":"B","value":4}]}"#;

	#[test]
	fn overrides_replace_defaults_and_skip_garbage() {
		let attrs: HashMap<&str, &str> = [("link-distance", " 42 "), ("charge-strength", "strong")].into();
		let config = LayoutConfig::default().with_overrides(|name| attrs.get(name).map(|v| v.to_string()));
		assert_eq!(config.link_distance, 42.0);
		assert_eq!(config.charge_strength, -100.0);
		assert_eq!(config.collide_radius, 9.0);
	}

	#[test]
	fn alpha_decay_must_be_a_fraction() {
		let default = LayoutConfig::default().alpha_decay;
		assert!((default - 0.0228).abs() < 1e-4);
		let config = LayoutConfig::default().with_overrides(|name| (name == "alpha-decay").then(|| "1.5".to_string()));
		assert_eq!(config.alpha_decay, default);
		let config = LayoutConfig::default().with_overrides(|name| (name == "alpha-decay").then(|| "0.5".to_string()));
		assert_eq!(config.alpha_decay, 0.5);
	}

	#[test]
	fn fast_decay_settles_in_a_few_ticks() {
		let data = GraphData::from_json(AB).unwrap();
		let config = LayoutConfig {
			alpha_decay: 0.5,
			..LayoutConfig::default()
		};
		let mut sim = build_simulation(&data, &config).unwrap();
		let mut steps = 0;
		while sim.step() != Step::End {
			steps += 1;
		}
		// 0.5^10 < 0.001 <= 0.5^9
		assert_eq!(steps + 1, 10);
	}

	#[test]
	fn forces_are_registered_in_order() {
		let data = GraphData::from_json(AB).unwrap();
		let sim = build_simulation(&data, &LayoutConfig::default()).unwrap();
		assert_eq!(
			sim.force_names().collect::<Vec<_>>(),
			["link", "charge", "collide", "x", "y"]
		);
		assert_eq!(sim.force::<LinkForce>("link").unwrap().rest_distance(), 100.0);
		assert_eq!(sim.force::<CollideForce>("collide").unwrap().radius(), 9.0);
	}

	#[test]
	fn links_resolve_to_node_indices() {
		let data = GraphData::from_json(AB).unwrap();
		let sim = build_simulation(&data, &LayoutConfig::default()).unwrap();
		let links = sim.force::<LinkForce>("link").unwrap().links();
		assert_eq!(links, &[ResolvedLink { source: 0, target: 1 }]);
		assert_eq!(sim.nodes()[links[0].source].id, "A");
		assert_eq!(sim.nodes()[links[0].target].id, "B");
	}

	#[test]
	fn dangling_link_fails_the_build() {
		let data = GraphData::from_json(
			r#"{"nodes":[{"id":"A"}],"links":[{"source":"A","target":"ghost","value":1}]}"#,
		)
		.unwrap();
		let err = build_simulation(&data, &LayoutConfig::default()).err().unwrap();
		assert!(matches!(err, GraphError::UnknownNode(id) if id == "ghost"));
	}

	#[test]
	fn linked_pair_settles_near_link_distance_around_origin() {
		let data = GraphData::from_json(AB).unwrap();
		let mut sim = build_simulation(&data, &LayoutConfig::default()).unwrap();
		while sim.step() != Step::End {}
		let (a, b) = (&sim.nodes()[0], &sim.nodes()[1]);
		let gap = (b.x - a.x).hypot(b.y - a.y);
		assert!((50.0..150.0).contains(&gap), "gap {gap}");
		let (mx, my) = ((a.x + b.x) / 2.0, (a.y + b.y) / 2.0);
		assert!(mx.abs() < 10.0 && my.abs() < 10.0);
	}
}
