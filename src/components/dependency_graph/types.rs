//! Graph payload as embedded in the element's JSON script tag.

use std::fmt;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::Result;
use crate::simulation::{LinkSpec, NodeSeed};

/// A node in the graph.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct GraphNode {
	/// Unique identifier, referenced by links. Numeric ids are kept as their
	/// decimal text.
	#[serde(deserialize_with = "node_id")]
	pub id: String,
	/// Colour used verbatim as the node's fill.
	#[serde(default)]
	pub group: Option<Group>,
	/// Optional starting position.
	#[serde(default)]
	pub x: Option<f64>,
	#[serde(default)]
	pub y: Option<f64>,
	/// Optional pin; a pinned node does not move.
	#[serde(default)]
	pub fx: Option<f64>,
	#[serde(default)]
	pub fy: Option<f64>,
}

/// A node's colour value: a CSS colour string, a bare number, or any other
/// JSON value, which is written out as its JSON text.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Group {
	Number(f64),
	Name(String),
	Other(Value),
}

impl fmt::Display for Group {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Group::Number(n) => write!(f, "{n}"),
			Group::Name(s) => f.write_str(s),
			Group::Other(v) => write!(f, "{v}"),
		}
	}
}

/// An undirected edge between two nodes.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct GraphLink {
	/// Source node ID.
	#[serde(deserialize_with = "node_id")]
	pub source: String,
	/// Target node ID.
	#[serde(deserialize_with = "node_id")]
	pub target: String,
	/// Link weight; the rendered stroke width is its square root. Missing
	/// means 1, null means 0, numeric strings are parsed and anything else is
	/// NaN.
	#[serde(default = "default_link_value", deserialize_with = "link_value")]
	pub value: f64,
}

fn default_link_value() -> f64 {
	1.0
}

/// Complete graph data: nodes and links.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct GraphData {
	pub nodes: Vec<GraphNode>,
	pub links: Vec<GraphLink>,
}

impl GraphData {
	/// Parse a `{ nodes, links }` document. No further validation happens here;
	/// dangling link endpoints surface when the simulation resolves them.
	pub fn from_json(text: &str) -> Result<Self> {
		Ok(serde_json::from_str(text)?)
	}

	pub fn node_seeds(&self) -> impl Iterator<Item = NodeSeed> + '_ {
		self.nodes.iter().map(|n| NodeSeed {
			id: n.id.clone(),
			x: n.x,
			y: n.y,
			fx: n.fx,
			fy: n.fy,
		})
	}

	pub fn link_specs(&self) -> Vec<LinkSpec> {
		self.links
			.iter()
			.map(|l| LinkSpec::new(l.source.clone(), l.target.clone()))
			.collect()
	}
}

fn link_value<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
	Ok(match Value::deserialize(deserializer)? {
		Value::Null => 0.0,
		Value::Bool(b) => f64::from(u8::from(b)),
		Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
		Value::String(s) => match s.trim() {
			"" => 0.0,
			text => text.parse().unwrap_or(f64::NAN),
		},
		Value::Array(_) | Value::Object(_) => f64::NAN,
	})
}

fn node_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
	#[derive(Deserialize)]
	#[serde(untagged)]
	enum RawId {
		Text(String),
		Integer(i64),
		Number(f64),
	}

	Ok(match RawId::deserialize(deserializer)? {
		RawId::Text(s) => s,
		RawId::Integer(i) => i.to_string(),
		RawId::Number(n) => n.to_string(),
	})
}
