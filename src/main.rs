//! Client entrypoint for the CSR build.

// Bin target reuses lib deps, silence noisy lint.
#![allow(unused_crate_dependencies)]

use dependency_graph::{define_graph_view, init_logging};
use log::error;

fn main() {
	init_logging();

	if let Err(err) = define_graph_view(None) {
		error!("dependency-graph: could not define element: {err:?}");
	}
}
