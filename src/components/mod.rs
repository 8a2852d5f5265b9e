//! UI components.

pub mod dependency_graph;
