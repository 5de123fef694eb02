pub mod hierarchy_graph;
