//! Browser entry point for the class hierarchy graph.

use class_hierarchy_graph::{App, init_logging};

fn main() {
	init_logging();
	leptos::mount::mount_to_body(App)
}
