use super::layout::ForceConfig;

/// Where the three input files are fetched from, relative to the page.
#[derive(Clone, Debug, PartialEq)]
pub struct DataSource {
	pub nodes_url: String,
	pub parent_links_url: String,
	pub shared_ptr_links_url: String,
}

impl Default for DataSource {
	fn default() -> Self {
		Self {
			nodes_url: "nodes.json".into(),
			parent_links_url: "parent_links.json".into(),
			shared_ptr_links_url: "shared_ptr_links.json".into(),
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct GraphConfig {
	pub source: DataSource,
	pub node_radius: f64,
	/// Clearance left at the target end of an edge for its arrowhead.
	pub tip_offset: f64,
	/// `center` is overwritten from the canvas size when the view mounts.
	pub force: ForceConfig,
}

impl Default for GraphConfig {
	fn default() -> Self {
		Self {
			source: DataSource::default(),
			node_radius: 20.0,
			tip_offset: 8.0,
			force: ForceConfig::default(),
		}
	}
}
