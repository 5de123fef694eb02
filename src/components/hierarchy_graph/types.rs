use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;

/// One entry of `nodes.json`. Everything except `id` is carried along untouched.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct NodeRecord {
	pub id: String,
	#[serde(flatten)]
	pub attributes: BTreeMap<String, serde_json::Value>,
}

/// One entry of `parent_links.json`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ParentLinkRecord {
	pub parent: String,
	pub child: String,
}

/// One entry of `shared_ptr_links.json`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct SharedPtrLinkRecord {
	pub owner: String,
	pub target: String,
}

/// The three input lists as fetched at startup.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphData {
	pub nodes: Vec<NodeRecord>,
	pub parent_links: Vec<ParentLinkRecord>,
	pub shared_ptr_links: Vec<SharedPtrLinkRecord>,
}

#[cfg(test)]
impl NodeRecord {
	pub fn new(id: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			attributes: BTreeMap::new(),
		}
	}
}

#[cfg(test)]
impl ParentLinkRecord {
	pub fn new(parent: impl Into<String>, child: impl Into<String>) -> Self {
		Self {
			parent: parent.into(),
			child: child.into(),
		}
	}
}

#[cfg(test)]
impl SharedPtrLinkRecord {
	pub fn new(owner: impl Into<String>, target: impl Into<String>) -> Self {
		Self {
			owner: owner.into(),
			target: target.into(),
		}
	}
}

/// Stable node identity as given by the input data.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub String);

impl NodeId {
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for NodeId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<&str> for NodeId {
	fn from(id: &str) -> Self {
		Self(id.to_string())
	}
}

/// Position of a node inside the model's node table. Valid for the whole session
/// since nodes are never removed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeIdx(pub usize);

/// Position of an edge inside the model's edge table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdgeIdx(pub usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EdgeKind {
	/// Parent to child; the union of these forms the tree.
	Hierarchy,
	/// Owner to target; may cross subtrees.
	Ownership,
}

impl fmt::Display for EdgeKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			EdgeKind::Hierarchy => f.write_str("hierarchy"),
			EdgeKind::Ownership => f.write_str("ownership"),
		}
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
	pub x: f64,
	pub y: f64,
}

impl Point {
	pub const fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}

	pub fn distance(self, other: Point) -> f64 {
		let (dx, dy) = (other.x - self.x, other.y - self.y);
		(dx * dx + dy * dy).sqrt()
	}
}
