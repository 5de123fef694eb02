//! Node and edge tables built once from the loaded data.
//!
//! Nodes own their tree links as indices into the node table. Edges only hold
//! node ids and are resolved through the id index, so the displayed edge set can
//! be filtered and rebuilt without touching the tree.

use std::collections::{BTreeMap, HashMap};

use super::error::{MalformedGraphError, Result};
use super::types::{
	EdgeIdx, EdgeKind, GraphData, NodeId, NodeIdx, NodeRecord, ParentLinkRecord, Point,
	SharedPtrLinkRecord,
};

#[derive(Clone, Debug)]
pub struct Node {
	pub id: NodeId,
	pub attributes: BTreeMap<String, serde_json::Value>,
	pub parent: Option<NodeIdx>,
	pub children: Vec<NodeIdx>,
	pub shown: bool,
	pub position: Point,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Edge {
	pub kind: EdgeKind,
	pub source: NodeId,
	pub target: NodeId,
}

#[derive(Clone, Debug, Default)]
pub struct GraphModel {
	nodes: Vec<Node>,
	edges: Vec<Edge>,
	index: HashMap<NodeId, NodeIdx>,
}

impl GraphModel {
	pub fn from_data(data: &GraphData) -> Result<Self> {
		Self::load(&data.nodes, &data.parent_links, &data.shared_ptr_links)
	}

	pub fn load(
		nodes: &[NodeRecord],
		parent_links: &[ParentLinkRecord],
		shared_ptr_links: &[SharedPtrLinkRecord],
	) -> Result<Self> {
		let mut model = GraphModel {
			nodes: Vec::with_capacity(nodes.len()),
			edges: Vec::with_capacity(parent_links.len() + shared_ptr_links.len()),
			index: HashMap::with_capacity(nodes.len()),
		};

		for record in nodes {
			let id = NodeId(record.id.clone());
			if model.index.contains_key(&id) {
				return Err(MalformedGraphError::DuplicateNode {
					id: record.id.clone(),
				});
			}
			model.index.insert(id.clone(), NodeIdx(model.nodes.len()));
			model.nodes.push(Node {
				id,
				attributes: record.attributes.clone(),
				parent: None,
				children: Vec::new(),
				shown: true,
				position: Point::default(),
			});
		}

		for link in parent_links {
			let parent = model.resolve(EdgeKind::Hierarchy, &link.parent)?;
			let child = model.resolve(EdgeKind::Hierarchy, &link.child)?;
			if let Some(first) = model.nodes[child.0].parent {
				return Err(MalformedGraphError::MultipleParents {
					child: link.child.clone(),
					first: model.nodes[first.0].id.0.clone(),
					second: link.parent.clone(),
				});
			}
			model.nodes[child.0].parent = Some(parent);
			model.nodes[parent.0].children.push(child);
			model.edges.push(Edge {
				kind: EdgeKind::Hierarchy,
				source: model.nodes[parent.0].id.clone(),
				target: model.nodes[child.0].id.clone(),
			});
		}

		for link in shared_ptr_links {
			let owner = model.resolve(EdgeKind::Ownership, &link.owner)?;
			let target = model.resolve(EdgeKind::Ownership, &link.target)?;
			model.edges.push(Edge {
				kind: EdgeKind::Ownership,
				source: model.nodes[owner.0].id.clone(),
				target: model.nodes[target.0].id.clone(),
			});
		}

		model.check_acyclic()?;
		Ok(model)
	}

	fn resolve(&self, kind: EdgeKind, id: &str) -> Result<NodeIdx> {
		self.index
			.get(&NodeId::from(id))
			.copied()
			.ok_or_else(|| MalformedGraphError::UnknownNode {
				kind,
				id: id.to_string(),
			})
	}

	// Every node has at most one parent, so a node sits on a cycle exactly when
	// it cannot be reached by walking down from a root.
	fn check_acyclic(&self) -> Result<()> {
		let mut reached = vec![false; self.nodes.len()];
		let mut stack: Vec<NodeIdx> = self.roots().collect();
		while let Some(idx) = stack.pop() {
			reached[idx.0] = true;
			stack.extend(self.nodes[idx.0].children.iter().copied());
		}
		match reached.iter().position(|r| !r) {
			Some(i) => Err(MalformedGraphError::Cycle {
				id: self.nodes[i].id.0.clone(),
			}),
			None => Ok(()),
		}
	}

	pub fn all_nodes(&self) -> impl Iterator<Item = (NodeIdx, &Node)> {
		self.nodes.iter().enumerate().map(|(i, n)| (NodeIdx(i), n))
	}

	pub fn all_edges(&self) -> impl Iterator<Item = (EdgeIdx, &Edge)> {
		self.edges.iter().enumerate().map(|(i, e)| (EdgeIdx(i), e))
	}

	pub fn node_count(&self) -> usize {
		self.nodes.len()
	}

	pub fn node(&self, idx: NodeIdx) -> &Node {
		&self.nodes[idx.0]
	}

	pub(crate) fn node_mut(&mut self, idx: NodeIdx) -> &mut Node {
		&mut self.nodes[idx.0]
	}

	pub fn edge(&self, idx: EdgeIdx) -> &Edge {
		&self.edges[idx.0]
	}

	pub fn lookup(&self, id: &str) -> Option<NodeIdx> {
		self.index.get(&NodeId::from(id)).copied()
	}

	pub fn children_of(&self, idx: NodeIdx) -> &[NodeIdx] {
		&self.nodes[idx.0].children
	}

	pub fn parent_of(&self, idx: NodeIdx) -> Option<NodeIdx> {
		self.nodes[idx.0].parent
	}

	pub fn roots(&self) -> impl Iterator<Item = NodeIdx> + '_ {
		self.all_nodes()
			.filter(|(_, n)| n.parent.is_none())
			.map(|(idx, _)| idx)
	}

	pub fn position(&self, idx: NodeIdx) -> Point {
		self.nodes[idx.0].position
	}

	pub fn set_position(&mut self, idx: NodeIdx, position: Point) {
		self.nodes[idx.0].position = position;
	}
}
