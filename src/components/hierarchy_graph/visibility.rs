//! Collapse/expand over the `shown` flags and the displayed subset derived from them.
//!
//! Collapsing hides every descendant of the clicked node. Expanding only shows
//! its direct children, so a deep subtree is opened one level per click.

use log::debug;

use super::model::GraphModel;
use super::types::{EdgeIdx, NodeIdx};

/// Currently visible nodes and edges. Derived, never stored on the model.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DisplayedSubset {
	pub nodes: Vec<NodeIdx>,
	pub edges: Vec<EdgeIdx>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClickOutcome {
	/// Part of a drag gesture.
	Suppressed,
	/// The node has no children.
	Unchanged,
	Expanded,
	Collapsed,
}

impl ClickOutcome {
	pub fn changed_visibility(self) -> bool {
		matches!(self, ClickOutcome::Expanded | ClickOutcome::Collapsed)
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorClass {
	Root,
	Leaf,
	Collapsed,
	Expanded,
}

impl ColorClass {
	pub fn fill(self) -> &'static str {
		match self {
			ColorClass::Root => "#00ff00",
			ColorClass::Leaf => "#fd8d3c",
			ColorClass::Collapsed => "#3182bd",
			ColorClass::Expanded => "#c6dbef",
		}
	}
}

impl GraphModel {
	pub fn is_shown(&self, idx: NodeIdx) -> bool {
		self.node(idx).shown
	}

	/// Sets `shown` on `idx` and everything below it.
	pub fn set_subtree_visible(&mut self, idx: NodeIdx, visible: bool) {
		let mut stack = vec![idx];
		while let Some(next) = stack.pop() {
			let node = self.node_mut(next);
			node.shown = visible;
			stack.extend(node.children.iter().copied());
		}
	}

	/// Hides all descendants of `idx`, leaving `idx` itself as it is.
	pub fn collapse(&mut self, idx: NodeIdx) {
		for child in self.children_of(idx).to_vec() {
			self.set_subtree_visible(child, false);
		}
	}

	/// Shows the direct children of `idx` only.
	pub fn expand(&mut self, idx: NodeIdx) {
		for child in self.children_of(idx).to_vec() {
			self.node_mut(child).shown = true;
		}
	}

	fn all_children_hidden(&self, idx: NodeIdx) -> bool {
		self.children_of(idx).iter().all(|&c| !self.is_shown(c))
	}

	pub fn on_click(&mut self, idx: NodeIdx, dragged: bool) -> ClickOutcome {
		if dragged {
			return ClickOutcome::Suppressed;
		}
		if self.children_of(idx).is_empty() {
			return ClickOutcome::Unchanged;
		}
		let outcome = if self.all_children_hidden(idx) {
			self.expand(idx);
			ClickOutcome::Expanded
		} else {
			self.collapse(idx);
			ClickOutcome::Collapsed
		};
		let node = self.node(idx);
		debug!("{:?} node {} {:?}", outcome, node.id, node.attributes);
		outcome
	}

	pub fn displayed_nodes(&self) -> Vec<NodeIdx> {
		self.all_nodes()
			.filter(|(_, n)| n.shown)
			.map(|(idx, _)| idx)
			.collect()
	}

	pub fn displayed_edges(&self) -> Vec<EdgeIdx> {
		let shown = |id: &str| self.lookup(id).is_some_and(|idx| self.is_shown(idx));
		self.all_edges()
			.filter(|(_, e)| shown(e.source.as_str()) && shown(e.target.as_str()))
			.map(|(idx, _)| idx)
			.collect()
	}

	pub fn displayed(&self) -> DisplayedSubset {
		DisplayedSubset {
			nodes: self.displayed_nodes(),
			edges: self.displayed_edges(),
		}
	}

	pub fn color_class_for(&self, idx: NodeIdx) -> ColorClass {
		if self.parent_of(idx).is_none() {
			ColorClass::Root
		} else if self.children_of(idx).is_empty() {
			ColorClass::Leaf
		} else if self.all_children_hidden(idx) {
			ColorClass::Collapsed
		} else {
			ColorClass::Expanded
		}
	}
}
