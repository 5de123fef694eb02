use std::collections::HashMap;
use std::f64::consts::PI;

use web_sys::CanvasRenderingContext2d;

use super::geometry::{Segment, edge_segment};
use super::layout::TickFrame;
use super::model::GraphModel;
use super::state::CanvasState;
use super::types::{EdgeKind, NodeId, Point};
use super::visibility::{ColorClass, DisplayedSubset};

/// Element identity across presents. A hierarchy edge is keyed by its target
/// alone since every node has at most one parent; ownership targets repeat, so
/// those edges also carry the owner.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum EdgeKey {
	Hierarchy { target: NodeId },
	Ownership { owner: NodeId, target: NodeId },
}

#[derive(Clone, Debug, PartialEq)]
pub struct NodeElement {
	pub position: Point,
	pub class: ColorClass,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EdgeElement {
	pub kind: EdgeKind,
	pub source: NodeId,
	pub target: NodeId,
	pub segment: Segment,
}

/// Keys that appeared and disappeared in one [`Scene::present`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SceneDiff {
	pub entered_nodes: Vec<NodeId>,
	pub exited_nodes: Vec<NodeId>,
	pub entered_edges: Vec<EdgeKey>,
	pub exited_edges: Vec<EdgeKey>,
}

/// Retained, keyed display list drawn every frame.
#[derive(Clone, Debug)]
pub struct Scene {
	node_radius: f64,
	tip_offset: f64,
	nodes: HashMap<NodeId, NodeElement>,
	edges: HashMap<EdgeKey, EdgeElement>,
	// Nodes draw in displayed order, the same order hit testing walks backwards.
	node_order: Vec<NodeId>,
	edge_order: Vec<EdgeKey>,
}

impl Scene {
	pub fn new(node_radius: f64, tip_offset: f64) -> Self {
		Self {
			node_radius,
			tip_offset,
			nodes: HashMap::new(),
			edges: HashMap::new(),
			node_order: Vec::new(),
			edge_order: Vec::new(),
		}
	}

	#[cfg(test)]
	pub fn node(&self, id: &NodeId) -> Option<&NodeElement> {
		self.nodes.get(id)
	}

	#[cfg(test)]
	pub fn edge(&self, key: &EdgeKey) -> Option<&EdgeElement> {
		self.edges.get(key)
	}

	pub fn node_count(&self) -> usize {
		self.nodes.len()
	}

	pub fn edge_count(&self) -> usize {
		self.edges.len()
	}

	/// Reconciles the display list with `subset`: new entities get elements,
	/// vanished ones lose theirs, the rest keep their element and only have their
	/// colour class refreshed.
	pub fn present(&mut self, model: &GraphModel, subset: &DisplayedSubset) -> SceneDiff {
		let mut diff = SceneDiff::default();

		let mut wanted_nodes = HashMap::with_capacity(subset.nodes.len());
		for &idx in &subset.nodes {
			let node = model.node(idx);
			wanted_nodes.insert(
				node.id.clone(),
				NodeElement {
					position: node.position,
					class: model.color_class_for(idx),
				},
			);
		}
		self.node_order.retain(|id| {
			let keep = wanted_nodes.contains_key(id);
			if !keep {
				diff.exited_nodes.push(id.clone());
			}
			keep
		});
		for id in &diff.exited_nodes {
			self.nodes.remove(id);
		}
		for &idx in &subset.nodes {
			let id = &model.node(idx).id;
			let Some(fresh) = wanted_nodes.remove(id) else {
				continue;
			};
			match self.nodes.get_mut(id) {
				Some(existing) => existing.class = fresh.class,
				None => {
					diff.entered_nodes.push(id.clone());
					self.nodes.insert(id.clone(), fresh);
				}
			}
		}
		self.node_order = subset
			.nodes
			.iter()
			.map(|&idx| model.node(idx).id.clone())
			.collect();

		let mut wanted_edges = HashMap::with_capacity(subset.edges.len());
		for &e in &subset.edges {
			let edge = model.edge(e);
			let key = match edge.kind {
				EdgeKind::Hierarchy => EdgeKey::Hierarchy {
					target: edge.target.clone(),
				},
				EdgeKind::Ownership => EdgeKey::Ownership {
					owner: edge.source.clone(),
					target: edge.target.clone(),
				},
			};
			wanted_edges.insert(
				key.clone(),
				EdgeElement {
					kind: edge.kind,
					source: edge.source.clone(),
					target: edge.target.clone(),
					segment: Segment::default(),
				},
			);
			if !self.edges.contains_key(&key) && !diff.entered_edges.contains(&key) {
				diff.entered_edges.push(key);
			}
		}
		self.edge_order.retain(|key| {
			let keep = wanted_edges.contains_key(key);
			if !keep {
				diff.exited_edges.push(key.clone());
			}
			keep
		});
		for key in &diff.exited_edges {
			self.edges.remove(key);
		}
		for key in &diff.entered_edges {
			if let Some(element) = wanted_edges.remove(key) {
				self.edge_order.push(key.clone());
				self.edges.insert(key.clone(), element);
			}
		}

		self.route_edges();
		diff
	}

	/// Moves node elements to the tick positions and re-routes the edges.
	pub fn sync(&mut self, frame: &TickFrame<'_>) {
		for (id, position) in &frame.positions {
			if let Some(element) = self.nodes.get_mut(*id) {
				element.position = *position;
			}
		}
		self.route_edges();
	}

	fn route_edges(&mut self) {
		let (radius, tip) = (self.node_radius, self.tip_offset);
		for element in self.edges.values_mut() {
			let source = self.nodes.get(&element.source);
			let target = self.nodes.get(&element.target);
			let (Some(s), Some(t)) = (source, target) else {
				continue;
			};
			element.segment = edge_segment(s.position, t.position, radius, tip);
		}
	}
}

const BACKGROUND: &str = "#ffffff";
const HIERARCHY_COLOR: &str = "green";
const OWNERSHIP_COLOR: &str = "black";
const ARROW_SIZE: f64 = 12.0;

pub fn render(state: &CanvasState, scene: &Scene, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str(BACKGROUND);
	ctx.fill_rect(0.0, 0.0, state.width, state.height);
	ctx.save();
	let _ = ctx.translate(state.transform.x, state.transform.y);
	let _ = ctx.scale(state.transform.k, state.transform.k);
	draw_edges(scene, ctx);
	draw_nodes(state, scene, ctx);
	ctx.restore();
}

fn draw_edges(scene: &Scene, ctx: &CanvasRenderingContext2d) {
	ctx.set_line_width(2.0);
	for key in &scene.edge_order {
		let Some(edge) = scene.edges.get(key) else {
			continue;
		};
		// coincident endpoints: nothing to draw
		let Some((ux, uy)) = edge.segment.direction() else {
			continue;
		};
		let color = match edge.kind {
			EdgeKind::Hierarchy => HIERARCHY_COLOR,
			EdgeKind::Ownership => OWNERSHIP_COLOR,
		};
		let Segment { start, end } = edge.segment;
		ctx.set_stroke_style_str(color);
		ctx.begin_path();
		ctx.move_to(start.x, start.y);
		ctx.line_to(end.x, end.y);
		ctx.stroke();

		// Arrowhead from the segment end up to the target circle.
		let tip = Point::new(end.x + ux * scene.tip_offset, end.y + uy * scene.tip_offset);
		let back = Point::new(tip.x - ux * ARROW_SIZE, tip.y - uy * ARROW_SIZE);
		let notch_at = ARROW_SIZE * 0.75;
		let notch = Point::new(tip.x - ux * notch_at, tip.y - uy * notch_at);
		let (px, py) = (-uy * ARROW_SIZE * 0.5, ux * ARROW_SIZE * 0.5);
		ctx.begin_path();
		ctx.move_to(tip.x, tip.y);
		ctx.line_to(back.x + px, back.y + py);
		ctx.line_to(notch.x, notch.y);
		ctx.line_to(back.x - px, back.y - py);
		ctx.close_path();
		match edge.kind {
			EdgeKind::Hierarchy => {
				ctx.set_fill_style_str(HIERARCHY_COLOR);
				ctx.fill();
			}
			EdgeKind::Ownership => {
				ctx.set_line_width(1.0);
				ctx.stroke();
				ctx.set_line_width(2.0);
			}
		}
	}
}

fn draw_nodes(state: &CanvasState, scene: &Scene, ctx: &CanvasRenderingContext2d) {
	let dragged = state
		.gesture
		.node()
		.filter(|&idx| state.session.is_dragging(idx))
		.map(|idx| &state.session.model().node(idx).id);

	ctx.set_font("12px sans-serif");
	for id in &scene.node_order {
		let Some(node) = scene.nodes.get(id) else {
			continue;
		};
		let Point { x, y } = node.position;
		ctx.begin_path();
		let _ = ctx.arc(x, y, scene.node_radius, 0.0, 2.0 * PI);
		ctx.set_fill_style_str(node.class.fill());
		ctx.fill();
		if dragged == Some(id) {
			ctx.set_stroke_style_str("black");
			ctx.set_line_width(1.5);
			ctx.stroke();
		}

		ctx.set_fill_style_str("black");
		let _ = ctx.fill_text(id.as_str(), x + scene.node_radius + 3.0, y + 4.0);
	}
}
