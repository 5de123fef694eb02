use std::f64::consts::PI;

use log::info;

use super::layout::{ForceConfig, LayoutDriver, TickFrame};
use super::model::GraphModel;
use super::types::{NodeIdx, Point};
use super::visibility::DisplayedSubset;

const SEED_RADIUS: f64 = 100.0;

/// Everything one page needs to explore a graph: the model and the simulation
/// laid out over its displayed subset. Created once after the data is loaded.
///
/// A [`GraphModel`] only exists once its input passed validation, so a
/// malformed graph never gets a simulation.
pub struct GraphSession {
	model: GraphModel,
	layout: LayoutDriver,
}

impl GraphSession {
	pub fn new(mut model: GraphModel, force: ForceConfig) -> Self {
		seed_positions(&mut model, force.center);
		let mut layout = LayoutDriver::new(force);
		layout.rebuild(&model, &model.displayed());
		info!("Graph session started with {} nodes", model.node_count());
		Self { model, layout }
	}

	pub fn model(&self) -> &GraphModel {
		&self.model
	}

	#[cfg(test)]
	pub fn layout(&self) -> &LayoutDriver {
		&self.layout
	}

	pub fn displayed(&self) -> DisplayedSubset {
		self.model.displayed()
	}

	pub fn on_tick(&mut self, listener: impl FnMut(&TickFrame<'_>) + 'static) {
		self.layout.on_tick(listener);
	}

	/// Toggles `idx` and, when visibility changed, feeds the new subset to the
	/// simulation and returns it for presentation.
	pub fn click(&mut self, idx: NodeIdx, dragged: bool) -> Option<DisplayedSubset> {
		if !self.model.on_click(idx, dragged).changed_visibility() {
			return None;
		}
		let subset = self.model.displayed();
		self.layout.rebuild(&self.model, &subset);
		Some(subset)
	}

	pub fn drag_start(&mut self, idx: NodeIdx) {
		let at = self.model.position(idx);
		self.layout.pin(&mut self.model, idx, at);
	}

	pub fn drag_move(&mut self, idx: NodeIdx, to: Point) {
		self.layout.pin(&mut self.model, idx, to);
		self.layout.notify(&self.model);
	}

	pub fn drag_end(&mut self, idx: NodeIdx) {
		self.layout.release(idx);
	}

	pub fn is_dragging(&self, idx: NodeIdx) -> bool {
		self.layout.is_pinned(idx)
	}

	pub fn tick(&mut self, dt: f32) -> bool {
		self.layout.step(&mut self.model, dt)
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.layout.set_center(Point::new(width / 2.0, height / 2.0));
	}

	/// Topmost displayed node whose circle contains `at`. Nodes are drawn in
	/// displayed order, so the last hit wins.
	pub fn node_at(&self, at: Point, radius: f64) -> Option<NodeIdx> {
		self.model
			.displayed_nodes()
			.into_iter()
			.rev()
			.find(|&idx| self.model.position(idx).distance(at) <= radius)
	}
}

fn seed_positions(model: &mut GraphModel, center: Point) {
	let count = model.node_count().max(1) as f64;
	let nodes: Vec<NodeIdx> = model.all_nodes().map(|(idx, _)| idx).collect();
	for (i, idx) in nodes.into_iter().enumerate() {
		let angle = (i as f64) * 2.0 * PI / count;
		let (dx, dy) = (SEED_RADIUS * angle.cos(), SEED_RADIUS * angle.sin());
		model.set_position(idx, Point::new(center.x + dx, center.y + dy));
	}
}
