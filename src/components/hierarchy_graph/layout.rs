//! Drives the `force_graph` simulation for whatever subset is currently displayed.
//!
//! `force_graph` supplies many-body repulsion and integration. On top of that each
//! step applies a rest-length spring along every displayed edge and a centering
//! translation, all scaled by `alpha`, which decays to rest and is restarted by
//! [`LayoutDriver::rebuild`] and drag release.

use std::collections::{HashMap, HashSet};

use force_graph::{ForceGraph, NodeData, SimulationParameters};
use log::{debug, info};

use super::model::GraphModel;
use super::types::{NodeId, NodeIdx, Point};
use super::visibility::DisplayedSubset;

#[derive(Clone, Debug, PartialEq)]
pub struct ForceConfig {
	/// Magnitude of the repulsion between every pair of displayed nodes.
	pub charge_strength: f32,
	/// Rest length of edge springs.
	pub link_distance: f64,
	pub center: Point,
	pub alpha_restart: f64,
	pub alpha_min: f64,
	pub alpha_decay: f64,
	pub node_mass: f32,
	pub max_force: f32,
	pub node_speed: f32,
	pub damping: f32,
}

impl Default for ForceConfig {
	fn default() -> Self {
		let alpha_min = 0.001_f64;
		Self {
			charge_strength: 25.0,
			link_distance: 100.0,
			center: Point::default(),
			alpha_restart: 1.0,
			alpha_min,
			alpha_decay: 1.0 - alpha_min.powf(1.0 / 300.0),
			node_mass: 10.0,
			max_force: 100.0,
			node_speed: 3000.0,
			damping: 0.9,
		}
	}
}

impl ForceConfig {
	fn parameters(&self) -> SimulationParameters {
		SimulationParameters {
			force_charge: self.charge_strength,
			// Edge springs are applied by the driver so they can have a rest length.
			force_spring: 0.0,
			force_max: self.max_force,
			node_speed: self.node_speed,
			damping_factor: self.damping,
		}
	}
}

/// Spring along one displayed edge. Stiffness and the split of the correction
/// between the endpoints follow their degrees, so hubs move less.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Link {
	pub source: NodeIdx,
	pub target: NodeIdx,
	pub strength: f64,
	pub bias: f64,
}

/// Positions handed to tick listeners after every step.
#[derive(Debug)]
pub struct TickFrame<'a> {
	pub positions: Vec<(&'a NodeId, Point)>,
}

type TickListener = Box<dyn FnMut(&TickFrame<'_>)>;

pub struct LayoutDriver {
	config: ForceConfig,
	graph: ForceGraph<NodeIdx, ()>,
	links: Vec<Link>,
	pinned: HashSet<NodeIdx>,
	alpha: f64,
	listeners: Vec<TickListener>,
}

impl LayoutDriver {
	pub fn new(config: ForceConfig) -> Self {
		Self {
			graph: ForceGraph::new(config.parameters()),
			config,
			links: Vec::new(),
			pinned: HashSet::new(),
			alpha: 0.0,
			listeners: Vec::new(),
		}
	}

	#[cfg(test)]
	pub fn config(&self) -> &ForceConfig {
		&self.config
	}

	#[cfg(test)]
	pub fn alpha(&self) -> f64 {
		self.alpha
	}

	#[cfg(test)]
	pub fn links(&self) -> &[Link] {
		&self.links
	}

	pub fn is_active(&self) -> bool {
		self.alpha >= self.config.alpha_min
	}

	pub fn restart(&mut self) {
		self.alpha = self.config.alpha_restart;
	}

	#[cfg(test)]
	pub fn node_count(&self) -> usize {
		let mut count = 0;
		self.graph.visit_nodes(|_| count += 1);
		count
	}

	/// Replaces the simulated node and edge set with `subset`.
	///
	/// Nodes are seeded from their model positions, so a node that is shown again
	/// reappears where it was hidden. Free nodes stacked on exactly the same spot
	/// are spread out slightly first.
	pub fn rebuild(&mut self, model: &GraphModel, subset: &DisplayedSubset) {
		let mut graph = ForceGraph::new(self.config.parameters());
		self.pinned.retain(|idx| model.is_shown(*idx));
		let mut taken: HashSet<(u32, u32)> = self
			.pinned
			.iter()
			.map(|&idx| bits(model.position(idx)))
			.collect();
		for &idx in &subset.nodes {
			let is_anchor = self.pinned.contains(&idx);
			let (x, y) = if is_anchor {
				let p = model.position(idx);
				(p.x as f32, p.y as f32)
			} else {
				unstack(model.position(idx), idx, &mut taken)
			};
			graph.add_node(NodeData {
				x,
				y,
				mass: self.config.node_mass,
				is_anchor,
				user_data: idx,
			});
		}
		self.graph = graph;

		let mut degree: HashMap<NodeIdx, usize> = HashMap::new();
		let endpoints: Vec<(NodeIdx, NodeIdx)> = subset
			.edges
			.iter()
			.filter_map(|&e| {
				let edge = model.edge(e);
				Some((
					model.lookup(edge.source.as_str())?,
					model.lookup(edge.target.as_str())?,
				))
			})
			.collect();
		for &(s, t) in &endpoints {
			*degree.entry(s).or_default() += 1;
			*degree.entry(t).or_default() += 1;
		}
		self.links = endpoints
			.into_iter()
			.map(|(source, target)| {
				let (ds, dt) = (degree[&source] as f64, degree[&target] as f64);
				Link {
					source,
					target,
					strength: 1.0 / ds.min(dt),
					bias: ds / (ds + dt),
				}
			})
			.collect();

		self.restart();
		debug!(
			"Layout rebuilt with {} nodes and {} links",
			subset.nodes.len(),
			self.links.len()
		);
	}

	pub fn on_tick(&mut self, listener: impl FnMut(&TickFrame<'_>) + 'static) {
		self.listeners.push(Box::new(listener));
	}

	/// Advances the simulation by `dt` seconds. Returns `false` once at rest.
	pub fn step(&mut self, model: &mut GraphModel, dt: f32) -> bool {
		if !self.is_active() {
			return false;
		}
		self.alpha += (0.0 - self.alpha) * self.config.alpha_decay;
		self.graph.update(dt * self.alpha as f32);

		let mut positions: HashMap<NodeIdx, Point> = HashMap::new();
		self.graph.visit_nodes(|node| {
			positions.insert(
				node.data.user_data,
				Point::new(node.x() as f64, node.y() as f64),
			);
		});
		relax_links(
			&self.links,
			&mut positions,
			self.alpha,
			self.config.link_distance,
			&self.pinned,
		);
		center(&mut positions, self.config.center, &self.pinned);

		self.graph.visit_nodes_mut(|node| {
			if node.data.is_anchor {
				return;
			}
			if let Some(p) = positions.get(&node.data.user_data) {
				node.data.x = p.x as f32;
				node.data.y = p.y as f32;
			}
		});
		for (idx, p) in positions {
			model.set_position(idx, p);
		}
		if !self.is_active() {
			info!("Layout settled");
		}
		self.notify(model);
		true
	}

	/// Holds `idx` at `position`, outside the physics, until [`release`](Self::release).
	pub fn pin(&mut self, model: &mut GraphModel, idx: NodeIdx, position: Point) {
		self.pinned.insert(idx);
		model.set_position(idx, position);
		self.graph.visit_nodes_mut(|node| {
			if node.data.user_data == idx {
				node.data.x = position.x as f32;
				node.data.y = position.y as f32;
				node.data.is_anchor = true;
			}
		});
	}

	pub fn release(&mut self, idx: NodeIdx) {
		self.pinned.remove(&idx);
		self.graph.visit_nodes_mut(|node| {
			if node.data.user_data == idx {
				node.data.is_anchor = false;
			}
		});
		self.restart();
	}

	pub fn is_pinned(&self, idx: NodeIdx) -> bool {
		self.pinned.contains(&idx)
	}

	pub fn set_center(&mut self, center: Point) {
		self.config.center = center;
		self.restart();
	}

	/// Calls every tick listener with the current positions of the simulated nodes.
	pub fn notify(&mut self, model: &GraphModel) {
		if self.listeners.is_empty() {
			return;
		}
		let mut positions = Vec::new();
		self.graph.visit_nodes(|node| {
			let idx = node.data.user_data;
			positions.push((&model.node(idx).id, model.position(idx)));
		});
		let frame = TickFrame { positions };
		for listener in &mut self.listeners {
			listener(&frame);
		}
	}
}

// Golden angle: successive nudges around one spot never line up.
const UNSTACK_TURN: f32 = 2.399_963;
const UNSTACK_RADIUS: f32 = 1.0;

fn bits(p: Point) -> (u32, u32) {
	((p.x as f32).to_bits(), (p.y as f32).to_bits())
}

/// Claims a simulation position for a node seeded at `p`. A spot already taken
/// is left for a point on a small circle around it, since repulsion has no
/// direction between coincident nodes.
fn unstack(p: Point, idx: NodeIdx, taken: &mut HashSet<(u32, u32)>) -> (f32, f32) {
	let (x0, y0) = (p.x as f32, p.y as f32);
	let (mut x, mut y) = (x0, y0);
	let mut turn = idx.0 as f32;
	while !taken.insert((x.to_bits(), y.to_bits())) {
		turn += 1.0;
		x = x0 + UNSTACK_RADIUS * (turn * UNSTACK_TURN).cos();
		y = y0 + UNSTACK_RADIUS * (turn * UNSTACK_TURN).sin();
	}
	(x, y)
}

/// Moves the endpoints of each link toward its rest length.
fn relax_links(
	links: &[Link],
	positions: &mut HashMap<NodeIdx, Point>,
	alpha: f64,
	distance: f64,
	pinned: &HashSet<NodeIdx>,
) {
	for link in links {
		let source = positions.get(&link.source).copied();
		let target = positions.get(&link.target).copied();
		let (Some(s), Some(t)) = (source, target) else {
			continue;
		};
		let (mut dx, mut dy) = (t.x - s.x, t.y - s.y);
		let len = (dx * dx + dy * dy).sqrt();
		if len < f64::EPSILON {
			continue;
		}
		let k = (len - distance) / len * alpha * link.strength;
		dx *= k;
		dy *= k;
		if !pinned.contains(&link.target) {
			if let Some(p) = positions.get_mut(&link.target) {
				p.x -= dx * link.bias;
				p.y -= dy * link.bias;
			}
		}
		if !pinned.contains(&link.source) {
			if let Some(p) = positions.get_mut(&link.source) {
				p.x += dx * (1.0 - link.bias);
				p.y += dy * (1.0 - link.bias);
			}
		}
	}
}

/// Translates the free nodes so the layout's mean sits on `target`.
fn center(positions: &mut HashMap<NodeIdx, Point>, target: Point, pinned: &HashSet<NodeIdx>) {
	if positions.is_empty() {
		return;
	}
	let n = positions.len() as f64;
	let (sx, sy) = positions
		.values()
		.fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
	let (shift_x, shift_y) = (target.x - sx / n, target.y - sy / n);
	for (idx, p) in positions.iter_mut() {
		if pinned.contains(idx) {
			continue;
		}
		p.x += shift_x;
		p.y += shift_y;
	}
}

#[cfg(test)]
mod tests {
	use std::cell::RefCell;
	use std::rc::Rc;

	use super::super::model::tests::{idx, sample_model};
	use super::*;

	fn spread(model: &mut GraphModel) {
		let nodes: Vec<_> = model.all_nodes().map(|(i, _)| i).collect();
		for (n, i) in nodes.into_iter().enumerate() {
			model.set_position(i, Point::new(40.0 * n as f64, 25.0 * (n % 3) as f64));
		}
	}

	fn driver_for(model: &GraphModel) -> LayoutDriver {
		let mut layout = LayoutDriver::new(ForceConfig {
			center: Point::new(400.0, 300.0),
			..ForceConfig::default()
		});
		layout.rebuild(model, &model.displayed());
		layout
	}

	#[test]
	fn rebuild_is_idempotent() {
		let mut model = sample_model();
		spread(&mut model);
		let mut layout = driver_for(&model);
		let config = layout.config().clone();
		let links = layout.links().to_vec();
		let nodes = layout.node_count();

		layout.rebuild(&model, &model.displayed());
		assert_eq!(layout.config(), &config);
		assert_eq!(layout.links(), links.as_slice());
		assert_eq!(layout.node_count(), nodes);
		assert_eq!(layout.alpha(), config.alpha_restart);
	}

	#[test]
	fn rebuild_tracks_displayed_subset() {
		let mut model = sample_model();
		spread(&mut model);
		let mut layout = driver_for(&model);
		assert_eq!(layout.node_count(), 7);
		assert_eq!(layout.links().len(), 8);

		model.collapse(idx(&model, "Shape"));
		layout.rebuild(&model, &model.displayed());
		assert_eq!(layout.node_count(), 3);
		// Object-Shape, Object-Canvas, Canvas-Shape
		assert_eq!(layout.links().len(), 3);
	}

	#[test]
	fn link_strength_follows_degree() {
		let mut model = sample_model();
		spread(&mut model);
		let layout = driver_for(&model);
		let (object, shape) = (idx(&model, "Object"), idx(&model, "Shape"));
		let link = layout
			.links()
			.iter()
			.find(|l| l.source == object && l.target == shape)
			.unwrap();
		// Object has degree 2, Shape has degree 4 (parent, two children, Canvas).
		assert_eq!(link.strength, 0.5);
		assert!((link.bias - 2.0 / 6.0).abs() < 1e-12);
	}

	#[test]
	fn relaxing_a_stretched_link_reaches_rest_length() {
		let (a, b) = (NodeIdx(0), NodeIdx(1));
		let links = [Link {
			source: a,
			target: b,
			strength: 1.0,
			bias: 0.5,
		}];
		let mut positions = HashMap::new();
		positions.insert(a, Point::new(0.0, 0.0));
		positions.insert(b, Point::new(300.0, 0.0));
		relax_links(&links, &mut positions, 1.0, 100.0, &HashSet::new());
		assert!((positions[&a].x - 100.0).abs() < 1e-9);
		assert!((positions[&b].x - 200.0).abs() < 1e-9);
	}

	#[test]
	fn relaxing_skips_coincident_and_pinned_endpoints() {
		let (a, b, c) = (NodeIdx(0), NodeIdx(1), NodeIdx(2));
		let links = [
			Link {
				source: a,
				target: b,
				strength: 1.0,
				bias: 0.5,
			},
			Link {
				source: b,
				target: c,
				strength: 1.0,
				bias: 0.5,
			},
		];
		let mut positions = HashMap::from([
			(a, Point::new(5.0, 5.0)),
			(b, Point::new(5.0, 5.0)),
			(c, Point::new(305.0, 5.0)),
		]);
		relax_links(&links, &mut positions, 1.0, 100.0, &HashSet::from([b]));
		assert_eq!(positions[&a], Point::new(5.0, 5.0));
		assert_eq!(positions[&b], Point::new(5.0, 5.0));
		assert!((positions[&c].x - 205.0).abs() < 1e-9);
	}

	#[test]
	fn centering_moves_mean_to_target() {
		let mut positions = HashMap::from([
			(NodeIdx(0), Point::new(0.0, 0.0)),
			(NodeIdx(1), Point::new(10.0, 20.0)),
		]);
		center(&mut positions, Point::new(100.0, 100.0), &HashSet::new());
		assert_eq!(positions[&NodeIdx(0)], Point::new(95.0, 90.0));
		assert_eq!(positions[&NodeIdx(1)], Point::new(105.0, 110.0));
	}

	#[test]
	fn energy_decays_to_rest_and_restarts() {
		let mut model = sample_model();
		spread(&mut model);
		let mut layout = driver_for(&model);
		let mut steps = 0;
		while layout.step(&mut model, 0.016) {
			steps += 1;
			assert!(steps < 1000, "simulation never settled");
		}
		assert!((299..=302).contains(&steps), "settled after {steps} steps");
		assert!(!layout.is_active());

		layout.rebuild(&model, &model.displayed());
		assert!(layout.is_active());
		assert!(layout.step(&mut model, 0.016));
	}

	#[test]
	fn step_writes_positions_back_and_notifies() {
		let mut model = sample_model();
		spread(&mut model);
		let mut layout = driver_for(&model);
		let frames = Rc::new(RefCell::new(Vec::new()));
		let sink = frames.clone();
		layout.on_tick(move |frame| sink.borrow_mut().push(frame.positions.len()));

		assert!(layout.step(&mut model, 0.016));
		assert_eq!(*frames.borrow(), vec![7]);

		let mut sum = Point::default();
		for (_, node) in model.all_nodes() {
			sum.x += node.position.x;
			sum.y += node.position.y;
		}
		assert!((sum.x / 7.0 - 400.0).abs() < 1e-3);
		assert!((sum.y / 7.0 - 300.0).abs() < 1e-3);
	}

	#[test]
	fn stacked_nodes_separate() {
		let mut model = sample_model();
		let nodes: Vec<_> = model.all_nodes().map(|(i, _)| i).collect();
		for &i in &nodes {
			model.set_position(i, Point::new(50.0, 50.0));
		}
		let mut layout = driver_for(&model);
		for _ in 0..5 {
			layout.step(&mut model, 0.016);
		}

		for (n, &a) in nodes.iter().enumerate() {
			let pa = model.position(a);
			assert!(pa.x.is_finite() && pa.y.is_finite());
			for &b in &nodes[n + 1..] {
				let gap = pa.distance(model.position(b));
				assert!(gap > 0.1, "{a:?} and {b:?} are still stacked");
			}
		}
	}

	#[test]
	fn unstack_keeps_free_spots_and_moves_taken_ones() {
		let mut taken = HashSet::new();
		let p = Point::new(5.0, 5.0);
		assert_eq!(unstack(p, NodeIdx(0), &mut taken), (5.0, 5.0));

		let (x, y) = unstack(p, NodeIdx(1), &mut taken);
		let moved = Point::new(x as f64, y as f64).distance(p);
		assert!((moved - UNSTACK_RADIUS as f64).abs() < 1e-3);
		assert_eq!(taken.len(), 2);
	}

	#[test]
	fn pinned_node_stays_put() {
		let mut model = sample_model();
		spread(&mut model);
		let mut layout = driver_for(&model);
		let shape = idx(&model, "Shape");
		layout.pin(&mut model, shape, Point::new(10.0, 10.0));
		for _ in 0..20 {
			layout.step(&mut model, 0.016);
		}
		assert_eq!(model.position(shape), Point::new(10.0, 10.0));

		layout.release(shape);
		assert!(!layout.is_pinned(shape));
		assert_eq!(layout.alpha(), layout.config().alpha_restart);
	}
}
