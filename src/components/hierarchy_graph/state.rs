use super::session::GraphSession;
use super::types::{NodeIdx, Point};

#[derive(Clone, Debug, Default)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

impl ViewTransform {
	pub fn identity() -> Self {
		Self {
			x: 0.0,
			y: 0.0,
			k: 1.0,
		}
	}

	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> Point {
		Point::new((sx - self.x) / self.k, (sy - self.y) / self.k)
	}

	/// Zooms by one wheel notch, keeping the graph point under the cursor fixed.
	pub fn zoom_at(&mut self, sx: f64, sy: f64, zoom_in: bool) {
		let factor = if zoom_in { 1.1 } else { 0.9 };
		let new_k = (self.k * factor).clamp(0.1, 10.0);
		let ratio = new_k / self.k;
		self.x = sx - (sx - self.x) * ratio;
		self.y = sy - (sy - self.y) * ratio;
		self.k = new_k;
	}
}

/// What the pointer did while pressed on a node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GestureEvent {
	DragStart(NodeIdx),
	DragMove(NodeIdx, Point),
	DragEnd(NodeIdx),
	Click { node: NodeIdx, dragged: bool },
}

/// Splits a press on a node into either a click or a drag. Any pointer movement
/// while pressed makes it a drag, and a drag's release still reports the click
/// with `dragged` set so it can be ignored.
#[derive(Clone, Debug, Default)]
pub struct GestureTracker {
	node: Option<NodeIdx>,
	start: Point,
	node_start: Point,
	dragged: bool,
}

impl GestureTracker {
	pub fn is_active(&self) -> bool {
		self.node.is_some()
	}

	pub fn node(&self) -> Option<NodeIdx> {
		self.node
	}

	/// `pointer` and `node_at` are both in graph space.
	pub fn press(&mut self, node: NodeIdx, pointer: Point, node_at: Point) {
		*self = Self {
			node: Some(node),
			start: pointer,
			node_start: node_at,
			dragged: false,
		};
	}

	pub fn motion(&mut self, pointer: Point) -> Vec<GestureEvent> {
		let Some(node) = self.node else {
			return Vec::new();
		};
		if pointer == self.start && !self.dragged {
			return Vec::new();
		}
		let mut events = Vec::with_capacity(2);
		if !self.dragged {
			self.dragged = true;
			events.push(GestureEvent::DragStart(node));
		}
		let to = Point::new(
			self.node_start.x + (pointer.x - self.start.x),
			self.node_start.y + (pointer.y - self.start.y),
		);
		events.push(GestureEvent::DragMove(node, to));
		events
	}

	pub fn release(&mut self) -> Vec<GestureEvent> {
		let Some(node) = self.node.take() else {
			return Vec::new();
		};
		let dragged = std::mem::take(&mut self.dragged);
		let mut events = Vec::with_capacity(2);
		if dragged {
			events.push(GestureEvent::DragEnd(node));
		}
		events.push(GestureEvent::Click { node, dragged });
		events
	}

	/// Pointer left the canvas: finish a drag without delivering a click.
	pub fn cancel(&mut self) -> Option<GestureEvent> {
		let node = self.node.take()?;
		std::mem::take(&mut self.dragged).then_some(GestureEvent::DragEnd(node))
	}
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

pub struct CanvasState {
	pub session: GraphSession,
	pub transform: ViewTransform,
	pub gesture: GestureTracker,
	pub pan: PanState,
	pub width: f64,
	pub height: f64,
	pub node_radius: f64,
}

impl CanvasState {
	pub fn new(session: GraphSession, width: f64, height: f64, node_radius: f64) -> Self {
		Self {
			session,
			transform: ViewTransform::identity(),
			gesture: GestureTracker::default(),
			pan: PanState::default(),
			width,
			height,
			node_radius,
		}
	}

	pub fn node_at_position(&self, sx: f64, sy: f64) -> Option<NodeIdx> {
		let at = self.transform.screen_to_graph(sx, sy);
		self.session.node_at(at, self.node_radius)
	}

	/// Applies gesture events to the session. Returns `true` when visibility
	/// changed and the scene must be re-presented.
	pub fn apply(&mut self, events: Vec<GestureEvent>) -> bool {
		let mut changed = false;
		for event in events {
			match event {
				GestureEvent::DragStart(node) => self.session.drag_start(node),
				GestureEvent::DragMove(node, to) => self.session.drag_move(node, to),
				GestureEvent::DragEnd(node) => self.session.drag_end(node),
				GestureEvent::Click { node, dragged } => {
					changed |= self.session.click(node, dragged).is_some();
				}
			}
		}
		changed
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
		self.session.resize(width, height);
	}
}

#[cfg(test)]
mod tests {
	use super::super::layout::ForceConfig;
	use super::super::model::tests::{idx, sample_model};
	use super::*;

	#[test]
	fn press_and_release_in_place_is_a_click() {
		let mut g = GestureTracker::default();
		g.press(NodeIdx(3), Point::new(1.0, 1.0), Point::new(0.0, 0.0));
		assert!(g.motion(Point::new(1.0, 1.0)).is_empty());
		assert_eq!(
			g.release(),
			vec![GestureEvent::Click {
				node: NodeIdx(3),
				dragged: false,
			}]
		);
		assert!(!g.is_active());
	}

	#[test]
	fn movement_turns_press_into_drag() {
		let mut g = GestureTracker::default();
		g.press(NodeIdx(1), Point::new(10.0, 10.0), Point::new(50.0, 60.0));
		assert_eq!(
			g.motion(Point::new(12.0, 15.0)),
			vec![
				GestureEvent::DragStart(NodeIdx(1)),
				GestureEvent::DragMove(NodeIdx(1), Point::new(52.0, 65.0)),
			]
		);
		assert_eq!(
			g.motion(Point::new(10.0, 10.0)),
			vec![GestureEvent::DragMove(NodeIdx(1), Point::new(50.0, 60.0))]
		);
		assert_eq!(
			g.release(),
			vec![
				GestureEvent::DragEnd(NodeIdx(1)),
				GestureEvent::Click {
					node: NodeIdx(1),
					dragged: true,
				},
			]
		);
	}

	#[test]
	fn cancel_only_ends_a_drag() {
		let mut g = GestureTracker::default();
		g.press(NodeIdx(0), Point::default(), Point::default());
		assert_eq!(g.cancel(), None);

		g.press(NodeIdx(0), Point::default(), Point::default());
		g.motion(Point::new(3.0, 0.0));
		assert_eq!(g.cancel(), Some(GestureEvent::DragEnd(NodeIdx(0))));
		assert!(g.release().is_empty());
	}

	#[test]
	fn drag_release_never_toggles_visibility() {
		let session = GraphSession::new(sample_model(), ForceConfig::default());
		let mut state = CanvasState::new(session, 800.0, 600.0, 20.0);
		let object = idx(state.session.model(), "Object");
		let before = state.session.displayed();

		let at = state.session.model().position(object);
		state.gesture.press(object, Point::default(), at);
		let moved = state.gesture.motion(Point::new(30.0, 0.0));
		assert!(!state.apply(moved));
		let released = state.gesture.release();
		assert!(!state.apply(released));
		assert_eq!(state.session.displayed(), before);

		let at = state.session.model().position(object);
		state.gesture.press(object, Point::default(), at);
		let released = state.gesture.release();
		assert!(state.apply(released));
		assert_eq!(state.session.displayed().nodes.len(), 1);
	}

	#[test]
	fn zoom_keeps_cursor_point_fixed() {
		let mut t = ViewTransform::identity();
		let before = t.screen_to_graph(200.0, 100.0);
		t.zoom_at(200.0, 100.0, true);
		let after = t.screen_to_graph(200.0, 100.0);
		assert!(before.distance(after) < 1e-9);
		assert!((t.k - 1.1).abs() < 1e-12);
	}

	#[test]
	fn screen_to_graph_undoes_pan_and_zoom() {
		let t = ViewTransform {
			x: 100.0,
			y: 50.0,
			k: 2.0,
		};
		assert_eq!(t.screen_to_graph(300.0, 250.0), Point::new(100.0, 100.0));
	}
}
