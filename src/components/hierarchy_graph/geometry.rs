use super::types::Point;

/// A drawn edge line, clipped to the node circles at both ends.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Segment {
	pub start: Point,
	pub end: Point,
}

impl Segment {
	/// Unit direction from start to end, `None` for a zero-length segment.
	pub fn direction(&self) -> Option<(f64, f64)> {
		unit(self.start, self.end)
	}
}

fn unit(from: Point, to: Point) -> Option<(f64, f64)> {
	let (dx, dy) = (to.x - from.x, to.y - from.y);
	let dist = (dx * dx + dy * dy).sqrt();
	if dist < f64::EPSILON {
		return None;
	}
	Some((dx / dist, dy / dist))
}

/// Line between two node centres, starting on the source circle and ending
/// `tip_offset` short of the target circle to leave room for the arrowhead.
///
/// Coincident nodes give a zero-length segment at the source.
pub fn edge_segment(source: Point, target: Point, radius: f64, tip_offset: f64) -> Segment {
	let Some((ux, uy)) = unit(source, target) else {
		return Segment {
			start: source,
			end: source,
		};
	};
	Segment {
		start: Point::new(source.x + ux * radius, source.y + uy * radius),
		end: Point::new(
			target.x - ux * (radius + tip_offset),
			target.y - uy * (radius + tip_offset),
		),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn close(a: Point, b: Point) -> bool {
		a.distance(b) < 1e-9
	}

	#[test]
	fn clips_to_circle_and_arrow_tip() {
		let seg = edge_segment(Point::new(0.0, 0.0), Point::new(100.0, 0.0), 20.0, 8.0);
		assert!(close(seg.start, Point::new(20.0, 0.0)));
		assert!(close(seg.end, Point::new(72.0, 0.0)));
	}

	#[test]
	fn clips_along_diagonal() {
		let seg = edge_segment(Point::new(10.0, 10.0), Point::new(40.0, 50.0), 5.0, 0.0);
		assert!(close(seg.start, Point::new(13.0, 14.0)));
		assert!(close(seg.end, Point::new(37.0, 46.0)));
		assert!((seg.start.distance(seg.end) - 40.0).abs() < 1e-9);
	}

	#[test]
	fn coincident_nodes_give_zero_length() {
		let p = Point::new(3.0, -7.5);
		let seg = edge_segment(p, p, 20.0, 8.0);
		assert_eq!(seg.start, seg.end);
		assert!(seg.start.x.is_finite() && seg.end.y.is_finite());
		assert_eq!(seg.direction(), None);
	}
}
