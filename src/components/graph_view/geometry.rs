//! Plane geometry shared by the renderer and the hit tests.

use serde::{Deserialize, Serialize};

/// A point in either world or screen space; the caller knows which.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
	pub x: f64,
	pub y: f64,
}

impl Point {
	pub const fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}

	/// Offset this point by `(dx, dy)`.
	pub fn translate(self, dx: f64, dy: f64) -> Self {
		Self::new(self.x + dx, self.y + dy)
	}
}

/// Angle in radians of the line from `from` to `to`, measured with `atan2`.
pub fn theta(from: Point, to: Point) -> f64 {
	(to.y - from.y).atan2(to.x - from.x)
}

pub fn midpoint(a: Point, b: Point) -> Point {
	Point::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0)
}

pub fn distance(a: Point, b: Point) -> f64 {
	let (dx, dy) = (b.x - a.x, b.y - a.y);
	(dx * dx + dy * dy).sqrt()
}

/// Axis-aligned bounding box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
	pub x: f64,
	pub y: f64,
	pub width: f64,
	pub height: f64,
}

impl Bounds {
	/// Smallest box containing every `(center, half_extent)` square.
	/// Returns `None` when the iterator is empty.
	pub fn around(centers: impl IntoIterator<Item = Point>, half_extent: f64) -> Option<Self> {
		let mut iter = centers.into_iter();
		let first = iter.next()?;
		let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
		for p in iter {
			min_x = min_x.min(p.x);
			min_y = min_y.min(p.y);
			max_x = max_x.max(p.x);
			max_y = max_y.max(p.y);
		}
		Some(Self {
			x: min_x - half_extent,
			y: min_y - half_extent,
			width: (max_x - min_x) + 2.0 * half_extent,
			height: (max_y - min_y) + 2.0 * half_extent,
		})
	}

	/// True when the box has no area in either dimension.
	pub fn is_empty(&self) -> bool {
		self.width <= 0.0 || self.height <= 0.0
	}

	pub fn center(&self) -> Point {
		Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
	}
}
