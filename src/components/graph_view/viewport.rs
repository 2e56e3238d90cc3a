//! Pan/zoom state for the editor view.
//!
//! The transform maps world coordinates to screen coordinates as
//! `screen = world * k + (x, y)`. Zoom is always clamped to
//! `[min_zoom, max_zoom]`. Programmatic changes (zoom-to-fit, the zoom slider)
//! are animated: a [`Transition`] is interpolated by [`Viewport::tick`], which
//! the animation loop calls once per frame with the current time.

use log::warn;

use super::config::{DEFAULT_MAX_ZOOM, DEFAULT_MIN_ZOOM, valid_zoom_range};
use super::geometry::{Bounds, Point};

/// `(min_zoom, max_zoom)`, or the default range when the pair is unusable.
fn zoom_range(min_zoom: f64, max_zoom: f64) -> (f64, f64) {
	if valid_zoom_range(min_zoom, max_zoom) {
		(min_zoom, max_zoom)
	} else {
		warn!(
			"viewport: invalid zoom range [{}, {}], using [{}, {}]",
			min_zoom, max_zoom, DEFAULT_MIN_ZOOM, DEFAULT_MAX_ZOOM
		);
		(DEFAULT_MIN_ZOOM, DEFAULT_MAX_ZOOM)
	}
}

/// Pan and zoom transform applied to the entire graph view.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	/// Zoom factor (1.0 = 100%).
	pub k: f64,
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self::IDENTITY
	}
}

impl ViewTransform {
	pub const IDENTITY: Self = Self {
		x: 0.0,
		y: 0.0,
		k: 1.0,
	};

	pub fn world_to_screen(&self, p: Point) -> Point {
		Point::new(p.x * self.k + self.x, p.y * self.k + self.y)
	}

	pub fn screen_to_world(&self, p: Point) -> Point {
		Point::new((p.x - self.x) / self.k, (p.y - self.y) / self.k)
	}

	/// SVG `transform` attribute for the view group.
	pub fn to_svg(&self) -> String {
		format!("translate({},{}) scale({})", self.x, self.y, self.k)
	}

	fn lerp(&self, to: &ViewTransform, t: f64) -> ViewTransform {
		ViewTransform {
			x: self.x + (to.x - self.x) * t,
			y: self.y + (to.y - self.y) * t,
			k: self.k + (to.k - self.k) * t,
		}
	}
}

/// Cubic in-out easing, the default curve for animated view changes.
fn ease_cubic_in_out(t: f64) -> f64 {
	let t = t.clamp(0.0, 1.0);
	if t < 0.5 {
		4.0 * t * t * t
	} else {
		1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
	}
}

/// An animated move from one transform to another.
///
/// The start time is taken from the first [`Viewport::tick`] after the
/// transition is queued, so queuing never needs a clock.
#[derive(Clone, Debug)]
struct Transition {
	from: ViewTransform,
	to: ViewTransform,
	start_ms: Option<f64>,
	duration_ms: f64,
}

/// Tracks an in-progress background pan.
#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

/// Owner of the current view transform.
#[derive(Clone, Debug)]
pub struct Viewport {
	transform: ViewTransform,
	min_zoom: f64,
	max_zoom: f64,
	pub width: f64,
	pub height: f64,
	pub pan: PanState,
	transition: Option<Transition>,
}

/// Zoom change per wheel notch.
const WHEEL_ZOOM_IN: f64 = 1.1;
const WHEEL_ZOOM_OUT: f64 = 0.9;

impl Viewport {
	pub fn new(min_zoom: f64, max_zoom: f64) -> Self {
		let (min_zoom, max_zoom) = zoom_range(min_zoom, max_zoom);
		Self {
			transform: ViewTransform::IDENTITY,
			min_zoom,
			max_zoom,
			width: 0.0,
			height: 0.0,
			pan: PanState::default(),
			transition: None,
		}
	}

	pub fn transform(&self) -> ViewTransform {
		self.transform
	}

	pub fn min_zoom(&self) -> f64 {
		self.min_zoom
	}

	pub fn max_zoom(&self) -> f64 {
		self.max_zoom
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}

	pub fn clamp_zoom(&self, k: f64) -> f64 {
		k.clamp(self.min_zoom, self.max_zoom)
	}

	/// Uses the transform as of this call, including any in-flight animation.
	pub fn world_to_screen(&self, p: Point) -> Point {
		self.transform.world_to_screen(p)
	}

	pub fn screen_to_world(&self, p: Point) -> Point {
		self.transform.screen_to_world(p)
	}

	/// Replace the transform immediately, cancelling any animation.
	pub fn apply(&mut self, transform: ViewTransform) {
		self.transition = None;
		self.transform = ViewTransform {
			k: self.clamp_zoom(transform.k),
			..transform
		};
	}

	pub fn begin_pan(&mut self, screen: Point) {
		self.transition = None;
		self.pan = PanState {
			active: true,
			start_x: screen.x,
			start_y: screen.y,
			transform_start_x: self.transform.x,
			transform_start_y: self.transform.y,
		};
	}

	pub fn pan_to(&mut self, screen: Point) {
		if !self.pan.active {
			return;
		}
		self.transform.x = self.pan.transform_start_x + (screen.x - self.pan.start_x);
		self.transform.y = self.pan.transform_start_y + (screen.y - self.pan.start_y);
	}

	pub fn end_pan(&mut self) {
		self.pan.active = false;
	}

	/// Zoom by `factor` keeping the world point under `screen` fixed.
	pub fn zoom_at(&mut self, screen: Point, factor: f64) {
		self.transition = None;
		let new_k = self.clamp_zoom(self.transform.k * factor);
		let ratio = new_k / self.transform.k;
		self.transform.x = screen.x - (screen.x - self.transform.x) * ratio;
		self.transform.y = screen.y - (screen.y - self.transform.y) * ratio;
		self.transform.k = new_k;
	}

	/// One wheel notch: positive `delta_y` zooms out.
	pub fn wheel(&mut self, screen: Point, delta_y: f64) {
		let factor = if delta_y > 0.0 {
			WHEEL_ZOOM_OUT
		} else {
			WHEEL_ZOOM_IN
		};
		self.zoom_at(screen, factor);
	}

	/// Programmatically set the transform, animated when `duration_ms > 0`.
	pub fn set_zoom(&mut self, k: f64, x: f64, y: f64, duration_ms: f64) {
		let target = ViewTransform {
			x,
			y,
			k: self.clamp_zoom(k),
		};
		if duration_ms > 0.0 {
			self.transition = Some(Transition {
				from: self.transform,
				to: target,
				start_ms: None,
				duration_ms,
			});
		} else {
			self.apply(target);
		}
	}

	/// Transform that centres `content` in the viewport with 10% slack.
	///
	/// Empty content falls back to the middle of the zoom range at the origin.
	pub fn fit_transform(&self, content: Option<Bounds>) -> ViewTransform {
		match content {
			Some(bounds) if !bounds.is_empty() && self.width > 0.0 && self.height > 0.0 => {
				let k = 0.9 / (bounds.width / self.width).max(bounds.height / self.height);
				let k = self.clamp_zoom(k);
				let center = bounds.center();
				ViewTransform {
					x: self.width / 2.0 - k * center.x,
					y: self.height / 2.0 - k * center.y,
					k,
				}
			}
			_ => ViewTransform {
				x: 0.0,
				y: 0.0,
				k: (self.min_zoom + self.max_zoom) / 2.0,
			},
		}
	}

	pub fn zoom_to_fit(&mut self, content: Option<Bounds>, duration_ms: f64) {
		let next = self.fit_transform(content);
		self.set_zoom(next.k, next.x, next.y, duration_ms);
	}

	/// Change zoom by `delta` about the viewport centre.
	pub fn modify_zoom(&mut self, delta: f64, duration_ms: f64) {
		let current = self.transform;
		let k = self.clamp_zoom(current.k + delta);
		let center = Point::new(self.width / 2.0, self.height / 2.0);
		let world_center = current.screen_to_world(center);
		self.set_zoom(
			k,
			center.x - world_center.x * k,
			center.y - world_center.y * k,
			duration_ms,
		);
	}

	pub fn is_animating(&self) -> bool {
		self.transition.is_some()
	}

	/// Advance any running transition. Returns true while still animating.
	pub fn tick(&mut self, now_ms: f64) -> bool {
		let Some(transition) = self.transition.as_mut() else {
			return false;
		};
		let start = *transition.start_ms.get_or_insert(now_ms);
		let t = ((now_ms - start) / transition.duration_ms).clamp(0.0, 1.0);
		self.transform = transition.from.lerp(&transition.to, ease_cubic_in_out(t));
		if t >= 1.0 {
			self.transform = transition.to;
			self.transition = None;
		}
		self.transition.is_some()
	}
}

/// Maps the zoom range onto an integer slider of `steps` positions.
#[derive(Clone, Copy, Debug)]
pub struct ZoomSlider {
	pub steps: f64,
	pub min_zoom: f64,
	pub max_zoom: f64,
}

impl ZoomSlider {
	pub fn new(min_zoom: f64, max_zoom: f64) -> Self {
		let (min_zoom, max_zoom) = zoom_range(min_zoom, max_zoom);
		Self {
			steps: 100.0,
			min_zoom,
			max_zoom,
		}
	}

	pub fn slider_to_zoom(&self, value: f64) -> f64 {
		value * (self.max_zoom - self.min_zoom) / self.steps + self.min_zoom
	}

	pub fn zoom_to_slider(&self, zoom: f64) -> f64 {
		let span = self.max_zoom - self.min_zoom;
		if span == 0.0 {
			return 0.0;
		}
		(zoom - self.min_zoom) * self.steps / span
	}

	/// Zoom delta for moving the slider to `value`, or `None` when the target
	/// lies outside the zoom range.
	pub fn delta_for(&self, value: f64, current_zoom: f64) -> Option<f64> {
		let next = self.slider_to_zoom(value);
		(self.min_zoom..=self.max_zoom)
			.contains(&next)
			.then_some(next - current_zoom)
	}
}
