//! Screen-space geometry helpers for touch handling
//!
//! All functions are pure. Coordinates are in view pixels with Y pointing
//! down, as delivered by the touch system.

/// Maximum displacement (pixels) between press and release for a tap
pub const TAP_MOVE_THRESHOLD: f32 = 10.0;

/// Maximum press duration (milliseconds) for a tap
pub const TAP_TIME_THRESHOLD_MS: f64 = 300.0;

/// A point on the view surface
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point2 {
    pub x: f32,
    pub y: f32,
}

impl Point2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Euclidean distance between two points
pub fn distance(p1: Point2, p2: Point2) -> f32 {
    let dx = p1.x - p2.x;
    let dy = p1.y - p2.y;
    (dx * dx + dy * dy).sqrt()
}

/// Angle of the segment p1 -> p2 in degrees, in (-180, 180]
pub fn angle_degrees(p1: Point2, p2: Point2) -> f32 {
    (p2.y - p1.y).atan2(p2.x - p1.x).to_degrees()
}

/// Midpoint of two contacts
pub fn centroid(p1: Point2, p2: Point2) -> Point2 {
    Point2::new((p1.x + p2.x) / 2.0, (p1.y + p2.y) / 2.0)
}

/// Mean position of any number of contacts
pub fn centroid_of(points: &[Point2]) -> Option<Point2> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f32;
    let (sx, sy) = points.iter().fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    Some(Point2::new(sx / n, sy / n))
}

/// Map pixel coordinates to clip space [-1, 1], flipping Y so screen-down is clip-down
pub fn normalize_to_clip_space(x: f32, y: f32, viewport_width: f32, viewport_height: f32) -> Point2 {
    Point2::new(
        (x / viewport_width) * 2.0 - 1.0,
        -(y / viewport_height) * 2.0 + 1.0,
    )
}

/// A press is a tap when it stayed put and was short
pub fn classify_tap(start_x: f32, start_y: f32, end_x: f32, end_y: f32, duration_ms: f64) -> bool {
    let moved = distance(Point2::new(start_x, start_y), Point2::new(end_x, end_y));
    moved < TAP_MOVE_THRESHOLD && duration_ms < TAP_TIME_THRESHOLD_MS
}
