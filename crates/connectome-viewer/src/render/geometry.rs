//! Edge endpoints on node boundaries, and the curve used for labeled edges.

use bevy::math::Vec2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn centered(center: Vec2, half: f32) -> Self {
        Self {
            x: center.x - half,
            y: center.y - half,
            width: half * 2.0,
            height: half * 2.0,
        }
    }
}

/// Where the segment `start -> end` leaves `rect`, clamped onto the rectangle.
///
/// Takes the smallest parameter in `[0, 1]` among the four side crossings. A zero-length
/// segment yields the rectangle origin; a segment that never crosses yields `end` clamped.
pub fn intersect_line_with_rect(start: Vec2, end: Vec2, rect: Rect) -> Vec2 {
    let d = end - start;
    if d == Vec2::ZERO {
        return Vec2::new(rect.x, rect.y);
    }
    let t = [
        (rect.x - start.x) / d.x,
        (rect.x + rect.width - start.x) / d.x,
        (rect.y - start.y) / d.y,
        (rect.y + rect.height - start.y) / d.y,
    ]
    .into_iter()
    .filter(|t| t.is_finite() && (0.0..=1.0).contains(t))
    .fold(None, |best: Option<f32>, t| Some(best.map_or(t, |b| b.min(t))))
    .unwrap_or(1.0);
    let p = start + d * t;
    Vec2::new(
        p.x.clamp(rect.x, rect.x + rect.width),
        p.y.clamp(rect.y, rect.y + rect.height),
    )
}

/// Boundary-to-boundary segment between two square node shapes.
pub fn edge_endpoints(from: Vec2, from_half: f32, to: Vec2, to_half: f32) -> (Vec2, Vec2) {
    let a = intersect_line_with_rect(from, to, Rect::centered(from, from_half));
    let b = intersect_line_with_rect(to, from, Rect::centered(to, to_half));
    (a, b)
}

/// Control point bowing the segment sideways by `bend` of its length.
pub fn curve_control(a: Vec2, b: Vec2, bend: f32) -> Vec2 {
    let mid = (a + b) * 0.5;
    let d = b - a;
    mid + d.perp() * bend
}

pub fn quadratic_point(a: Vec2, c: Vec2, b: Vec2, t: f32) -> Vec2 {
    let u = 1.0 - t;
    a * (u * u) + c * (2.0 * u * t) + b * (t * t)
}

pub fn quadratic_polyline(a: Vec2, c: Vec2, b: Vec2, segments: usize) -> Vec<Vec2> {
    let n = segments.max(1);
    (0..=n)
        .map(|i| quadratic_point(a, c, b, i as f32 / n as f32))
        .collect()
}
