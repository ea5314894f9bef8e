use crate::types::{Point, Value};

// Return the interpolation factor t corresponding to iso_val
#[inline]
pub fn find_t(v0: Value, v1: Value, iso_val: Value) -> Value {
    (iso_val - v0) / (v1 - v0)
}

// Linear interpolation
#[inline]
pub fn lerp(a: Value, b: Value, t: Value) -> Value {
    a * (1.0 - t) + b * t
}

// Linearly interpolate between two points by factor t, as t*p1 + (1-t)*p0
#[inline]
pub fn interpolate_points(p0: Point, p1: Point, t: Value) -> Point {
    Point::new(lerp(p0.x, p1.x, t), lerp(p0.y, p1.y, t), lerp(p0.z, p1.z, t))
}
