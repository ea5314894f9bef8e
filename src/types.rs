use nalgebra::{Point3, Vector3};

/// Scalar field value at a point in space.
pub type Value = f32;

/// A 3D point with [`Value`] components.
pub type Point = Point3<Value>;

/// A 3D vector with [`Value`] components.
pub type Vector = Vector3<Value>;

/// An implicit field: maps a [`Point`] to a [`Value`].
///
/// Return values **above** the threshold are considered "inside" the surface.
/// The function is evaluated exactly once per lattice point, possibly from several
/// threads at once, so it must be pure.
///
/// The lifetime lets synchronous callers pass fields that borrow local state.
pub type FieldFunction<'a> = dyn Fn(Point) -> Value + Send + Sync + 'a;
