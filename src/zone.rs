//! Territory geometry
//!
//! A [`Zone`] is a horizontal polygon over integer block coordinates with a
//! vertical `[min_y, max_y]` bound. Containment is a pure function: the
//! vertical range is checked first, then an on-edge tolerance pre-check,
//! then a ray-casting parity test against the block center.

use serde::{Deserialize, Serialize};

use crate::error::ZoneError;

/// Squared distance (in blocks) under which a block center counts as lying
/// on an edge, and therefore inside the zone.
///
/// Ray casting gives unstable answers for points exactly on an edge or
/// level with a vertex. Block centers never sit on an axis-aligned edge,
/// so this only affects diagonal edges.
pub const EDGE_TOLERANCE_SQUARED: f64 = 0.0625;

/// Depth below the lowest vertex covered by a zone with derived bounds.
pub const DEFAULT_DEPTH_BELOW: i32 = 64;

/// Height above the highest vertex covered by a zone with derived bounds.
pub const DEFAULT_HEIGHT_ABOVE: i32 = 256;

/// Integer block coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockPos {
    /// East-west
    pub x: i32,
    /// Elevation
    pub y: i32,
    /// North-south
    pub z: i32,
}

impl BlockPos {
    /// Creates a block position.
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }
}

impl std::fmt::Display for BlockPos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Continuous entity position as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// East-west
    pub x: f64,
    /// Elevation
    pub y: f64,
    /// North-south
    pub z: f64,
}

impl Position {
    /// Creates a position.
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Returns the block this position lies in.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn block(&self) -> BlockPos {
        BlockPos::new(
            self.x.floor() as i32,
            self.y.floor() as i32,
            self.z.floor() as i32,
        )
    }
}

impl From<BlockPos> for Position {
    fn from(pos: BlockPos) -> Self {
        Self::new(
            f64::from(pos.x) + 0.5,
            f64::from(pos.y),
            f64::from(pos.z) + 0.5,
        )
    }
}

/// Horizontal polygon vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Vertex {
    /// East-west
    pub x: i32,
    /// North-south
    pub z: i32,
}

impl Vertex {
    /// Creates a vertex.
    #[must_use]
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }
}

impl From<BlockPos> for Vertex {
    fn from(pos: BlockPos) -> Self {
        Self::new(pos.x, pos.z)
    }
}

/// Vertically bounded polygonal territory.
///
/// Immutable once built. Construction rejects polygons with fewer than three
/// vertices, zero area, or crossing edges, so every `Zone` is a simple
/// polygon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Zone {
    vertices: Vec<Vertex>,
    min_y: i32,
    max_y: i32,
}

impl Zone {
    /// Builds a zone from explicit vertices and vertical bound.
    ///
    /// # Errors
    ///
    /// Returns a [`ZoneError`] if the polygon is not simple or the bound is
    /// inverted.
    pub fn new(vertices: Vec<Vertex>, min_y: i32, max_y: i32) -> Result<Self, ZoneError> {
        if min_y > max_y {
            return Err(ZoneError::InvertedBounds { min_y, max_y });
        }
        validate_polygon(&vertices)?;
        Ok(Self {
            vertices,
            min_y,
            max_y,
        })
    }

    /// Builds a zone from 3D corner points, deriving the vertical bound from
    /// their elevation range.
    ///
    /// # Errors
    ///
    /// Returns a [`ZoneError`] if the polygon is not simple.
    pub fn from_points(points: &[BlockPos]) -> Result<Self, ZoneError> {
        let Some(lowest) = points.iter().map(|p| p.y).min() else {
            return Err(ZoneError::TooFewVertices { count: 0 });
        };
        let highest = points.iter().map(|p| p.y).max().unwrap_or(lowest);
        let vertices = points.iter().copied().map(Vertex::from).collect();
        Self::new(
            vertices,
            lowest.saturating_sub(DEFAULT_DEPTH_BELOW),
            highest.saturating_add(DEFAULT_HEIGHT_ABOVE),
        )
    }

    /// Builds a clockwise rectangle from two opposite corners.
    ///
    /// All four vertices take the first corner's elevation.
    ///
    /// # Errors
    ///
    /// Returns [`ZoneError::Degenerate`] if the corners share an axis.
    pub fn rectangle(first: BlockPos, second: BlockPos) -> Result<Self, ZoneError> {
        let (min_x, max_x) = (first.x.min(second.x), first.x.max(second.x));
        let (min_z, max_z) = (first.z.min(second.z), first.z.max(second.z));
        let y = first.y;
        Self::from_points(&[
            BlockPos::new(min_x, y, min_z),
            BlockPos::new(max_x, y, min_z),
            BlockPos::new(max_x, y, max_z),
            BlockPos::new(min_x, y, max_z),
        ])
    }

    /// Returns the polygon vertices in order.
    #[must_use]
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Returns the lowest covered elevation.
    #[must_use]
    pub const fn min_y(&self) -> i32 {
        self.min_y
    }

    /// Returns the highest covered elevation.
    #[must_use]
    pub const fn max_y(&self) -> i32 {
        self.max_y
    }

    /// Tests whether a block lies inside the zone.
    #[must_use]
    pub fn contains(&self, pos: BlockPos) -> bool {
        if pos.y < self.min_y || pos.y > self.max_y {
            return false;
        }

        let px = f64::from(pos.x) + 0.5;
        let pz = f64::from(pos.z) + 0.5;

        if self.edges().any(|(a, b)| distance_sq_to_segment(px, pz, a, b) <= EDGE_TOLERANCE_SQUARED)
        {
            return true;
        }

        let mut inside = false;
        for (a, b) in self.edges() {
            let (ax, az) = (f64::from(a.x), f64::from(a.z));
            let (bx, bz) = (f64::from(b.x), f64::from(b.z));
            if (az > pz) != (bz > pz) {
                let intersect_x = (bx - ax) * (pz - az) / (bz - az) + ax;
                if px < intersect_x {
                    inside = !inside;
                }
            }
        }
        inside
    }

    /// Tests whether a continuous entity position lies inside the zone.
    #[must_use]
    pub fn contains_position(&self, pos: Position) -> bool {
        self.contains(pos.block())
    }

    fn edges(&self) -> impl Iterator<Item = (Vertex, Vertex)> + '_ {
        let n = self.vertices.len();
        (0..n).map(move |i| (self.vertices[i], self.vertices[(i + 1) % n]))
    }
}

fn distance_sq_to_segment(px: f64, pz: f64, a: Vertex, b: Vertex) -> f64 {
    let (ax, az) = (f64::from(a.x), f64::from(a.z));
    let (dx, dz) = (f64::from(b.x) - ax, f64::from(b.z) - az);
    let len_sq = dx.mul_add(dx, dz * dz);
    let t = if len_sq <= f64::EPSILON {
        0.0
    } else {
        ((px - ax).mul_add(dx, (pz - az) * dz) / len_sq).clamp(0.0, 1.0)
    };
    let (cx, cz) = (t.mul_add(dx, ax), t.mul_add(dz, az));
    (px - cx).mul_add(px - cx, (pz - cz) * (pz - cz))
}

/// Rejects polygons that are too small, flat, or self-intersecting.
fn validate_polygon(vertices: &[Vertex]) -> Result<(), ZoneError> {
    let n = vertices.len();
    if n < 3 {
        return Err(ZoneError::TooFewVertices { count: n });
    }

    if twice_signed_area(vertices) == 0 {
        return Err(ZoneError::Degenerate);
    }

    let edge = |i: usize| (vertices[i], vertices[(i + 1) % n]);
    for first in 0..n {
        for second in (first + 1)..n {
            let adjacent = second == first + 1 || (first == 0 && second == n - 1);
            if adjacent {
                continue;
            }
            let (a, b) = edge(first);
            let (c, d) = edge(second);
            if segments_intersect(a, b, c, d) {
                return Err(ZoneError::SelfIntersecting { first, second });
            }
        }
    }
    Ok(())
}

/// Shoelace formula over exact integer coordinates.
// i128 holds any product of two i32 coordinate differences without overflow.
fn twice_signed_area(vertices: &[Vertex]) -> i128 {
    let n = vertices.len();
    (0..n)
        .map(|i| {
            let a = vertices[i];
            let b = vertices[(i + 1) % n];
            i128::from(a.x) * i128::from(b.z) - i128::from(b.x) * i128::from(a.z)
        })
        .sum()
}

fn orientation(a: Vertex, b: Vertex, c: Vertex) -> i128 {
    let cross = (i128::from(b.x) - i128::from(a.x)) * (i128::from(c.z) - i128::from(a.z))
        - (i128::from(b.z) - i128::from(a.z)) * (i128::from(c.x) - i128::from(a.x));
    cross.signum()
}

fn on_segment(a: Vertex, b: Vertex, p: Vertex) -> bool {
    p.x >= a.x.min(b.x) && p.x <= a.x.max(b.x) && p.z >= a.z.min(b.z) && p.z <= a.z.max(b.z)
}

fn segments_intersect(a: Vertex, b: Vertex, c: Vertex, d: Vertex) -> bool {
    let o1 = orientation(a, b, c);
    let o2 = orientation(a, b, d);
    let o3 = orientation(c, d, a);
    let o4 = orientation(c, d, b);

    if o1 != o2 && o3 != o4 && o1 != 0 && o2 != 0 && o3 != 0 && o4 != 0 {
        return true;
    }

    (o1 == 0 && on_segment(a, b, c))
        || (o2 == 0 && on_segment(a, b, d))
        || (o3 == 0 && on_segment(c, d, a))
        || (o4 == 0 && on_segment(c, d, b))
}
