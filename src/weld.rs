//! Proximity welding of the raw Marching Tetrahedra output.
//!
//! Welding runs in two passes:
//!
//! 1. Raw vertices are grouped by their **exact** bit pattern. Neighbouring cells that
//!    end on the same interpolated point produce identical floats, so this pass never
//!    needs a tolerance.
//! 2. The distinct positions are clustered greedily: the first unassigned position
//!    seeds a cluster, and every unassigned position strictly closer than the merge
//!    distance joins it. The cluster becomes one output vertex at
//!    `(mean(members) + seed) / 2`, biased toward the seed.
//!
//! Triangles that end up with a repeated index are dropped.

use std::collections::HashMap;

use log::{debug, warn};
use tracing::info_span;

use crate::{
    settings::WeldStrategy,
    types::{Point, Value, Vector},
};

const UNASSIGNED: u32 = u32::MAX;

/// Deduplicated vertices plus triangle indices into them.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WeldedMesh {
    pub vertices: Vec<Point>,
    /// Three indices per triangle.
    pub indices: Vec<u32>,
}

impl WeldedMesh {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Expands the indices back into an unindexed stream, three vertices per triangle.
    pub fn expand(&self) -> Vec<Point> {
        self.indices
            .iter()
            .map(|&i| self.vertices[i as usize])
            .collect()
    }
}

/// Welds an unindexed triangle stream, merging vertices closer than `distance`.
///
/// A non-positive or non-finite `distance` only merges exact duplicates.
pub fn weld(raw: &[Point], distance: Value, strategy: WeldStrategy) -> WeldedMesh {
    let _span = info_span!("weld", ?strategy).entered();

    if raw.len() % 3 != 0 {
        warn!(
            "raw vertex stream has {} trailing vertices, ignoring them",
            raw.len() % 3
        );
    }
    let raw = &raw[..raw.len() - raw.len() % 3];

    let (distinct, raw_to_distinct) = dedup_exact(raw);

    let (vertices, cluster_of) = if !distance.is_finite() || distance <= 0. {
        let identity = (0..distinct.len() as u32).collect();
        (distinct, identity)
    } else {
        match strategy {
            WeldStrategy::Greedy => cluster_greedy(&distinct, distance),
            WeldStrategy::SpatialHash => cluster_spatial_hash(&distinct, distance),
        }
    };

    // Map every raw vertex through its exact position to its cluster, in triangle order.
    let mut indices = Vec::with_capacity(raw_to_distinct.len());
    let mut removed = 0;
    for tri in raw_to_distinct.chunks_exact(3) {
        let [a, b, c] = [tri[0], tri[1], tri[2]].map(|d| cluster_of[d]);
        if a == b || b == c || a == c {
            removed += 1;
            continue;
        }
        indices.extend([a, b, c]);
    }

    debug!(
        "welded {} raw vertices into {}, removed {} degenerate faces aka {} indices",
        raw.len(),
        vertices.len(),
        removed,
        removed * 3
    );

    WeldedMesh { vertices, indices }
}

#[inline]
fn position_key(p: &Point) -> [u32; 3] {
    [p.x.to_bits(), p.y.to_bits(), p.z.to_bits()]
}

/// Returns the distinct positions in order of first occurrence, and for every raw
/// vertex the index of its distinct position.
fn dedup_exact(raw: &[Point]) -> (Vec<Point>, Vec<usize>) {
    let mut lookup: HashMap<[u32; 3], usize> = HashMap::with_capacity(raw.len() / 3);
    let mut distinct = Vec::with_capacity(raw.len() / 3);

    let raw_to_distinct = raw
        .iter()
        .map(|p| {
            *lookup.entry(position_key(p)).or_insert_with(|| {
                distinct.push(*p);
                distinct.len() - 1
            })
        })
        .collect();

    (distinct, raw_to_distinct)
}

/// Box rejection on each axis first, then the real (strict) distance test.
#[inline]
fn within(seed: &Point, p: &Point, distance: Value, distance_sq: Value) -> bool {
    let dx = p.x - seed.x;
    if dx > distance || dx < -distance {
        return false;
    }
    let dy = p.y - seed.y;
    if dy > distance || dy < -distance {
        return false;
    }
    let dz = p.z - seed.z;
    if dz > distance || dz < -distance {
        return false;
    }
    dx * dx + dy * dy + dz * dz < distance_sq
}

/// Output position of a cluster: the members' mean (seed included) averaged with the seed.
#[inline]
fn seed_biased_mean(seed: &Point, sum: Vector, total: usize) -> Point {
    Point::from((sum / total as Value + seed.coords) * 0.5)
}

fn cluster_greedy(distinct: &[Point], distance: Value) -> (Vec<Point>, Vec<u32>) {
    let distance_sq = distance * distance;
    let mut cluster_of = vec![UNASSIGNED; distinct.len()];
    let mut vertices = Vec::with_capacity(distinct.len() / 2);
    let mut pool: Vec<usize> = (0..distinct.len()).collect();

    while let Some(&seed_id) = pool.first() {
        let seed = distinct[seed_id];
        let index = vertices.len() as u32;
        cluster_of[seed_id] = index;

        let mut sum = seed.coords;
        let mut total = 1;
        pool.retain(|&id| {
            if id == seed_id {
                return false;
            }
            if within(&seed, &distinct[id], distance, distance_sq) {
                cluster_of[id] = index;
                sum += distinct[id].coords;
                total += 1;
                return false;
            }
            true
        });

        vertices.push(seed_biased_mean(&seed, sum, total));
    }

    (vertices, cluster_of)
}

fn cluster_spatial_hash(distinct: &[Point], distance: Value) -> (Vec<Point>, Vec<u32>) {
    let distance_sq = distance * distance;
    let bin_of = |p: &Point| -> [i64; 3] {
        [
            (p.x / distance).floor() as i64,
            (p.y / distance).floor() as i64,
            (p.z / distance).floor() as i64,
        ]
    };

    let mut bins: HashMap<[i64; 3], Vec<usize>> = HashMap::new();
    for (id, p) in distinct.iter().enumerate() {
        bins.entry(bin_of(p)).or_default().push(id);
    }

    let mut cluster_of = vec![UNASSIGNED; distinct.len()];
    let mut vertices = Vec::with_capacity(distinct.len() / 2);
    let mut members: Vec<usize> = Vec::new();

    for seed_id in 0..distinct.len() {
        if cluster_of[seed_id] != UNASSIGNED {
            continue;
        }
        let seed = distinct[seed_id];
        let index = vertices.len() as u32;
        cluster_of[seed_id] = index;

        members.clear();
        let [bx, by, bz] = bin_of(&seed);
        for dz in -1..=1_i64 {
            for dy in -1..=1_i64 {
                for dx in -1..=1_i64 {
                    let key = [
                        bx.saturating_add(dx),
                        by.saturating_add(dy),
                        bz.saturating_add(dz),
                    ];
                    let Some(bin) = bins.get(&key) else {
                        continue;
                    };
                    members.extend(bin.iter().copied().filter(|&id| {
                        cluster_of[id] == UNASSIGNED
                            && within(&seed, &distinct[id], distance, distance_sq)
                    }));
                }
            }
        }

        // Sum in first-occurrence order so the result matches the greedy scan bit for bit.
        members.sort_unstable();
        members.dedup();

        let mut sum = seed.coords;
        for &id in &members {
            cluster_of[id] = index;
            sum += distinct[id].coords;
        }
        vertices.push(seed_biased_mean(&seed, sum, members.len() + 1));
    }

    (vertices, cluster_of)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: Value, y: Value, z: Value) -> Point {
        Point::new(x, y, z)
    }

    /// A strip of `n` quads on the XY plane with spacing 1, each vertex nudged by `jitter`
    /// depending on which triangle emitted it.
    fn jittered_strip(n: usize, jitter: Value) -> Vec<Point> {
        let mut raw = Vec::new();
        for i in 0..n {
            let x = i as Value;
            let j = jitter * (i % 3) as Value;
            raw.extend([p(x, 0., 0.), p(x + 1. + j, 0., 0.), p(x, 1. - j, 0.)]);
            raw.extend([p(x + 1., 0. + j, 0.), p(x + 1., 1., 0.), p(x - j, 1., 0.)]);
        }
        raw
    }

    fn assert_valid(mesh: &WeldedMesh) {
        assert_eq!(mesh.indices.len() % 3, 0);
        for tri in mesh.indices.chunks_exact(3) {
            assert!(tri.iter().all(|&i| (i as usize) < mesh.vertices.len()));
            assert!(tri[0] != tri[1] && tri[1] != tri[2] && tri[0] != tri[2]);
        }
    }

    #[test]
    fn exact_duplicates_share_an_index() {
        let raw = vec![
            p(0., 0., 0.),
            p(1., 0., 0.),
            p(0., 1., 0.),
            p(1., 0., 0.),
            p(1., 1., 0.),
            p(0., 1., 0.),
        ];
        let mesh = weld(&raw, 0., WeldStrategy::Greedy);
        assert_eq!(mesh.vertices, vec![p(0., 0., 0.), p(1., 0., 0.), p(0., 1., 0.), p(1., 1., 0.)]);
        assert_eq!(mesh.indices, vec![0, 1, 2, 1, 3, 2]);
    }

    #[test]
    fn cluster_position_is_biased_toward_seed() {
        let raw = vec![
            p(0., 0., 0.),
            p(1., 0., 0.),
            p(0., 1., 0.),
            p(0.2, 0., 0.),
            p(1., 1., 0.),
            p(0., 1., 0.),
        ];
        for strategy in [WeldStrategy::Greedy, WeldStrategy::SpatialHash] {
            let mesh = weld(&raw, 0.5, strategy);
            assert_eq!(mesh.vertices.len(), 4);
            // mean(0, 0.2) = 0.1, averaged with the seed at 0
            assert!((mesh.vertices[0].x - 0.05).abs() < 1e-7);
            assert_eq!(mesh.indices, vec![0, 1, 2, 0, 3, 2]);
        }
    }

    #[test]
    fn box_prefilter_does_not_replace_distance_test() {
        // Inside the 0.5 box on every axis but ~0.566 away.
        let raw = vec![p(0., 0., 0.), p(0.4, 0.4, 0.), p(5., 5., 5.)];
        let mesh = weld(&raw, 0.5, WeldStrategy::Greedy);
        assert_eq!(mesh.vertices.len(), 3);
        assert_eq!(mesh.indices, vec![0, 1, 2]);
    }

    #[test]
    fn collapsed_triangles_are_dropped() {
        let raw = vec![
            // Collapses to a point.
            p(0., 0., 0.),
            p(0.01, 0., 0.),
            p(0., 0.01, 0.),
            // Collapses to an edge.
            p(0., 0., 0.),
            p(3., 0., 0.),
            p(3.01, 0., 0.),
            // Survives.
            p(0., 0., 0.),
            p(3., 0., 0.),
            p(0., 3., 0.),
        ];
        let mesh = weld(&raw, 0.1, WeldStrategy::SpatialHash);
        assert_eq!(mesh.triangle_count(), 1);
        assert_valid(&mesh);
    }

    #[test]
    fn strategies_agree() {
        let raw = jittered_strip(40, 0.03);
        let greedy = weld(&raw, 0.2, WeldStrategy::Greedy);
        let hashed = weld(&raw, 0.2, WeldStrategy::SpatialHash);
        assert_eq!(greedy, hashed);
        assert_valid(&greedy);
    }

    #[test]
    fn well_separated_output_is_a_fixed_point() {
        let raw = jittered_strip(20, 0.05);
        let once = weld(&raw, 0.3, WeldStrategy::SpatialHash);
        // Two rows of 21 grid points
        assert_eq!(once.vertices.len(), 42);

        let twice = weld(&once.expand(), 0.3, WeldStrategy::SpatialHash);
        assert_eq!(twice.vertices.len(), once.vertices.len());
        assert_eq!(twice.triangle_count(), once.triangle_count());
    }

    #[test]
    fn trailing_vertices_are_ignored() {
        let raw = vec![p(0., 0., 0.), p(1., 0., 0.), p(0., 1., 0.), p(9., 9., 9.)];
        let mesh = weld(&raw, 0.1, WeldStrategy::Greedy);
        assert_eq!(mesh.vertices.len(), 3);
        assert_eq!(mesh.indices, vec![0, 1, 2]);
    }

    #[test]
    fn empty_stream_gives_empty_mesh() {
        let mesh = weld(&[], 1., WeldStrategy::SpatialHash);
        assert!(mesh.vertices.is_empty());
        assert!(mesh.indices.is_empty());
    }
}
