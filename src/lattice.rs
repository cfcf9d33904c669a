//! Periodic 4D lattice T⁴ = Z/N0 × Z/N1 × Z/N2 × Z/N3 and its fine edges.
//!
//! Vertices are 4-tuples encoded as integers in mixed radix:
//!   id = ((n0·N1 + n1)·N2 + n2)·N3 + n3
//!
//! Every vertex has one edge per direction μ ∈ {0,1,2,3} to its periodic
//! neighbor c + e_μ (mod N). Edges are undirected: the endpoint ids are
//! stored in ascending order, and (u, v, μ) triples are kept in an ordered
//! set so the dense ids come out of one deterministic sort.
//!
//! For every Ni ≥ 3 there are exactly 4·∏Ni edges. With Ni = 2 the forward
//! and backward neighbors coincide and collapse to one edge; with Ni = 1 the
//! neighbor is the vertex itself and the edge is a self-loop, kept as is.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use crate::error::{SigmaError, SigmaResult};

/// Number of lattice directions.
pub const DIRECTIONS: usize = 4;

/// A lattice coordinate (n0, n1, n2, n3).
pub type Coord = [usize; DIRECTIONS];

/// Toroidal lattice dimensions (N0, N1, N2, N3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LatticeSize {
    dims: [usize; DIRECTIONS],
}

impl LatticeSize {
    pub fn new(dims: [usize; DIRECTIONS]) -> Self {
        Self { dims }
    }

    /// L×L×L×L lattice.
    pub fn cubic(l: usize) -> Self {
        Self { dims: [l; DIRECTIONS] }
    }

    pub fn dims(&self) -> [usize; DIRECTIONS] {
        self.dims
    }

    /// Extent along direction `d`.
    pub fn dim(&self, d: usize) -> usize {
        self.dims[d]
    }

    /// Rejects non-positive dimensions before any generation starts.
    pub fn validate(&self) -> SigmaResult<()> {
        if let Some(d) = self.dims.iter().position(|&n| n == 0) {
            return Err(SigmaError::Config(format!(
                "lattice dimension N{} must be positive, got {}",
                d, self.dims[d]
            )));
        }
        if self
            .dims
            .iter()
            .try_fold(1usize, |acc, &n| acc.checked_mul(n))
            .is_none()
        {
            return Err(SigmaError::Config(format!(
                "lattice {} has more vertices than fit in usize",
                self
            )));
        }
        Ok(())
    }

    /// Total number of vertices ∏Ni.
    pub fn num_vertices(&self) -> usize {
        self.dims.iter().product()
    }

    /// Mixed-radix vertex id of a coordinate.
    pub fn encode(&self, c: Coord) -> usize {
        let [_, n1, n2, n3] = self.dims;
        ((c[0] * n1 + c[1]) * n2 + c[2]) * n3 + c[3]
    }

    /// Inverse of [`encode`](Self::encode).
    pub fn decode(&self, mut v: usize) -> Coord {
        let [_, n1, n2, n3] = self.dims;
        let c3 = v % n3;
        v /= n3;
        let c2 = v % n2;
        v /= n2;
        let c1 = v % n1;
        v /= n1;
        [v, c1, c2, c3]
    }

    /// Periodic neighbor c + e_μ.
    pub fn neighbor(&self, c: Coord, mu: usize) -> Coord {
        let mut next = c;
        next[mu] = (c[mu] + 1) % self.dims[mu];
        next
    }

    /// All coordinates in lexicographic order (the full Cartesian product).
    pub fn coords(&self) -> impl Iterator<Item = Coord> + '_ {
        let [n0, n1, n2, n3] = self.dims;
        (0..n0).flat_map(move |a| {
            (0..n1).flat_map(move |b| (0..n2).flat_map(move |c| (0..n3).map(move |d| [a, b, c, d])))
        })
    }
}

impl fmt::Display for LatticeSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d] = self.dims;
        write!(f, "{}x{}x{}x{}", a, b, c, d)
    }
}

/// An undirected fine edge {u, v} along direction μ, with u ≤ v.
///
/// Field order makes the derived `Ord` the lexicographic (u, v, μ) order
/// that defines dense ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FineEdge {
    pub u: usize,
    pub v: usize,
    pub mu: u8,
}

impl FineEdge {
    /// Canonicalize an edge by sorting its endpoints.
    pub fn new(a: usize, b: usize, mu: u8) -> Self {
        if a <= b {
            Self { u: a, v: b, mu }
        } else {
            Self { u: b, v: a, mu }
        }
    }

    pub fn is_self_loop(&self) -> bool {
        self.u == self.v
    }
}

/// Generate all fine edges of the lattice, sorted by (u, v, μ).
///
/// O(4·∏Ni) insertions into an ordered set; duplicate orientations are
/// absorbed by the canonical form.
pub fn generate_edges(size: &LatticeSize) -> Vec<FineEdge> {
    let mut edges = BTreeSet::new();
    for c in size.coords() {
        let src = size.encode(c);
        for mu in 0..DIRECTIONS {
            let dst = size.encode(size.neighbor(c, mu));
            edges.insert(FineEdge::new(src, dst, mu as u8));
        }
    }
    edges.into_iter().collect()
}

/// Dense edge ids plus an endpoint lookup that works in either orientation.
#[derive(Debug, Clone)]
pub struct EdgeIndex {
    edges: Vec<FineEdge>,
    by_endpoints: HashMap<(usize, usize), usize>,
}

impl EdgeIndex {
    /// Index a sorted edge list; the position in the list is the dense id.
    ///
    /// If several edges share an endpoint pair (only possible on lattices
    /// with a dimension ≤ 2), the pair resolves to the highest id.
    pub fn new(edges: Vec<FineEdge>) -> Self {
        let mut by_endpoints = HashMap::with_capacity(2 * edges.len());
        for (id, e) in edges.iter().enumerate() {
            by_endpoints.insert((e.u, e.v), id);
            by_endpoints.insert((e.v, e.u), id);
        }
        Self {
            edges,
            by_endpoints,
        }
    }

    /// Generate and index all edges of a lattice.
    pub fn build(size: &LatticeSize) -> Self {
        Self::new(generate_edges(size))
    }

    /// Dense id of the edge joining `a` and `b`, in either order.
    pub fn id(&self, a: usize, b: usize) -> Option<usize> {
        self.by_endpoints.get(&(a, b)).copied()
    }

    pub fn edge(&self, id: usize) -> Option<&FineEdge> {
        self.edges.get(id)
    }

    pub fn edges(&self) -> &[FineEdge] {
        &self.edges
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn into_edges(self) -> Vec<FineEdge> {
        self.edges
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_roundtrip() {
        for dims in [[4, 4, 4, 4], [3, 5, 2, 7], [1, 1, 1, 1], [6, 1, 4, 3]] {
            let size = LatticeSize::new(dims);
            for c in size.coords() {
                let v = size.encode(c);
                assert!(v < size.num_vertices());
                assert_eq!(size.decode(v), c, "roundtrip failed for {:?} on {}", c, size);
            }
        }
    }

    #[test]
    fn encode_is_mixed_radix() {
        let size = LatticeSize::new([2, 3, 4, 5]);
        assert_eq!(size.encode([0, 0, 0, 1]), 1);
        assert_eq!(size.encode([0, 0, 1, 0]), 5);
        assert_eq!(size.encode([0, 1, 0, 0]), 20);
        assert_eq!(size.encode([1, 0, 0, 0]), 60);
        assert_eq!(size.encode([1, 2, 3, 4]), 119);
    }

    #[test]
    fn coords_are_lexicographic_and_complete() {
        let size = LatticeSize::new([2, 3, 2, 3]);
        let ids: Vec<usize> = size.coords().map(|c| size.encode(c)).collect();
        assert_eq!(ids, (0..size.num_vertices()).collect::<Vec<_>>());
    }

    #[test]
    fn edge_count_is_four_times_volume() {
        for dims in [[3, 3, 3, 3], [4, 4, 4, 4], [3, 4, 5, 6], [8, 4, 4, 4]] {
            let size = LatticeSize::new(dims);
            let edges = generate_edges(&size);
            assert_eq!(
                edges.len(),
                4 * size.num_vertices(),
                "wrong edge count on {}",
                size
            );
            assert!(edges.iter().all(|e| (e.mu as usize) < DIRECTIONS));
            assert!(edges.iter().all(|e| e.u < e.v));
        }
    }

    #[test]
    fn edges_sorted_and_unique() {
        let edges = generate_edges(&LatticeSize::new([3, 4, 3, 4]));
        assert!(edges.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn edges_join_unit_step_neighbors() {
        let size = LatticeSize::new([3, 4, 5, 3]);
        for e in generate_edges(&size) {
            let cu = size.decode(e.u);
            let cv = size.decode(e.v);
            let mu = e.mu as usize;
            let forward = size.neighbor(cu, mu) == cv || size.neighbor(cv, mu) == cu;
            assert!(forward, "edge {:?} is not a step along mu={}", e, mu);
            for d in (0..DIRECTIONS).filter(|&d| d != mu) {
                assert_eq!(cu[d], cv[d]);
            }
        }
    }

    #[test]
    fn size_two_dimension_collapses_orientations() {
        let size = LatticeSize::cubic(2);
        assert_eq!(generate_edges(&size).len(), 2 * size.num_vertices());
    }

    #[test]
    fn size_one_dimension_gives_self_loops() {
        let size = LatticeSize::new([1, 3, 3, 3]);
        let edges = generate_edges(&size);
        let loops = edges.iter().filter(|e| e.is_self_loop()).count();
        assert_eq!(loops, size.num_vertices());
        assert!(edges.iter().filter(|e| e.is_self_loop()).all(|e| e.mu == 0));
    }

    #[test]
    fn lookup_is_symmetric() {
        let index = EdgeIndex::build(&LatticeSize::new([4, 3, 4, 3]));
        for (id, e) in index.edges().iter().enumerate() {
            assert_eq!(index.id(e.u, e.v), Some(id));
            assert_eq!(index.id(e.v, e.u), Some(id));
        }
        assert_eq!(index.id(0, 0), None);
    }

    #[test]
    fn wraparound_edge_present() {
        let size = LatticeSize::cubic(4);
        let index = EdgeIndex::build(&size);
        let a = size.encode([3, 0, 0, 0]);
        let b = size.encode([0, 0, 0, 0]);
        let id = index.id(a, b).expect("periodic edge missing");
        let e = index.edge(id).unwrap();
        assert_eq!((e.u, e.v, e.mu), (b, a, 0));
    }

    #[test]
    fn zero_dimension_invalid() {
        assert!(LatticeSize::new([4, 4, 0, 4]).validate().is_err());
        assert!(LatticeSize::cubic(3).validate().is_ok());
    }
}
