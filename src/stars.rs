//! Block-star aggregation: fine edges → coarse stars.
//!
//! Block decimation keeps the sublattice of vertices whose coordinates are
//! all even. Each (even vertex, direction) pair designates one coarse edge,
//! and each coarse edge owns a *star*: the fine edges lying close to its
//! anchor vertex.
//!
//! A fine edge e = (u, v, μ) is assigned by looking at the smaller endpoint
//! coordinate m_d = min(u_d, v_d) in each dimension, collecting the even
//! coordinates within periodic distance 1 of m_d, and visiting the Cartesian
//! product of those lists as candidate anchors. Every coarse edge found at a
//! candidate anchor receives e.
//!
//! Stars overlap, and a fine edge reached through several anchors appears
//! several times in the same star. Those repeats are kept: they become
//! weights in the aggregation matrix.
//!
//! Work is O(|E_f|) with a small constant (at most 3⁴ anchors × 4 directions
//! per fine edge), independent of the number of stars.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use smallvec::{smallvec, SmallVec};

use crate::lattice::{Coord, EdgeIndex, FineEdge, LatticeSize, DIRECTIONS};

/// Candidate even coordinates for one dimension (1 to 3 entries).
pub type Candidates = SmallVec<[usize; 3]>;

/// Even coordinates near `c` on a ring of size `n`.
///
/// Starts from `base = 2·⌊c/2⌋` and adds `base − 2` and `base + 2`
/// (mod n) when they lie within periodic distance 1 of `c`. On small rings
/// both shifts can land on the same value, which is then listed twice:
/// `even_candidates(1, 4) == [0, 2, 2]`.
pub fn even_candidates(c: usize, n: usize) -> Candidates {
    let base = (c / 2) * 2;
    let mut cand: Candidates = smallvec![base];
    let shifts = [(base + 2 * n - 2) % n, (base + 2) % n];
    for e in shifts {
        if (c + n - e) % n <= 1 || (e + n - c) % n <= 1 {
            cand.push(e);
        }
    }
    cand
}

/// Composite key of a coarse edge: anchor vertex plus direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CoarseKey {
    pub anchor: Coord,
    pub mu: u8,
}

/// The coarse edges and their key lookup.
#[derive(Debug, Clone)]
pub struct CoarseIndex {
    edges: Vec<FineEdge>,
    by_key: HashMap<CoarseKey, usize>,
}

impl CoarseIndex {
    /// Select the coarse edges from a sorted fine edge list.
    ///
    /// A fine edge is coarse when its smaller endpoint has all-even
    /// coordinates. Ids follow the fine edge order. A wraparound edge
    /// (N−1 → 0) is stored from its 0 endpoint and shares the key of the
    /// forward edge there; the later id owns the key, so some ids end up
    /// with no star.
    pub fn build(size: &LatticeSize, edges: &[FineEdge]) -> Self {
        let mut coarse = Vec::new();
        let mut by_key = HashMap::new();
        for e in edges {
            let anchor = size.decode(e.u);
            if anchor.iter().all(|&x| x % 2 == 0) {
                by_key.insert(CoarseKey { anchor, mu: e.mu }, coarse.len());
                coarse.push(*e);
            }
        }
        Self {
            edges: coarse,
            by_key,
        }
    }

    pub fn lookup(&self, key: &CoarseKey) -> Option<usize> {
        self.by_key.get(key).copied()
    }

    /// Fine edge designated as coarse edge `cid`.
    pub fn edge(&self, cid: usize) -> Option<&FineEdge> {
        self.edges.get(cid)
    }

    /// Number of coarse edges (ids handed out).
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Number of distinct keys.
    pub fn num_keys(&self) -> usize {
        self.by_key.len()
    }
}

/// Coarse id → ordered fine edge ids, repeats preserved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StarMap {
    stars: BTreeMap<usize, Vec<usize>>,
}

impl StarMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fine edge to a star, creating the star if needed.
    pub fn push(&mut self, coarse_id: usize, fine_id: usize) {
        self.stars.entry(coarse_id).or_default().push(fine_id);
    }

    /// Replace a whole star.
    pub fn insert(&mut self, coarse_id: usize, members: Vec<usize>) {
        self.stars.insert(coarse_id, members);
    }

    pub fn get(&self, coarse_id: usize) -> Option<&[usize]> {
        self.stars.get(&coarse_id).map(Vec::as_slice)
    }

    /// Stars in ascending coarse id order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &[usize])> + '_ {
        self.stars.iter().map(|(&k, v)| (k, v.as_slice()))
    }

    /// Ascending coarse ids.
    pub fn ids(&self) -> impl Iterator<Item = usize> + '_ {
        self.stars.keys().copied()
    }

    /// Number of stars.
    pub fn len(&self) -> usize {
        self.stars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stars.is_empty()
    }

    /// Sum of all star sizes (repeats included).
    pub fn total_members(&self) -> usize {
        self.stars.values().map(Vec::len).sum()
    }
}

/// Assign every fine edge to the stars of all coarse edges anchored nearby.
pub fn aggregate_stars(size: &LatticeSize, index: &EdgeIndex, coarse: &CoarseIndex) -> StarMap {
    let mut stars = StarMap::new();
    for (pos, e) in index.edges().iter().enumerate() {
        let cu = size.decode(e.u);
        let cv = size.decode(e.v);
        let cands: [Candidates; DIRECTIONS] =
            std::array::from_fn(|d| even_candidates(cu[d].min(cv[d]), size.dim(d)));
        let fine_id = index.id(e.u, e.v).unwrap_or(pos);

        for &a0 in &cands[0] {
            for &a1 in &cands[1] {
                for &a2 in &cands[2] {
                    for &a3 in &cands[3] {
                        let anchor = [a0, a1, a2, a3];
                        for mu in 0..DIRECTIONS as u8 {
                            if let Some(cid) = coarse.lookup(&CoarseKey { anchor, mu }) {
                                stars.push(cid, fine_id);
                            }
                        }
                    }
                }
            }
        }
    }
    stars
}

#[cfg(test)]
mod tests {
    use super::*;

    fn periodic_distance(a: usize, b: usize, n: usize) -> usize {
        let d = (a + n - b) % n;
        d.min(n - d)
    }

    #[test]
    fn even_candidates_small_ring() {
        assert_eq!(even_candidates(0, 4).as_slice(), &[0]);
        assert_eq!(even_candidates(1, 4).as_slice(), &[0, 2, 2]);
        assert_eq!(even_candidates(2, 4).as_slice(), &[2]);
        assert_eq!(even_candidates(3, 4).as_slice(), &[2, 0, 0]);
    }

    #[test]
    fn even_candidates_large_ring() {
        assert_eq!(even_candidates(0, 8).as_slice(), &[0]);
        assert_eq!(even_candidates(1, 8).as_slice(), &[0, 2]);
        assert_eq!(even_candidates(4, 8).as_slice(), &[4]);
        assert_eq!(even_candidates(7, 8).as_slice(), &[6, 0]);
    }

    #[test]
    fn even_candidates_are_near_and_even() {
        for n in [4, 6, 8, 10, 16] {
            for c in 0..n {
                let cand = even_candidates(c, n);
                assert!((1..=3).contains(&cand.len()));
                assert_eq!(cand[0], (c / 2) * 2);
                for &e in &cand {
                    assert_eq!(e % 2, 0, "odd candidate {} for c={} n={}", e, c, n);
                    assert!(periodic_distance(c, e, n) <= 1);
                }
            }
        }
    }

    #[test]
    fn one_coarse_edge_per_even_vertex_and_direction() {
        for dims in [[4, 4, 4, 4], [6, 4, 8, 4]] {
            let size = LatticeSize::new(dims);
            let index = EdgeIndex::build(&size);
            let coarse = CoarseIndex::build(&size, index.edges());
            let even: Vec<Coord> = size
                .coords()
                .filter(|c| c.iter().all(|&x| x % 2 == 0))
                .collect();
            assert_eq!(coarse.num_keys(), 4 * even.len());
            assert!(coarse.len() > coarse.num_keys());
            for anchor in even {
                for mu in 0..DIRECTIONS as u8 {
                    let cid = coarse
                        .lookup(&CoarseKey { anchor, mu })
                        .unwrap_or_else(|| panic!("missing coarse edge at {:?} mu={}", anchor, mu));
                    let e = coarse.edge(cid).unwrap();
                    assert_eq!(size.decode(e.u), anchor);
                    assert_eq!(e.mu, mu);
                }
            }
        }
    }

    #[test]
    fn wraparound_key_collision_keeps_later_id() {
        // N0 = 3: the edge 2 → 0 is stored from vertex 0, like the edge 0 → 1.
        let size = LatticeSize::new([3, 4, 4, 4]);
        let index = EdgeIndex::build(&size);
        let coarse = CoarseIndex::build(&size, index.edges());
        assert!(coarse.num_keys() < coarse.len());
        let cid = coarse
            .lookup(&CoarseKey { anchor: [0, 0, 0, 0], mu: 0 })
            .unwrap();
        let e = coarse.edge(cid).unwrap();
        assert_eq!(e.v, size.encode([2, 0, 0, 0]));
    }

    #[test]
    fn every_star_contains_its_own_coarse_edge() {
        let size = LatticeSize::cubic(4);
        let index = EdgeIndex::build(&size);
        let coarse = CoarseIndex::build(&size, index.edges());
        let stars = aggregate_stars(&size, &index, &coarse);
        assert_eq!(stars.len(), coarse.num_keys());
        for (cid, members) in stars.iter() {
            let e = coarse.edge(cid).unwrap();
            let own = index.id(e.u, e.v).unwrap();
            assert!(members.contains(&own), "star {} misses its coarse edge {}", cid, own);
            assert!(members.iter().all(|&f| f < index.len()));
        }
    }

    #[test]
    fn stars_sharing_an_anchor_agree() {
        let size = LatticeSize::new([8, 4, 4, 6]);
        let index = EdgeIndex::build(&size);
        let coarse = CoarseIndex::build(&size, index.edges());
        let stars = aggregate_stars(&size, &index, &coarse);
        let anchor = [2, 0, 2, 4];
        let star = |mu: u8| {
            let cid = coarse.lookup(&CoarseKey { anchor, mu }).unwrap();
            stars.get(cid).unwrap().to_vec()
        };
        for mu in 1..DIRECTIONS as u8 {
            assert_eq!(star(0), star(mu));
        }
    }

    #[test]
    fn repeated_members_are_kept() {
        let size = LatticeSize::cubic(4);
        let index = EdgeIndex::build(&size);
        let coarse = CoarseIndex::build(&size, index.edges());
        let stars = aggregate_stars(&size, &index, &coarse);
        let has_repeat = stars.iter().any(|(_, m)| {
            let mut sorted = m.to_vec();
            sorted.sort_unstable();
            sorted.windows(2).any(|w| w[0] == w[1])
        });
        assert!(has_repeat, "N=4 rings must produce repeated star members");
    }

    #[test]
    fn membership_bounded_by_constant_per_edge() {
        for l in [4, 6, 8] {
            let size = LatticeSize::cubic(l);
            let index = EdgeIndex::build(&size);
            let coarse = CoarseIndex::build(&size, index.edges());
            let stars = aggregate_stars(&size, &index, &coarse);
            assert!(stars.total_members() <= index.len() * 81 * DIRECTIONS);
            assert!(stars.total_members() >= index.len());
        }
    }

    #[test]
    fn aggregation_is_deterministic() {
        let size = LatticeSize::new([4, 6, 4, 4]);
        let run = || {
            let index = EdgeIndex::build(&size);
            let coarse = CoarseIndex::build(&size, index.edges());
            aggregate_stars(&size, &index, &coarse)
        };
        assert_eq!(run(), run());
    }
}
