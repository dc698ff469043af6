use glam::{IVec3, Vec3};

use crate::{
    core::particle::ParticleSystem,
    error::{ensure_positive, Result, SimError},
};

const HASH_PRIMES: IVec3 = IVec3::new(73_856_093, 19_349_663, 83_492_791);

/// Uniform spatial hash answering fixed-radius neighbor queries.
///
/// Cells have the size of the interaction radius, so every neighbor of a particle lies
/// in one of the 27 cells around it. Cells are hashed into a fixed number of buckets;
/// distinct cells may share a bucket, which only costs extra distance checks.
#[derive(Debug, Clone)]
pub struct NeighborSearch {
    radius: f32,
    buckets: Vec<Vec<usize>>,
    neighbors: Vec<Vec<usize>>,
}

impl NeighborSearch {
    pub fn new(radius: f32, bucket_count: usize) -> Result<Self> {
        ensure_positive("radius", radius)?;
        if bucket_count == 0 {
            return Err(SimError::invalid("bucket_count", "must be positive"));
        }
        Ok(Self {
            radius,
            buckets: vec![Vec::new(); bucket_count],
            neighbors: Vec::new(),
        })
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Cell coordinate of `position`; saturates for far or non-finite positions.
    fn cell(&self, position: Vec3) -> IVec3 {
        (position / self.radius).floor().as_ivec3()
    }

    fn hash(&self, cell: IVec3) -> usize {
        let c = cell.wrapping_mul(HASH_PRIMES);
        let folded = (c.x ^ c.y ^ c.z) as u32 as usize;
        folded % self.buckets.len()
    }

    /// Distinct bucket indices covering the 3×3×3 block of cells around `position`.
    fn candidate_buckets(&self, position: Vec3) -> ([usize; 27], usize) {
        let center = self.cell(position);
        let mut seen = [0usize; 27];
        let mut count = 0;
        for x in -1..=1 {
            for y in -1..=1 {
                for z in -1..=1 {
                    let hash = self.hash(center.wrapping_add(IVec3::new(x, y, z)));
                    if seen[..count].contains(&hash) {
                        continue;
                    }
                    seen[count] = hash;
                    count += 1;
                }
            }
        }
        (seen, count)
    }

    /// Rebuilds every bucket and neighbor list from the current positions.
    pub fn update(&mut self, system: &ParticleSystem) {
        for bucket in &mut self.buckets {
            bucket.clear();
        }
        for (index, particle) in system.iter().enumerate() {
            let hash = self.hash(self.cell(particle.position));
            self.buckets[hash].push(index);
        }

        self.neighbors.resize_with(system.len(), Vec::new);
        let mut lists = std::mem::take(&mut self.neighbors);
        for (index, list) in lists.iter_mut().enumerate() {
            list.clear();
            self.collect(system, system[index].position, list);
        }
        self.neighbors = lists;
    }

    fn collect(&self, system: &ParticleSystem, point: Vec3, out: &mut Vec<usize>) {
        let (buckets, count) = self.candidate_buckets(point);
        for &hash in &buckets[..count] {
            for &j in &self.buckets[hash] {
                // Buckets may be stale relative to `system`; skip indices it no longer has.
                if let Some(other) = system.get(j) {
                    if point.distance(other.position) < self.radius {
                        out.push(j);
                    }
                }
            }
        }
    }

    /// Neighbors of particle `index` found by the last [`NeighborSearch::update`],
    /// including the particle itself.
    pub fn neighbors(&self, index: usize) -> &[usize] {
        self.neighbors.get(index).map_or(&[], Vec::as_slice)
    }

    pub fn neighbor_lists(&self) -> &[Vec<usize>] {
        &self.neighbors
    }

    /// Indices of the particles within the radius of an arbitrary point.
    ///
    /// Uses the buckets of the last update and does not mutate the search.
    pub fn search(&self, system: &ParticleSystem, point: Vec3) -> Vec<usize> {
        let mut found = Vec::new();
        self.collect(system, point, &mut found);
        found
    }
}
