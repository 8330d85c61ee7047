//! Per-resolution cache of triangulated domain meshes.
//!
//! Entries are tagged with the boundary generation they were built from. A mesh built
//! against an older generation is handed back to its caller but never published, so
//! readers only ever see meshes that match the current boundary. At most
//! [`MAX_CACHED_MESHES`] resolutions are kept; the oldest published one is evicted first.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use super::mesh::DomainMesh;

/// Shared, immutable mesh buffer (avoids cloning on every access).
pub type SharedMesh = Arc<DomainMesh>;

/// Resolutions kept per boundary generation.
pub const MAX_CACHED_MESHES: usize = 8;

#[derive(Debug, Default)]
pub struct MeshCache {
    generation: u64,
    meshes: HashMap<usize, SharedMesh>,
    /// Cached resolutions, oldest first.
    order: VecDeque<usize>,
    hits: usize,
    misses: usize,
}

/// Cache statistics for diagnostics and monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MeshCacheStats {
    /// Number of cached resolutions.
    pub entries: usize,
    pub hits: usize,
    pub misses: usize,
    /// Boundary generation the cached meshes belong to.
    pub generation: u64,
    /// Estimated memory usage in bytes.
    pub estimated_memory_bytes: usize,
}

impl MeshCacheStats {
    /// Returns the cache hit rate as a value between 0.0 and 1.0.
    /// Returns 0.0 if no cache accesses have been made.
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

impl MeshCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn stats(&self) -> MeshCacheStats {
        MeshCacheStats {
            entries: self.meshes.len(),
            hits: self.hits,
            misses: self.misses,
            generation: self.generation,
            estimated_memory_bytes: self.estimate_memory_usage(),
        }
    }

    /// Drops every mesh and moves the cache to `generation`. Counters are kept.
    pub fn invalidate(&mut self, generation: u64) {
        self.meshes.clear();
        self.order.clear();
        self.generation = generation;
    }

    /// Cached mesh for `resolution`, if it was built from `generation`.
    pub fn get(&mut self, resolution: usize, generation: u64) -> Option<SharedMesh> {
        let found = if generation == self.generation {
            self.meshes.get(&resolution).cloned()
        } else {
            None
        };
        match found {
            Some(mesh) => {
                self.hits += 1;
                Some(mesh)
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Publishes a freshly built mesh unless the cache has moved past `generation`.
    ///
    /// If another caller already published the same resolution, that mesh wins so every
    /// reader of one generation shares a single buffer.
    pub fn publish(&mut self, resolution: usize, generation: u64, mesh: DomainMesh) -> SharedMesh {
        if generation != self.generation {
            return Arc::new(mesh);
        }
        if let Some(existing) = self.meshes.get(&resolution) {
            return Arc::clone(existing);
        }
        while self.order.len() >= MAX_CACHED_MESHES {
            if let Some(oldest) = self.order.pop_front() {
                self.meshes.remove(&oldest);
            }
        }
        let mesh = Arc::new(mesh);
        self.meshes.insert(resolution, Arc::clone(&mesh));
        self.order.push_back(resolution);
        mesh
    }

    /// Estimates the memory usage of all cached meshes in bytes.
    #[must_use]
    pub fn estimate_memory_usage(&self) -> usize {
        self.meshes
            .values()
            .map(|m| {
                m.parameters.len() * std::mem::size_of::<f64>() * 2
                    + m.indices.len() * std::mem::size_of::<u32>()
                    + std::mem::size_of::<(usize, SharedMesh)>()
            })
            .sum()
    }
}
