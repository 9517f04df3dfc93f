use std::collections::hash_map::Entry;

use fxhash::FxHashMap;
use glam::Vec3;

use crate::gpu::TriangleId;
use crate::{SceneMesh, TriangleKey};

/// Registry of every known triangle and its stable id.
///
/// Keys map to ids, ids map back to keys through a dense array, and released
/// ids are recycled before the counter grows; an issued id never moves.
/// Ingestion stamps touched entries with the current generation and queues
/// newcomers and leavers for the next frame's state synchronization.
#[derive(Debug, Default)]
pub struct Triangles {
    index: FxHashMap<TriangleKey, TriangleEntry>,
    keys: Vec<TriangleKey>,
    free_ids: Vec<TriangleId>,
    generation: u64,
    new_ids: Vec<TriangleId>,
    retired_ids: Vec<TriangleId>,
}

#[derive(Copy, Clone, Debug)]
struct TriangleEntry {
    id: TriangleId,
    touched: u64,
}

impl Triangles {
    /// Total number of ids ever issued; sizes every per-id buffer.
    pub fn number_of_ids(&self) -> u32 {
        self.keys.len() as u32
    }

    /// Number of live triangles.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn key(&self, id: TriangleId) -> TriangleKey {
        self.keys[id.get() as usize]
    }

    pub fn id_of(&self, key: &TriangleKey) -> Option<TriangleId> {
        self.index.get(key).map(|entry| entry.id)
    }

    pub(crate) fn iter(
        &self,
    ) -> impl Iterator<Item = (TriangleId, &TriangleKey)> + '_ {
        self.index.iter().map(|(key, entry)| (entry.id, key))
    }

    /// Walks a batch of snapshots: touches known triangles, allocates ids
    /// for new ones, and queues every triangle absent from this generation
    /// for retirement. Degenerate triangles are dropped silently.
    pub fn ingest(&mut self, meshes: &[SceneMesh]) {
        self.generation += 1;

        let expected = meshes
            .iter()
            .map(SceneMesh::triangle_count)
            .sum::<usize>();

        self.index.reserve(expected.saturating_sub(self.index.len()));

        for mesh in meshes {
            for vertices in mesh.world_triangles() {
                let key = TriangleKey::new(vertices);

                if key.is_degenerate() {
                    continue;
                }

                match self.index.entry(key) {
                    Entry::Occupied(mut entry) => {
                        entry.get_mut().touched = self.generation;
                    }

                    Entry::Vacant(entry) => {
                        let id = if let Some(id) = self.free_ids.pop() {
                            self.keys[id.get() as usize] = key;
                            id
                        } else {
                            let id =
                                TriangleId::new(self.keys.len() as u32);

                            self.keys.push(key);
                            id
                        };

                        entry.insert(TriangleEntry {
                            id,
                            touched: self.generation,
                        });

                        self.new_ids.push(id);
                    }
                }
            }
        }

        for entry in self.index.values() {
            if entry.touched != self.generation {
                self.retired_ids.push(entry.id);
            }
        }

        if expected > 0 {
            log::debug!(
                "Triangle ratio: {:.1}%",
                self.len() as f64 / expected as f64 * 100.0
            );
        }
    }

    /// Ids allocated since the last drained frame.
    pub(crate) fn new_ids(&self) -> &[TriangleId] {
        &self.new_ids
    }

    /// Ids queued for retirement since the last drained frame.
    ///
    /// An id re-touched by a later snapshot is dropped here instead of
    /// handed out - retiring it would eventually delete live geometry.
    pub(crate) fn retired_ids(
        &self,
    ) -> impl Iterator<Item = TriangleId> + '_ {
        self.retired_ids.iter().copied().filter(|id| {
            self.index
                .get(&self.keys[id.get() as usize])
                .map_or(false, |entry| entry.touched != self.generation)
        })
    }

    pub(crate) fn drain_queues(&mut self) {
        self.new_ids.clear();
        self.retired_ids.clear();
    }

    /// Releases a deleted triangle's id for reuse; the caller guarantees the
    /// triangle is not on screen this frame.
    pub(crate) fn release(&mut self, id: TriangleId) {
        let key = self.keys[id.get() as usize];
        let removed = self.index.remove(&key);

        assert!(removed.is_some(), "released an id that is not live: {id:?}");

        self.free_ids.push(id);
    }

    /// Dense world-space vertex soup, three consecutive vertices per id
    /// slot; released slots keep their stale vertices and are filtered out
    /// by the backend's state buffer.
    pub(crate) fn vertex_soup(&self) -> Vec<Vec3> {
        let mut soup = Vec::with_capacity(self.keys.len() * 3);

        for key in &self.keys {
            soup.extend(key.vertices());
        }

        soup
    }
}
