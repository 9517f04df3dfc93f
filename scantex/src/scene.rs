use fxhash::FxHashMap;

use crate::SceneMesh;

/// Cheap change-detection over incoming snapshots.
///
/// Tracks `(mesh id -> vertex count)` across calls; an unchanged map lets
/// the whole triangle walk be skipped. This is a throughput heuristic, not a
/// correctness requirement - a re-triangulation that keeps every vertex
/// count intact is treated as unchanged.
#[derive(Debug, Default)]
pub struct SceneChangeDetector {
    vertex_counts: FxHashMap<u64, usize>,
}

impl SceneChangeDetector {
    /// Returns whether the snapshot differs from the previous one; always
    /// true when `skip_if_unchanged` is off.
    pub fn update(
        &mut self,
        meshes: &[SceneMesh],
        skip_if_unchanged: bool,
    ) -> bool {
        let mut changed = !skip_if_unchanged;

        let mut vertex_counts = FxHashMap::default();
        vertex_counts.reserve(meshes.len());

        for mesh in meshes {
            if self.vertex_counts.get(&mesh.mesh_id())
                != Some(&mesh.vertex_count())
            {
                changed = true;
            }

            vertex_counts.insert(mesh.mesh_id(), mesh.vertex_count());
        }

        if vertex_counts.len() != self.vertex_counts.len() {
            changed = true;
        }

        self.vertex_counts = vertex_counts;

        changed
    }
}
