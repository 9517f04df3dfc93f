use glam::{Affine3A, Vec3};

/// One mesh snapshot delivered by the reconstruction subsystem.
#[derive(Clone, Debug)]
pub struct SceneMesh {
    mesh_id: u64,
    world_from_mesh: Affine3A,
    vertices: Vec<Vec3>,
    indices: Vec<u32>,
}

impl SceneMesh {
    pub fn new(
        mesh_id: u64,
        world_from_mesh: Affine3A,
        vertices: Vec<Vec3>,
        indices: Vec<u32>,
    ) -> Self {
        assert_eq!(
            indices.len() % 3,
            0,
            "triangle indices must come in whole triangles"
        );

        assert!(
            indices.iter().all(|index| (*index as usize) < vertices.len()),
            "triangle index out of bounds"
        );

        Self {
            mesh_id,
            world_from_mesh,
            vertices,
            indices,
        }
    }

    pub fn mesh_id(&self) -> u64 {
        self.mesh_id
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Yields every triangle of this snapshot in world space.
    pub(crate) fn world_triangles(
        &self,
    ) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.indices.chunks_exact(3).map(|indices| {
            [indices[0], indices[1], indices[2]].map(|index| {
                self.world_from_mesh
                    .transform_point3(self.vertices[index as usize])
            })
        })
    }
}
