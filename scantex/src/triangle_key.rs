use std::hash::{Hash, Hasher};

use glam::Vec3;

/// World-space triangle identified by the exact values of its vertices.
///
/// Identity is bitwise over the three vertices, in order; the upstream
/// reconstruction is expected to re-emit byte-stable vertices for a
/// physically unchanged triangle.
#[derive(Copy, Clone, Debug, Default)]
pub struct TriangleKey {
    vertices: [Vec3; 3],
}

impl TriangleKey {
    pub fn new(vertices: [Vec3; 3]) -> Self {
        Self { vertices }
    }

    pub fn vertices(&self) -> [Vec3; 3] {
        self.vertices
    }

    /// A triangle with two identical vertices rasterizes to nothing and
    /// never enters the registry.
    pub fn is_degenerate(&self) -> bool {
        let [v0, v1, v2] = self.bits();

        v0 == v1 || v0 == v2 || v1 == v2
    }

    fn bits(&self) -> [[u32; 3]; 3] {
        self.vertices
            .map(|vertex| [vertex.x, vertex.y, vertex.z].map(f32::to_bits))
    }
}

impl PartialEq for TriangleKey {
    fn eq(&self, other: &Self) -> bool {
        self.bits() == other.bits()
    }
}

impl Eq for TriangleKey {}

impl Hash for TriangleKey {
    fn hash<H>(&self, state: &mut H)
    where
        H: Hasher,
    {
        self.bits().hash(state);
    }
}

#[cfg(test)]
mod tests {
    use glam::vec3;

    use super::*;

    fn key(a: f32, b: f32, c: f32) -> TriangleKey {
        TriangleKey::new([
            vec3(a, 0.0, 0.0),
            vec3(b, 1.0, 0.0),
            vec3(c, 0.0, 1.0),
        ])
    }

    #[test]
    fn identity_is_exact_and_order_sensitive() {
        assert_eq!(key(1.0, 2.0, 3.0), key(1.0, 2.0, 3.0));
        assert_ne!(key(1.0, 2.0, 3.0), key(1.0, 2.0, 3.0 + f32::EPSILON));
        assert_ne!(key(1.0, 2.0, 3.0), key(2.0, 1.0, 3.0));
    }

    #[test]
    fn degenerate_triangles_are_detected() {
        let vertex = vec3(1.0, 2.0, 3.0);

        assert!(TriangleKey::new([vertex, vertex, vec3(0.0, 0.0, 0.0)])
            .is_degenerate());

        assert!(!key(1.0, 2.0, 3.0).is_degenerate());
    }

    #[test]
    fn hash_matches_equality() {
        use std::collections::hash_map::DefaultHasher;

        let hash = |key: &TriangleKey| {
            let mut hasher = DefaultHasher::new();
            key.hash(&mut hasher);
            hasher.finish()
        };

        assert_eq!(hash(&key(1.0, 2.0, 3.0)), hash(&key(1.0, 2.0, 3.0)));
    }
}
