use bytemuck::{Pod, Zeroable};

/// Stable identifier of a tracked triangle.
///
/// Ids index every per-triangle buffer on both sides of the backend
/// boundary; once issued, an id keeps its position until it is explicitly
/// released.
#[repr(transparent)]
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Pod,
    Zeroable,
)]
pub struct TriangleId(u32);

impl TriangleId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn get(self) -> u32 {
        self.0
    }
}
