use glam::{vec2, Vec2};

use crate::TriangleId;

/// Group of triangle ids sharing one texture image and one draw batch.
#[repr(transparent)]
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
pub struct BatchId(u32);

impl BatchId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

/// Deterministic layout of a batch texture.
///
/// Each batch texture holds up to `capacity` triangles; consecutive slot
/// pairs share one square cell, split along its diagonal, and every slot is
/// inset by half a texel against sampling bleed. Triangle ids map to batches
/// and slots by plain division, so growing the id space only appends batches
/// and never moves an existing slot.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct AtlasLayout {
    texture_size: u32,
    capacity: u32,
    cells: u32,
}

impl AtlasLayout {
    pub const DEFAULT_TEXTURE_SIZE: u32 = 4096;
    pub const DEFAULT_CAPACITY: u32 = 8192;

    pub fn new(texture_size: u32, capacity: u32) -> Self {
        assert!(texture_size > 0);
        assert!(capacity > 0);

        let pairs = (capacity + 1) / 2;
        let cells = (pairs as f32).sqrt().ceil() as u32;

        assert!(
            texture_size >= cells * 2,
            "atlas texture of {texture_size}px cannot hold {capacity} triangles"
        );

        Self {
            texture_size,
            capacity,
            cells,
        }
    }

    pub fn texture_size(&self) -> u32 {
        self.texture_size
    }

    /// Triangles per batch texture, fixed at construction.
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn batch_id(&self, id: TriangleId) -> BatchId {
        BatchId::new(id.get() / self.capacity)
    }

    /// Slot of a triangle inside its batch texture.
    pub fn slot(&self, id: TriangleId) -> u32 {
        id.get() % self.capacity
    }

    /// Number of batches needed to cover the given id count.
    pub fn batches(&self, number_of_ids: u32) -> u32 {
        (number_of_ids + self.capacity - 1) / self.capacity
    }

    /// UV corners reserved for a slot, in the same vertex order as the
    /// triangle's world-space corners.
    pub fn slot_uv(&self, slot: u32) -> [Vec2; 3] {
        assert!(slot < self.capacity, "slot out of range: {slot}");

        let cell = slot / 2;
        let cell_uv = 1.0 / self.cells as f32;
        let inset = 0.5 / self.texture_size as f32;

        let x0 = (cell % self.cells) as f32 * cell_uv + inset;
        let y0 = (cell / self.cells) as f32 * cell_uv + inset;
        let x1 = (cell % self.cells + 1) as f32 * cell_uv - inset;
        let y1 = (cell / self.cells + 1) as f32 * cell_uv - inset;

        if slot % 2 == 0 {
            [vec2(x0, y0), vec2(x1, y0), vec2(x0, y1)]
        } else {
            [vec2(x1, y1), vec2(x0, y1), vec2(x1, y0)]
        }
    }
}

impl Default for AtlasLayout {
    fn default() -> Self {
        Self::new(Self::DEFAULT_TEXTURE_SIZE, Self::DEFAULT_CAPACITY)
    }
}
