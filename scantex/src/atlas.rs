use glam::UVec2;

use crate::gpu::{
    AtlasLayout, BackendError, BatchId, RenderBackend, TargetDesc,
    TargetFormat, TargetId,
};

/// Render targets backing the texture atlas, one per batch of triangle ids.
///
/// Targets are created on demand as the id space grows; growth only appends
/// batches and never touches the content already written to existing ones.
#[derive(Debug)]
pub struct AtlasTextures {
    layout: AtlasLayout,
    targets: Vec<TargetId>,
}

impl AtlasTextures {
    pub fn new(layout: AtlasLayout) -> Self {
        Self {
            layout,
            targets: Vec::new(),
        }
    }

    pub fn layout(&self) -> AtlasLayout {
        self.layout
    }

    pub fn target(&self, batch: BatchId) -> Option<TargetId> {
        self.targets.get(batch.get() as usize).copied()
    }

    pub fn batches(
        &self,
    ) -> impl Iterator<Item = (BatchId, TargetId)> + '_ {
        self.targets
            .iter()
            .enumerate()
            .map(|(batch, target)| (BatchId::new(batch as u32), *target))
    }

    /// Makes sure a target exists for every batch the id space reaches.
    pub fn ensure<B>(
        &mut self,
        backend: &mut B,
        id_count: u32,
    ) -> Result<(), BackendError>
    where
        B: RenderBackend + ?Sized,
    {
        while (self.targets.len() as u32) < self.layout.batches(id_count) {
            let target = backend.create_target(&TargetDesc {
                label: "scantex_atlas",
                size: UVec2::splat(self.layout.texture_size()),
                format: TargetFormat::Rgba,
            })?;

            log::debug!("Created atlas batch {}", self.targets.len());

            self.targets.push(target);
        }

        Ok(())
    }
}
