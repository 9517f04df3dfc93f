use glam::UVec2;

use crate::gpu::{
    BackendError, Pass, PassOutput, RenderBackend, TargetDesc, TargetFormat,
    TargetId,
};

/// Downsamples and denoises the depth estimate of the any-id pass
/// (stage 3), suppressing reconstruction noise before occlusion testing.
#[derive(Debug, Default)]
pub struct DepthFilterPass {
    target: Option<(TargetId, UVec2)>,
}

impl DepthFilterPass {
    pub fn run<B>(
        &mut self,
        backend: &mut B,
        source: TargetId,
        size: UVec2,
        radius: u32,
    ) -> Result<TargetId, BackendError>
    where
        B: RenderBackend + ?Sized,
    {
        let target = self.target(backend, size)?;

        let output = backend.run_pass(Pass::FilterDepth {
            source,
            target,
            radius,
        })?;

        assert!(
            matches!(output, PassOutput::Done),
            "backend returned {output:?} for a depth filter"
        );

        Ok(target)
    }

    fn target<B>(
        &mut self,
        backend: &mut B,
        size: UVec2,
    ) -> Result<TargetId, BackendError>
    where
        B: RenderBackend + ?Sized,
    {
        if let Some((target, target_size)) = self.target {
            if target_size == size {
                return Ok(target);
            }
        }

        let target = backend.create_target(&TargetDesc {
            label: "scantex_filtered_depth",
            size,
            format: TargetFormat::Depth,
        })?;

        self.target = Some((target, size));

        Ok(target)
    }
}
