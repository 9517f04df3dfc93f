use glam::UVec2;

use crate::gpu::{
    BackendError, IdScope, Pass, PassCamera, PassOutput, RenderBackend,
    TargetDesc, TargetFormat, TargetId,
};

/// Rasterizes triangle ids at reduced resolution (stages 1 and 2).
///
/// One instance per scope; the render target is created on first use and
/// recreated when the camera resolution changes.
#[derive(Debug)]
pub struct IdPass {
    scope: IdScope,
    target: Option<(TargetId, UVec2)>,
}

impl IdPass {
    pub fn new(scope: IdScope) -> Self {
        Self {
            scope,
            target: None,
        }
    }

    pub fn run<B>(
        &mut self,
        backend: &mut B,
        camera: PassCamera,
        viewport: UVec2,
        id_count: u32,
    ) -> Result<TargetId, BackendError>
    where
        B: RenderBackend + ?Sized,
    {
        let target = self.target(backend, viewport)?;

        let output = backend.run_pass(Pass::RasterizeIds {
            target,
            scope: self.scope,
            camera,
            viewport,
            id_count,
        })?;

        assert!(
            matches!(output, PassOutput::Done),
            "backend returned {output:?} for an id pass"
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
            label: match self.scope {
                IdScope::Active => "scantex_active_ids",
                IdScope::Any => "scantex_any_ids",
            },
            size,
            format: TargetFormat::Ids,
        })?;

        self.target = Some((target, size));

        Ok(target)
    }
}
