use crate::gpu::{
    BackendError, Pass, PassOutput, RenderBackend, TargetId, TriangleId,
};

/// Depth-tests the active-id image against the filtered depth (stage 4);
/// a triangle counts as visible when at least one of its pixels passes.
#[derive(Debug, Default)]
pub struct VisibilityPass;

impl VisibilityPass {
    pub fn run<B>(
        &self,
        backend: &mut B,
        ids: TargetId,
        depth: TargetId,
        near: f32,
        far: f32,
        id_count: u32,
    ) -> Result<Vec<TriangleId>, BackendError>
    where
        B: RenderBackend + ?Sized,
    {
        let output = backend.run_pass(Pass::ClassifyVisibility {
            ids,
            depth,
            near,
            far,
            id_count,
        })?;

        match output {
            PassOutput::VisibleSet(visible) => Ok(visible),
            output => {
                panic!("backend returned {output:?} for a visibility pass")
            }
        }
    }
}
