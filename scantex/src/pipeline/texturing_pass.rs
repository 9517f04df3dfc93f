use image::RgbImage;

use crate::gpu::{
    BackendError, Pass, PassCamera, PassOutput, RenderBackend, TriangleId,
};
use crate::AtlasTextures;

/// Projects triangles into the camera frame and samples their color into
/// the atlas (stage 6); one backend pass per touched batch.
#[derive(Debug, Default)]
pub struct TexturingPass;

impl TexturingPass {
    pub fn run<B>(
        &self,
        backend: &mut B,
        atlas: &AtlasTextures,
        triangles: &[TriangleId],
        frame: &RgbImage,
        camera: PassCamera,
    ) -> Result<(), BackendError>
    where
        B: RenderBackend + ?Sized,
    {
        if triangles.is_empty() {
            return Ok(());
        }

        let layout = atlas.layout();

        let mut ids = triangles.to_vec();
        ids.sort_unstable();

        let mut start = 0;

        while start < ids.len() {
            let batch = layout.batch_id(ids[start]);

            let end = start
                + ids[start..]
                    .partition_point(|id| layout.batch_id(*id) == batch);

            let target =
                atlas.target(batch).expect("atlas batch target missing");

            let output = backend.run_pass(Pass::TextureTriangles {
                target,
                batch,
                triangles: &ids[start..end],
                frame,
                camera,
                atlas: layout,
            })?;

            assert!(
                matches!(output, PassOutput::Done),
                "backend returned {output:?} for a texturing pass"
            );

            start = end;
        }

        Ok(())
    }
}
