use bytemuck::{Pod, Zeroable};
use derivative::Derivative;
use glam::{Affine3A, Mat4, UVec2};
use image::{RgbImage, RgbaImage};

use crate::{AtlasLayout, BatchId, TargetId, TriangleId, TriangleState};

/// Which triangles an id pass rasterizes.
///
/// Each scope owns a reserved marker level written next to the id; the
/// discrete levels survive rasterization and downsampling, letting the
/// classification stage tell the two id images apart.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum IdScope {
    /// Non-retired triangles only; candidates for texturing.
    Active,

    /// Every known triangle, retired ones included; keeps the depth
    /// estimate free of holes from geometry about to be dropped.
    Any,
}

impl IdScope {
    pub fn marker(self) -> u8 {
        match self {
            Self::Active => 126,
            Self::Any => 10,
        }
    }

    pub fn includes_retired(self) -> bool {
        matches!(self, Self::Any)
    }
}

/// Camera data shared by every rasterizing pass.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct PassCamera {
    pub projection: Mat4,
    pub world_from_camera: Mat4,
}

impl PassCamera {
    pub fn new(projection: Mat4, world_from_camera: Affine3A) -> Self {
        Self {
            projection,
            world_from_camera: Mat4::from(world_from_camera),
        }
    }

    pub fn camera_from_world(&self) -> Mat4 {
        self.world_from_camera.inverse()
    }
}

/// One render pass of the per-frame pipeline, described for the backend.
#[derive(Derivative)]
#[derivative(Debug)]
pub enum Pass<'a> {
    /// Rasterizes triangle ids at reduced resolution.
    RasterizeIds {
        target: TargetId,
        scope: IdScope,
        camera: PassCamera,
        viewport: UVec2,
        id_count: u32,
    },

    /// Downsamples and denoises the depth estimate of an id target.
    FilterDepth {
        source: TargetId,
        target: TargetId,
        radius: u32,
    },

    /// Depth-tests the active-id target against the filtered depth within
    /// the clip bounds; returns [`PassOutput::VisibleSet`].
    ClassifyVisibility {
        ids: TargetId,
        depth: TargetId,
        near: f32,
        far: f32,
        id_count: u32,
    },

    /// Applies state transitions, in order, to the persistent per-triangle
    /// state buffer, growing it to `id_count` entries first.
    SyncStates {
        changes: &'a [(TriangleId, TriangleState)],
        id_count: u32,
    },

    /// Projects the listed triangles into the camera frame, samples their
    /// color and writes it into the batch texture's atlas slots.
    TextureTriangles {
        target: TargetId,
        batch: BatchId,
        triangles: &'a [TriangleId],
        #[derivative(Debug = "ignore")]
        frame: &'a RgbImage,
        camera: PassCamera,
        atlas: AtlasLayout,
    },

    /// Composes the textured batches (plus, unless `textured_only`, the
    /// flat-shaded remainder) into an image; returns [`PassOutput::Image`].
    RenderMesh {
        camera: PassCamera,
        viewport: UVec2,
        textured_only: bool,
        id_count: u32,
        atlas: AtlasLayout,
        batches: &'a [(BatchId, TargetId)],
    },
}

/// What a pass hands back to the generator.
#[derive(Derivative)]
#[derivative(Debug)]
pub enum PassOutput {
    Done,

    /// Ids that passed the depth test, from [`Pass::ClassifyVisibility`].
    VisibleSet(Vec<TriangleId>),

    /// Composed image, from [`Pass::RenderMesh`].
    Image(#[derivative(Debug = "ignore")] RgbaImage),
}
