use crate::gpu::CameraModel;

/// Policy controlling when atlas regions are refreshed from the camera.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum TexturingMode {
    /// Texture the currently visible set each frame and leave every other
    /// atlas region untouched. Occluded or retired-but-undeleted geometry
    /// may show stale texture, but each frame's cost is proportional to the
    /// visible set alone.
    #[default]
    PersistUntilReplaced,

    /// Eagerly texture newly introduced triangles with a widened camera so
    /// their neighborhood is pre-filled before the true camera reaches it;
    /// frames that introduce no new triangles may be dropped at half rate.
    RedrawOnRetirement,
}

impl TexturingMode {
    /// Whether this frame can be dropped wholesale.
    pub(crate) fn skips_frame(
        self,
        has_new_triangles: bool,
        frame_index: u64,
    ) -> bool {
        match self {
            Self::PersistUntilReplaced => false,
            Self::RedrawOnRetirement => {
                !has_new_triangles && frame_index % 2 == 0
            }
        }
    }

    /// Camera used to pre-texture new triangles, where the policy wants
    /// that.
    pub(crate) fn eager_camera(
        self,
        camera: &CameraModel,
    ) -> Option<CameraModel> {
        match self {
            Self::PersistUntilReplaced => None,
            Self::RedrawOnRetirement => Some(camera.widened()),
        }
    }
}
