use std::{error, fmt};

use glam::{UVec2, Vec3};
use image::RgbaImage;

use crate::{Pass, PassOutput};

/// Capability expected from the rendering backend.
///
/// The generator owns no GPU resources itself; it describes render targets
/// and passes and hands them to this trait. The backend is injected into
/// every entry point rather than reached through a process-wide handle,
/// which keeps the whole pipeline runnable against a fake implementation.
///
/// All calls are synchronous and blocking on the calling thread.
pub trait RenderBackend {
    /// Creates a persistent render target and returns its handle.
    fn create_target(
        &mut self,
        desc: &TargetDesc,
    ) -> Result<TargetId, BackendError>;

    /// Uploads the triangle soup every id-indexed pass draws from; three
    /// consecutive vertices per triangle id, in world space.
    fn set_geometry(&mut self, vertices: &[Vec3]) -> Result<(), BackendError>;

    /// Runs one render pass.
    fn run_pass(&mut self, pass: Pass<'_>) -> Result<PassOutput, BackendError>;

    /// Reads a target's current pixels back.
    fn read_target(
        &mut self,
        target: TargetId,
    ) -> Result<RgbaImage, BackendError>;
}

/// Handle of a render target created through [`RenderBackend`].
#[repr(transparent)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TargetId(u32);

impl TargetId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TargetDesc {
    pub label: &'static str,
    pub size: UVec2,
    pub format: TargetFormat,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TargetFormat {
    /// Per-pixel triangle id, marker level and depth estimate.
    Ids,

    /// Single-channel filtered depth.
    Depth,

    /// Rgba8 color.
    Rgba,
}

/// Resource or render failure reported by the backend.
///
/// A failing pass aborts the current frame; the generator's persistent state
/// stays consistent and the call can simply be repeated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackendError {
    message: String,
}

impl BackendError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rendering backend failed: {}", self.message)
    }
}

impl error::Error for BackendError {}
