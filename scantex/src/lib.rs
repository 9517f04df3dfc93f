//! Incrementally textures a live, re-triangulated surface mesh from a
//! stream of camera frames with known poses.
//!
//! The [`TextureGenerator`] keeps a stable id for every world-space triangle
//! it has seen, decides each frame which of them are actually unoccluded,
//! keeps a batched texture atlas in sync with that decision, and retires and
//! recycles ids as the reconstructed mesh changes underneath it. Rendering
//! work is delegated to an injected [`gpu::RenderBackend`].

mod atlas;
mod error;
mod export;
mod mesh;
mod pipeline;
mod scene;
mod states;
mod texturing;
mod triangle_key;
mod triangles;

use std::path::Path;
use std::sync::Mutex;

use glam::Affine3A;
use image::{RgbImage, RgbaImage};

pub use scantex_gpu as gpu;

use self::pipeline::{FramePipeline, FAR_DISTANCE, NEAR_DISTANCE};
pub use self::{
    atlas::*, error::*, export::Mesh, mesh::*, scene::*, states::*,
    texturing::*, triangle_key::*, triangles::*,
};
use crate::gpu::{
    AtlasLayout, BatchId, CameraModel, Pass, PassCamera, PassOutput,
    RenderBackend,
};

/// Texture generator for a live, evolving surface mesh.
///
/// All shared state sits behind one lock that every entry point holds for
/// its whole duration; callers are expected to serialize the mesh and frame
/// feed from outside.
pub struct TextureGenerator {
    inner: Mutex<TextureGeneratorInner>,
}

struct TextureGeneratorInner {
    mode: TexturingMode,
    triangles: Triangles,
    states: TriangleStates,
    scene: SceneChangeDetector,
    pipeline: FramePipeline,
    atlas: AtlasTextures,
    frame_index: u64,
    geometry_dirty: bool,
}

impl TextureGenerator {
    pub fn new(mode: TexturingMode, layout: AtlasLayout) -> Self {
        log::info!(
            "Initializing (mode={mode:?}, atlas={}px / {} triangles per \
             batch)",
            layout.texture_size(),
            layout.capacity(),
        );

        Self {
            inner: Mutex::new(TextureGeneratorInner {
                mode,
                triangles: Triangles::default(),
                states: TriangleStates::default(),
                scene: SceneChangeDetector::default(),
                pipeline: FramePipeline::new(),
                atlas: AtlasTextures::new(layout),
                frame_index: 0,
                geometry_dirty: false,
            }),
        }
    }

    /// Ingests the latest mesh snapshots: touches known triangles, issues
    /// ids for new ones and queues the ones that disappeared for
    /// retirement.
    ///
    /// With `skip_if_unchanged` set, a snapshot whose per-mesh vertex
    /// counts match the previous call is skipped wholesale.
    pub fn update_mesh(&self, meshes: &[SceneMesh], skip_if_unchanged: bool) {
        self.with(|this| {
            if !this.scene.update(meshes, skip_if_unchanged) {
                return;
            }

            this.triangles.ingest(meshes);
            this.geometry_dirty = true;
        });
    }

    /// Runs the visibility and texturing pipeline for one camera frame.
    ///
    /// The frame must match the camera model's resolution. On the first
    /// backend failure the remaining stages are aborted and all persistent
    /// state keeps its previous-frame values, so the call can simply be
    /// retried.
    pub fn process_frame<B>(
        &self,
        frame: &RgbImage,
        camera: &CameraModel,
        world_from_camera: Affine3A,
        backend: &mut B,
    ) -> Result<(), Error>
    where
        B: RenderBackend + ?Sized,
    {
        assert_eq!(
            (frame.width(), frame.height()),
            (camera.width(), camera.height()),
            "frame size must match the camera model"
        );

        self.with(|this| {
            if this.triangles.number_of_ids() == 0 {
                return Ok(());
            }

            #[cfg(feature = "metrics")]
            let started_at = std::time::Instant::now();

            if this.geometry_dirty {
                backend.set_geometry(&this.triangles.vertex_soup())?;
                this.geometry_dirty = false;
            }

            let has_new_triangles = !this.triangles.new_ids().is_empty();

            if this.mode.skips_frame(has_new_triangles, this.frame_index) {
                this.frame_index += 1;

                return Ok(());
            }

            this.pipeline.process(
                backend,
                &mut this.triangles,
                &mut this.states,
                &mut this.atlas,
                this.mode,
                frame,
                camera,
                world_from_camera,
            )?;

            this.frame_index += 1;

            #[cfg(feature = "metrics")]
            log::info!(
                "Frame {} processed in {}",
                this.frame_index,
                humantime::format_duration(started_at.elapsed()),
            );

            Ok(())
        })
    }

    /// Renders the current textured model from an arbitrary view.
    pub fn render<B>(
        &self,
        camera: &CameraModel,
        world_from_camera: Affine3A,
        textured_only: bool,
        backend: &mut B,
    ) -> Result<RgbaImage, Error>
    where
        B: RenderBackend + ?Sized,
    {
        self.with(|this| {
            let id_count = this.triangles.number_of_ids();

            if id_count == 0 {
                return Ok(RgbaImage::new(camera.width(), camera.height()));
            }

            if this.geometry_dirty {
                backend.set_geometry(&this.triangles.vertex_soup())?;
                this.geometry_dirty = false;
            }

            this.atlas.ensure(backend, id_count)?;

            let batches: Vec<_> = this.atlas.batches().collect();

            let output = backend.run_pass(Pass::RenderMesh {
                camera: PassCamera::new(
                    camera.projection(NEAR_DISTANCE, FAR_DISTANCE),
                    world_from_camera,
                ),
                viewport: camera.size(),
                textured_only,
                id_count,
                atlas: this.atlas.layout(),
                batches: &batches,
            })?;

            match output {
                PassOutput::Image(image) => Ok(image),
                output => {
                    panic!("backend returned {output:?} for a mesh render")
                }
            }
        })
    }

    /// Total number of ids ever issued; sizes every per-id buffer.
    pub fn number_of_ids(&self) -> u32 {
        self.with(|this| this.triangles.number_of_ids())
    }

    /// Number of live triangles.
    pub fn len(&self) -> usize {
        self.with(|this| this.triangles.len())
    }

    pub fn is_empty(&self) -> bool {
        self.with(|this| this.triangles.is_empty())
    }

    /// Batches currently holding at least one textured triangle.
    pub fn batch_ids(&self) -> Vec<BatchId> {
        self.with(|this| {
            export::textured_batches(&this.states, this.atlas.layout())
        })
    }

    /// Assembles one batch of textured triangles (`Some`) or the flat-shaded
    /// untextured remainder (`None`), together with the batch's texture.
    ///
    /// Returns `Ok(None)` when the group holds no triangle at all.
    pub fn export_batch<B>(
        &self,
        batch: Option<BatchId>,
        backend: &mut B,
    ) -> Result<Option<(Mesh, Option<RgbaImage>)>, Error>
    where
        B: RenderBackend + ?Sized,
    {
        self.with(|this| {
            let (mesh, texture) = match batch {
                Some(batch) => {
                    let mesh = export::assemble_batch(
                        &this.triangles,
                        &this.states,
                        this.atlas.layout(),
                        batch,
                    );

                    let texture = match this.atlas.target(batch) {
                        Some(target) => Some(backend.read_target(target)?),
                        None => None,
                    };

                    (mesh, texture)
                }

                None => (
                    export::assemble_remainder(
                        &this.triangles,
                        &this.states,
                    ),
                    None,
                ),
            };

            if mesh.is_empty() {
                Ok(None)
            } else {
                Ok(Some((mesh, texture)))
            }
        })
    }

    /// Writes an X3D scene description to `path`, plus one
    /// `<base>_texture_<batch>.png` per textured batch next to it; unless
    /// `textured_only`, the untextured remainder is included as a grey,
    /// flat-shaded shape.
    pub fn export_meshes<B>(
        &self,
        path: &Path,
        textured_only: bool,
        backend: &mut B,
    ) -> Result<(), Error>
    where
        B: RenderBackend + ?Sized,
    {
        self.with(|this| {
            export::export_meshes(
                &this.triangles,
                &this.states,
                &this.atlas,
                backend,
                path,
                textured_only,
            )
        })
    }

    fn with<T>(
        &self,
        f: impl FnOnce(&mut TextureGeneratorInner) -> T,
    ) -> T {
        f(&mut self.inner.lock().unwrap())
    }
}
