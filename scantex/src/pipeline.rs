mod depth_pass;
mod id_pass;
mod texturing_pass;
mod visibility_pass;

use fxhash::FxHashSet;
use glam::Affine3A;
use image::RgbImage;

use self::depth_pass::*;
use self::id_pass::*;
use self::texturing_pass::*;
use self::visibility_pass::*;
use crate::gpu::{
    BackendError, CameraModel, IdScope, PassCamera, RenderBackend,
    TriangleId, TriangleState,
};
use crate::{AtlasTextures, TexturingMode, TriangleStates, Triangles};

pub(crate) const DOWNSAMPLE_FACTOR: u32 = 4;
pub(crate) const DEPTH_FILTER_RADIUS: u32 = 3;
pub(crate) const NEAR_DISTANCE: f32 = 0.01;
pub(crate) const FAR_DISTANCE: f32 = 1000.0;

/// The fixed per-frame pass sequence.
///
/// Stages 1-4 only render; everything that mutates the registry, the state
/// mirror or the queues runs strictly after the pass guarding it succeeded,
/// so the first backend failure aborts the frame without leaving partial
/// state behind.
#[derive(Debug)]
pub(crate) struct FramePipeline {
    active_ids: IdPass,
    any_ids: IdPass,
    depth: DepthFilterPass,
    visibility: VisibilityPass,
    texturing: TexturingPass,
}

impl FramePipeline {
    pub fn new() -> Self {
        Self {
            active_ids: IdPass::new(IdScope::Active),
            any_ids: IdPass::new(IdScope::Any),
            depth: DepthFilterPass::default(),
            visibility: VisibilityPass,
            texturing: TexturingPass,
        }
    }

    pub fn process<B>(
        &mut self,
        backend: &mut B,
        triangles: &mut Triangles,
        states: &mut TriangleStates,
        atlas: &mut AtlasTextures,
        mode: TexturingMode,
        frame: &RgbImage,
        camera: &CameraModel,
        world_from_camera: Affine3A,
    ) -> Result<(), BackendError>
    where
        B: RenderBackend + ?Sized,
    {
        let id_count = triangles.number_of_ids();
        let viewport = camera.size() / DOWNSAMPLE_FACTOR;

        let pass_camera = PassCamera::new(
            camera.projection(NEAR_DISTANCE, FAR_DISTANCE),
            world_from_camera,
        );

        atlas.ensure(backend, id_count)?;

        // Stages 1+2: rasterize triangle ids at reduced resolution; the
        // state buffer has not seen this frame's queues yet, so triangles
        // retired by the latest snapshots still count as active here
        let active_ids = self
            .active_ids
            .run(backend, pass_camera, viewport, id_count)?;

        let any_ids =
            self.any_ids.run(backend, pass_camera, viewport, id_count)?;

        // Stage 3: filter the depth estimate
        let depth = self.depth.run(
            backend,
            any_ids,
            viewport,
            DEPTH_FILTER_RADIUS,
        )?;

        // Stage 4: classify visibility
        let visible = self.visibility.run(
            backend,
            active_ids,
            depth,
            NEAR_DISTANCE,
            FAR_DISTANCE,
            id_count,
        )?;

        log::trace!("{} of {} triangles visible", visible.len(), id_count);

        // Stage 5: synchronize the state buffer - new ids, then retired
        // ids, then the visible set; retirement wins over visibility, and a
        // visible triangle only upgrades from the active state
        let new_ids = triangles.new_ids().to_vec();
        let retired: Vec<TriangleId> = triangles.retired_ids().collect();
        let retired_set: FxHashSet<TriangleId> =
            retired.iter().copied().collect();

        let mut changes: Vec<(TriangleId, TriangleState)> = Vec::new();

        for id in &new_ids {
            changes.push((*id, TriangleState::Active));
        }

        for id in &retired {
            changes.push((*id, TriangleState::Retired));
        }

        for id in &visible {
            if states.get(*id) == TriangleState::Active
                && !retired_set.contains(id)
            {
                changes.push((*id, TriangleState::Textured));
            }
        }

        states.apply(backend, &changes, id_count)?;
        triangles.drain_queues();

        // Stage 6: texturing, policy dependent
        let eager_camera = mode.eager_camera(camera);

        if let Some(eager_camera) = eager_camera {
            let eager_camera = PassCamera::new(
                eager_camera.projection(NEAR_DISTANCE, FAR_DISTANCE),
                world_from_camera,
            );

            self.texturing.run(
                backend,
                atlas,
                &new_ids,
                frame,
                eager_camera,
            )?;
        }

        let eligible: Vec<TriangleId> = visible
            .iter()
            .copied()
            .filter(|id| states.get(*id).is_textured())
            .collect();

        self.texturing
            .run(backend, atlas, &eligible, frame, pass_camera)?;

        // Stage 7: delete every retired triangle that is not on screen; the
        // eagerly textured newcomers are acknowledged in the same sync
        let visible_set: FxHashSet<TriangleId> =
            visible.into_iter().collect();

        let deletable: Vec<TriangleId> = states
            .ids_in(TriangleState::Retired)
            .filter(|id| !visible_set.contains(id))
            .collect();

        let mut changes: Vec<(TriangleId, TriangleState)> = Vec::new();

        if eager_camera.is_some() {
            for id in &new_ids {
                changes.push((*id, TriangleState::Textured));
            }
        }

        for id in &deletable {
            changes.push((*id, TriangleState::Unknown));
        }

        states.apply(backend, &changes, id_count)?;

        if !deletable.is_empty() {
            log::debug!("Deleting {} retired triangles", deletable.len());
        }

        for id in deletable {
            triangles.release(id);
        }

        Ok(())
    }
}
