use glam::{UVec2, Vec3};
use image::RgbaImage;
use scantex::gpu::{
    BackendError, BatchId, IdScope, Pass, PassCamera, PassOutput,
    RenderBackend, TargetDesc, TargetId, TriangleId, TriangleState,
};

/// Scriptable in-memory rendering backend.
///
/// Records every pass it is asked to run and answers visibility passes with
/// a preset id set, so tests can drive the pipeline without a GPU.
#[derive(Default)]
pub struct FakeBackend {
    pub targets: Vec<TargetDesc>,
    pub geometry: Vec<Vec3>,
    pub states: Vec<TriangleState>,
    pub passes: Vec<PassRecord>,

    /// Ids the next visibility pass reports as unoccluded.
    pub visible: Vec<TriangleId>,

    /// Index of the one `run_pass` call that fails.
    pub fail_at: Option<usize>,

    passes_run: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub enum PassRecord {
    RasterizeIds {
        scope: IdScope,
        viewport: UVec2,
        id_count: u32,
    },
    FilterDepth {
        radius: u32,
    },
    ClassifyVisibility {
        near: f32,
        far: f32,
        id_count: u32,
    },
    SyncStates {
        changes: Vec<(TriangleId, TriangleState)>,
    },
    TextureTriangles {
        batch: BatchId,
        triangles: Vec<TriangleId>,
        camera: PassCamera,
    },
    RenderMesh {
        viewport: UVec2,
        textured_only: bool,
    },
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, id: TriangleId) -> TriangleState {
        self.states
            .get(id.get() as usize)
            .copied()
            .unwrap_or_default()
    }

    /// Every id handed to a texturing pass so far.
    pub fn textured_ids(&self) -> Vec<TriangleId> {
        self.passes
            .iter()
            .filter_map(|pass| match pass {
                PassRecord::TextureTriangles { triangles, .. } => {
                    Some(triangles.iter().copied())
                }
                _ => None,
            })
            .flatten()
            .collect()
    }

    pub fn texture_passes(&self) -> Vec<&PassRecord> {
        self.passes
            .iter()
            .filter(|pass| {
                matches!(pass, PassRecord::TextureTriangles { .. })
            })
            .collect()
    }
}

impl RenderBackend for FakeBackend {
    fn create_target(
        &mut self,
        desc: &TargetDesc,
    ) -> Result<TargetId, BackendError> {
        self.targets.push(desc.clone());

        Ok(TargetId::new((self.targets.len() - 1) as u32))
    }

    fn set_geometry(&mut self, vertices: &[Vec3]) -> Result<(), BackendError> {
        self.geometry = vertices.to_vec();

        Ok(())
    }

    fn run_pass(&mut self, pass: Pass<'_>) -> Result<PassOutput, BackendError> {
        let index = self.passes_run;

        self.passes_run += 1;

        if self.fail_at == Some(index) {
            return Err(BackendError::new("injected failure"));
        }

        match pass {
            Pass::RasterizeIds {
                scope,
                viewport,
                id_count,
                ..
            } => {
                self.passes.push(PassRecord::RasterizeIds {
                    scope,
                    viewport,
                    id_count,
                });

                Ok(PassOutput::Done)
            }

            Pass::FilterDepth { radius, .. } => {
                self.passes.push(PassRecord::FilterDepth { radius });

                Ok(PassOutput::Done)
            }

            Pass::ClassifyVisibility {
                near,
                far,
                id_count,
                ..
            } => {
                self.passes.push(PassRecord::ClassifyVisibility {
                    near,
                    far,
                    id_count,
                });

                Ok(PassOutput::VisibleSet(self.visible.clone()))
            }

            Pass::SyncStates { changes, id_count } => {
                if self.states.len() < id_count as usize {
                    self.states
                        .resize(id_count as usize, TriangleState::Unknown);
                }

                for (id, state) in changes {
                    self.states[id.get() as usize] = *state;
                }

                self.passes.push(PassRecord::SyncStates {
                    changes: changes.to_vec(),
                });

                Ok(PassOutput::Done)
            }

            Pass::TextureTriangles {
                batch,
                triangles,
                camera,
                ..
            } => {
                self.passes.push(PassRecord::TextureTriangles {
                    batch,
                    triangles: triangles.to_vec(),
                    camera,
                });

                Ok(PassOutput::Done)
            }

            Pass::RenderMesh {
                viewport,
                textured_only,
                ..
            } => {
                self.passes.push(PassRecord::RenderMesh {
                    viewport,
                    textured_only,
                });

                Ok(PassOutput::Image(RgbaImage::new(
                    viewport.x, viewport.y,
                )))
            }
        }
    }

    fn read_target(
        &mut self,
        target: TargetId,
    ) -> Result<RgbaImage, BackendError> {
        let desc = &self.targets[target.get() as usize];

        Ok(RgbaImage::new(desc.size.x, desc.size.y))
    }
}
