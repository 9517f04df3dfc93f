mod common;

use std::fs;

use glam::{vec3, Affine3A, Vec3};
use image::RgbImage;
use scantex::gpu::{
    AtlasLayout, BatchId, CameraModel, TriangleId, TriangleState,
};
use scantex::{SceneMesh, TextureGenerator, TexturingMode};

use self::common::{FakeBackend, PassRecord};

fn triangle(seed: u32) -> [Vec3; 3] {
    [
        vec3(seed as f32, 0.0, 0.0),
        vec3(seed as f32, 1.0, 0.0),
        vec3(seed as f32, 0.0, 1.0),
    ]
}

fn snapshot(seeds: &[u32]) -> Vec<SceneMesh> {
    let mut vertices = Vec::new();
    let mut indices = Vec::new();

    for seed in seeds {
        for vertex in triangle(*seed) {
            indices.push(vertices.len() as u32);
            vertices.push(vertex);
        }
    }

    vec![SceneMesh::new(0, Affine3A::IDENTITY, vertices, indices)]
}

fn camera() -> CameraModel {
    CameraModel::new(640, 480, 1.0)
}

fn frame() -> RgbImage {
    RgbImage::new(640, 480)
}

fn layout() -> AtlasLayout {
    AtlasLayout::new(256, 32)
}

fn generator(mode: TexturingMode) -> TextureGenerator {
    TextureGenerator::new(mode, layout())
}

#[test]
fn end_to_end_lifecycle() {
    let target = generator(TexturingMode::PersistUntilReplaced);
    let mut backend = FakeBackend::new();

    // Frame 0: a single-triangle mesh allocates one id
    target.update_mesh(&snapshot(&[1]), true);

    assert_eq!(target.number_of_ids(), 1);
    assert_eq!(target.len(), 1);

    // Frame 1: the identical mesh mutates nothing
    target.update_mesh(&snapshot(&[1]), true);

    assert_eq!(target.number_of_ids(), 1);
    assert_eq!(target.len(), 1);

    // Frame 2: an empty mesh retires the triangle
    target.update_mesh(&[], true);

    assert_eq!(target.len(), 1, "retirement must not delete yet");

    // One frame in which the triangle is depth-tested invisible deletes it
    target
        .process_frame(&frame(), &camera(), Affine3A::IDENTITY, &mut backend)
        .unwrap();

    assert_eq!(target.len(), 0);
    assert_eq!(backend.state(TriangleId::new(0)), TriangleState::Unknown);

    // The next newly ingested triangle reuses the freed id
    target.update_mesh(&snapshot(&[2]), true);

    assert_eq!(target.number_of_ids(), 1);
    assert_eq!(target.len(), 1);
}

#[test]
fn idempotent_ingestion_emits_no_second_transitions() {
    let target = generator(TexturingMode::PersistUntilReplaced);
    let mut backend = FakeBackend::new();

    target.update_mesh(&snapshot(&[1, 2]), true);

    target
        .process_frame(&frame(), &camera(), Affine3A::IDENTITY, &mut backend)
        .unwrap();

    target.update_mesh(&snapshot(&[1, 2]), true);

    backend.passes.clear();

    target
        .process_frame(&frame(), &camera(), Affine3A::IDENTITY, &mut backend)
        .unwrap();

    for pass in &backend.passes {
        if let PassRecord::SyncStates { changes } = pass {
            assert!(changes.is_empty(), "unexpected transitions: {changes:?}");
        }
    }
}

#[test]
fn visible_triangles_become_textured_and_persist() {
    let target = generator(TexturingMode::PersistUntilReplaced);
    let mut backend = FakeBackend::new();

    target.update_mesh(&snapshot(&[1]), true);
    backend.visible = vec![TriangleId::new(0)];

    // First frame introduces the id to the state buffer; it was not part of
    // the rasterized set yet, so it cannot be textured
    target
        .process_frame(&frame(), &camera(), Affine3A::IDENTITY, &mut backend)
        .unwrap();

    assert_eq!(backend.state(TriangleId::new(0)), TriangleState::Active);
    assert!(backend.textured_ids().is_empty());

    // The second frame sees it visible and textures it
    target
        .process_frame(&frame(), &camera(), Affine3A::IDENTITY, &mut backend)
        .unwrap();

    assert_eq!(backend.state(TriangleId::new(0)), TriangleState::Textured);
    assert_eq!(backend.textured_ids(), vec![TriangleId::new(0)]);

    // An invisible frame leaves the atlas region untouched
    backend.visible.clear();
    backend.passes.clear();

    target
        .process_frame(&frame(), &camera(), Affine3A::IDENTITY, &mut backend)
        .unwrap();

    assert!(backend.texture_passes().is_empty());
    assert_eq!(backend.state(TriangleId::new(0)), TriangleState::Textured);
}

#[test]
fn retired_triangles_survive_while_visible() {
    let target = generator(TexturingMode::PersistUntilReplaced);
    let mut backend = FakeBackend::new();

    target.update_mesh(&snapshot(&[1, 2]), true);
    backend.visible = vec![TriangleId::new(0), TriangleId::new(1)];

    for _ in 0..2 {
        target
            .process_frame(
                &frame(),
                &camera(),
                Affine3A::IDENTITY,
                &mut backend,
            )
            .unwrap();
    }

    assert_eq!(backend.state(TriangleId::new(1)), TriangleState::Textured);

    // The second triangle drops out of the mesh but stays on screen
    target.update_mesh(&snapshot(&[1]), true);
    backend.visible = vec![TriangleId::new(1)];

    target
        .process_frame(&frame(), &camera(), Affine3A::IDENTITY, &mut backend)
        .unwrap();

    assert_eq!(backend.state(TriangleId::new(1)), TriangleState::Retired);
    assert_eq!(target.len(), 2, "a visible triangle is never deleted");

    // Once off screen, it is deleted and its id freed
    backend.visible = vec![TriangleId::new(0)];

    target
        .process_frame(&frame(), &camera(), Affine3A::IDENTITY, &mut backend)
        .unwrap();

    assert_eq!(backend.state(TriangleId::new(1)), TriangleState::Unknown);
    assert_eq!(target.len(), 1);
}

#[test]
fn backend_failure_aborts_the_frame_and_stays_retryable() {
    let target = generator(TexturingMode::PersistUntilReplaced);
    let mut backend = FakeBackend::new();

    target.update_mesh(&snapshot(&[1]), true);

    // Passes 0-3 are the rasterizing stages; pass 4 is the state sync
    backend.fail_at = Some(4);

    target
        .process_frame(&frame(), &camera(), Affine3A::IDENTITY, &mut backend)
        .unwrap_err();

    assert_eq!(backend.state(TriangleId::new(0)), TriangleState::Unknown);
    assert_eq!(target.len(), 1);

    // The retry performs the deferred transition
    target
        .process_frame(&frame(), &camera(), Affine3A::IDENTITY, &mut backend)
        .unwrap();

    assert_eq!(backend.state(TriangleId::new(0)), TriangleState::Active);
}

#[test]
fn redraw_mode_textures_new_triangles_with_a_widened_camera() {
    let target = generator(TexturingMode::RedrawOnRetirement);
    let mut backend = FakeBackend::new();

    target.update_mesh(&snapshot(&[1]), true);

    target
        .process_frame(&frame(), &camera(), Affine3A::IDENTITY, &mut backend)
        .unwrap();

    let texture_passes = backend.texture_passes();

    assert_eq!(texture_passes.len(), 1);

    let PassRecord::TextureTriangles {
        triangles,
        camera: pass_camera,
        ..
    } = texture_passes[0]
    else {
        unreachable!();
    };

    assert_eq!(triangles, &vec![TriangleId::new(0)]);

    assert_eq!(
        pass_camera.projection,
        camera().widened().projection(0.01, 1000.0),
    );

    // Eagerly textured newcomers are acknowledged in the state buffer
    assert_eq!(backend.state(TriangleId::new(0)), TriangleState::Textured);
}

#[test]
fn redraw_mode_skips_alternate_uneventful_frames() {
    let target = generator(TexturingMode::RedrawOnRetirement);
    let mut backend = FakeBackend::new();

    target.update_mesh(&snapshot(&[1]), true);

    // Frame 0 introduces geometry and runs
    target
        .process_frame(&frame(), &camera(), Affine3A::IDENTITY, &mut backend)
        .unwrap();

    // Frame 1 is uneventful but runs on the odd index
    let passes = backend.passes.len();

    target
        .process_frame(&frame(), &camera(), Affine3A::IDENTITY, &mut backend)
        .unwrap();

    assert!(backend.passes.len() > passes);

    // Frame 2 is uneventful and gets dropped
    let passes = backend.passes.len();

    target
        .process_frame(&frame(), &camera(), Affine3A::IDENTITY, &mut backend)
        .unwrap();

    assert_eq!(backend.passes.len(), passes);
}

#[test]
fn render_returns_a_camera_sized_image() {
    let target = generator(TexturingMode::PersistUntilReplaced);
    let mut backend = FakeBackend::new();

    // An empty registry renders to a blank image without any pass
    let image = target
        .render(&camera(), Affine3A::IDENTITY, true, &mut backend)
        .unwrap();

    assert_eq!(image.dimensions(), (640, 480));
    assert!(backend.passes.is_empty());

    target.update_mesh(&snapshot(&[1]), true);

    let image = target
        .render(&camera(), Affine3A::IDENTITY, true, &mut backend)
        .unwrap();

    assert_eq!(image.dimensions(), (640, 480));

    assert!(matches!(
        backend.passes.last(),
        Some(PassRecord::RenderMesh {
            textured_only: true,
            ..
        })
    ));
}

#[test]
fn export_writes_scene_and_batch_textures() {
    let target = generator(TexturingMode::PersistUntilReplaced);
    let mut backend = FakeBackend::new();

    target.update_mesh(&snapshot(&[1, 2]), true);
    backend.visible = vec![TriangleId::new(0), TriangleId::new(1)];

    for _ in 0..2 {
        target
            .process_frame(
                &frame(),
                &camera(),
                Affine3A::IDENTITY,
                &mut backend,
            )
            .unwrap();
    }

    assert_eq!(target.batch_ids(), vec![BatchId::new(0)]);

    let dir = std::env::temp_dir()
        .join(format!("scantex_export_{}", std::process::id()));

    fs::create_dir_all(&dir).unwrap();

    let path = dir.join("model.x3d");

    target.export_meshes(&path, false, &mut backend).unwrap();

    let scene = fs::read_to_string(&path).unwrap();

    assert!(scene.starts_with("#X3D V3.0 utf8"));
    assert!(scene.contains("model_texture_000.png"));
    assert!(dir.join("model_texture_000.png").exists());

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn export_batch_assembles_textured_triangles() {
    let target = generator(TexturingMode::PersistUntilReplaced);
    let mut backend = FakeBackend::new();

    target.update_mesh(&snapshot(&[1, 2]), true);
    backend.visible = vec![TriangleId::new(0)];

    for _ in 0..2 {
        target
            .process_frame(
                &frame(),
                &camera(),
                Affine3A::IDENTITY,
                &mut backend,
            )
            .unwrap();
    }

    // One textured triangle in batch 0, with its atlas texture
    let (mesh, texture) = target
        .export_batch(Some(BatchId::new(0)), &mut backend)
        .unwrap()
        .unwrap();

    assert_eq!(mesh.faces.len(), 1);
    assert_eq!(mesh.vertices.len(), 3);
    assert_eq!(mesh.uvs.len(), 3);
    assert_eq!(texture.unwrap().dimensions(), (256, 256));

    // The untextured remainder holds the other triangle, uv-less
    let (remainder, texture) =
        target.export_batch(None, &mut backend).unwrap().unwrap();

    assert_eq!(remainder.faces.len(), 1);
    assert!(remainder.uvs.is_empty());
    assert!(texture.is_none());

    // Batches past the id space hold nothing
    assert!(target
        .export_batch(Some(BatchId::new(5)), &mut backend)
        .unwrap()
        .is_none());
}
