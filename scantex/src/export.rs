use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use glam::{Vec2, Vec3};

use crate::gpu::{
    AtlasLayout, BatchId, RenderBackend, TriangleId, TriangleState,
};
use crate::{AtlasTextures, Error, TriangleStates, Triangles};

/// Triangle soup assembled for export or rendering.
///
/// Vertices are not shared between faces; textured meshes carry one atlas
/// UV per vertex, and every mesh carries flat per-face normals.
#[derive(Clone, Debug, Default)]
pub struct Mesh {
    pub vertices: Vec<Vec3>,
    pub faces: Vec<[u32; 3]>,
    pub uvs: Vec<Vec2>,
    pub normals: Vec<Vec3>,
}

impl Mesh {
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    fn push_triangle(&mut self, vertices: [Vec3; 3], uvs: Option<[Vec2; 3]>) {
        let base = self.vertices.len() as u32;

        self.faces.push([base, base + 1, base + 2]);
        self.vertices.extend(vertices);

        if let Some(uvs) = uvs {
            self.uvs.extend(uvs);
        }

        let normal = (vertices[1] - vertices[0])
            .cross(vertices[2] - vertices[0])
            .normalize_or_zero();

        self.normals.extend([normal; 3]);
    }
}

/// Batches currently holding at least one textured triangle.
pub(crate) fn textured_batches(
    states: &TriangleStates,
    layout: AtlasLayout,
) -> Vec<BatchId> {
    let mut batches: Vec<BatchId> = states
        .ids_in(TriangleState::Textured)
        .map(|id| layout.batch_id(id))
        .collect();

    batches.sort_unstable();
    batches.dedup();

    batches
}

/// Assembles one batch's textured triangles with their atlas UVs.
pub(crate) fn assemble_batch(
    triangles: &Triangles,
    states: &TriangleStates,
    layout: AtlasLayout,
    batch: BatchId,
) -> Mesh {
    let first = batch.get() * layout.capacity();
    let end = (first + layout.capacity()).min(triangles.number_of_ids());

    let mut mesh = Mesh::default();

    for id in (first..end).map(TriangleId::new) {
        if states.get(id).is_textured() {
            mesh.push_triangle(
                triangles.key(id).vertices(),
                Some(layout.slot_uv(layout.slot(id))),
            );
        }
    }

    mesh
}

/// Assembles every live triangle that holds no texture, flat-shaded.
pub(crate) fn assemble_remainder(
    triangles: &Triangles,
    states: &TriangleStates,
) -> Mesh {
    let mut mesh = Mesh::default();

    for (id, key) in triangles.iter() {
        if !states.get(id).is_textured() {
            mesh.push_triangle(key.vertices(), None);
        }
    }

    mesh
}

/// File name of a batch texture: `<base>_texture_<3-digit-batch>.png`,
/// next to the scene file.
pub(crate) fn texture_file_name(path: &Path, batch: BatchId) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();

    path.with_file_name(format!("{}_texture_{:03}.png", stem, batch.get()))
}

/// Writes the X3D scene description plus one PNG per textured batch.
pub(crate) fn export_meshes<B>(
    triangles: &Triangles,
    states: &TriangleStates,
    atlas: &AtlasTextures,
    backend: &mut B,
    path: &Path,
    textured_only: bool,
) -> Result<(), Error>
where
    B: RenderBackend + ?Sized,
{
    let layout = atlas.layout();

    let mut stream = BufWriter::new(File::create(path)?);

    writeln!(stream, "#X3D V3.0 utf8")?;
    writeln!(stream)?;

    for batch in textured_batches(states, layout) {
        let mesh = assemble_batch(triangles, states, layout, batch);

        if mesh.is_empty() {
            continue;
        }

        let target =
            atlas.target(batch).expect("atlas batch target missing");

        let texture_file = texture_file_name(path, batch);

        backend.read_target(target)?.save(&texture_file)?;

        let texture_url = texture_file
            .file_name()
            .expect("texture file name is never empty")
            .to_string_lossy()
            .into_owned();

        write_shape(&mut stream, &mesh, Some(&texture_url), None)?;
    }

    if !textured_only {
        let mesh = assemble_remainder(triangles, states);

        if !mesh.is_empty() {
            write_shape(&mut stream, &mesh, None, Some([0.7, 0.7, 0.7]))?;
        }
    }

    Ok(())
}

/// One X3D shape holding an indexed face set.
fn write_shape<W>(
    stream: &mut W,
    mesh: &Mesh,
    texture_url: Option<&str>,
    color: Option<[f32; 3]>,
) -> Result<(), Error>
where
    W: Write,
{
    writeln!(stream, "Shape")?;
    writeln!(stream, "{{")?;
    writeln!(stream, "  appearance Appearance")?;
    writeln!(stream, "  {{")?;

    if let Some([r, g, b]) = color {
        writeln!(
            stream,
            "    material Material {{ diffuseColor {r} {g} {b} }}"
        )?;
    }

    if let Some(url) = texture_url {
        writeln!(stream, "    texture ImageTexture {{ url \"{url}\" }}")?;
    }

    writeln!(stream, "  }}")?;
    writeln!(stream, "  geometry IndexedFaceSet")?;
    writeln!(stream, "  {{")?;

    write!(stream, "    coordIndex [")?;

    for face in &mesh.faces {
        write!(stream, " {} {} {} -1", face[0], face[1], face[2])?;
    }

    writeln!(stream, " ]")?;

    write!(stream, "    coord Coordinate {{ point [")?;

    for vertex in &mesh.vertices {
        write!(stream, " {} {} {},", vertex.x, vertex.y, vertex.z)?;
    }

    writeln!(stream, " ] }}")?;

    if !mesh.uvs.is_empty() {
        write!(stream, "    texCoord TextureCoordinate {{ point [")?;

        for uv in &mesh.uvs {
            write!(stream, " {} {},", uv.x, uv.y)?;
        }

        writeln!(stream, " ] }}")?;
    }

    if !mesh.normals.is_empty() {
        write!(stream, "    normal Normal {{ vector [")?;

        for normal in &mesh.normals {
            write!(stream, " {} {} {},", normal.x, normal.y, normal.z)?;
        }

        writeln!(stream, " ] }}")?;
    }

    writeln!(stream, "  }}")?;
    writeln!(stream, "}}")?;
    writeln!(stream)?;

    Ok(())
}
