/// Lifecycle state of a triangle id.
///
/// The backend keeps one byte per id in a persistent state buffer so that
/// rasterizing passes can filter triangles; the generator keeps a dense
/// CPU-side mirror and synchronizes the two with an explicit pass. The
/// discriminants are the wire encoding.
#[repr(u8)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum TriangleState {
    /// Not (or no longer) a known triangle; the id may sit in the free-list.
    #[default]
    Unknown = 0,

    /// Present in the latest mesh snapshot, not textured yet.
    Active = 1,

    /// Confirmed unoccluded at least once and holding an atlas region.
    Textured = 2,

    /// Absent from the latest mesh snapshot, pending safe deletion.
    Retired = 3,
}

impl TriangleState {
    pub fn is_live(self) -> bool {
        !matches!(self, Self::Unknown)
    }

    pub fn is_textured(self) -> bool {
        matches!(self, Self::Textured)
    }

    pub fn is_retired(self) -> bool {
        matches!(self, Self::Retired)
    }
}
