use indexmap::IndexMap;

use crate::core::accessor::{self, decode_indices, decode_positions, decode_tex_coords};
use crate::core::axis;
use crate::core::diagnostics::{Diagnostic, Diagnostics};
use crate::core::document::{AsoboRange, Document, Mesh, MODE_TRIANGLES};
use crate::core::mesh::{AssembledMesh, Corner, MaterialSlot};

pub const POSITION: &str = "POSITION";
pub const TEXCOORD_0: &str = "TEXCOORD_0";
pub const TEXCOORD_1: &str = "TEXCOORD_1";

#[remain::sorted]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Err {
    #[error("Accessor error: {0}")]
    Accessor(#[from] accessor::Err),
    #[error("Triangle {triangle} of the range starting at index {start} reads past the {len} shared indices")]
    IndexOutOfRange { start: usize, triangle: usize, len: usize },
    #[error("Primitive 0 has no {0} attribute")]
    MissingAttribute(&'static str),
    #[error("Primitive 0 has no index accessor")]
    MissingIndices,
    #[error("Mesh has no primitives")]
    NoPrimitives,
    #[error("Mesh {0} does not exist")]
    NoSuchMesh(usize),
    #[error("Vertex {vertex} is out of range, the mesh has {len} entries")]
    VertexOutOfRange { vertex: usize, len: usize },
}

/// Shared pool decoded once from primitive 0.
struct SharedPool {
    indices: Vec<u32>,
    vertices: Vec<[f32; 3]>,
    uv0: Vec<[f32; 2]>,
    uv1: Option<Vec<[f32; 2]>>,
}

impl SharedPool {
    fn decode(doc: &Document, blob: &[u8], mesh: &Mesh) -> Result<Self, Err> {
        let first = mesh.primitives.first().ok_or(Err::NoPrimitives)?;
        let indices = first.indices.ok_or(Err::MissingIndices)?;
        let position = first.attribute(POSITION).ok_or(Err::MissingAttribute(POSITION))?;
        let uv0 = first.attribute(TEXCOORD_0).ok_or(Err::MissingAttribute(TEXCOORD_0))?;

        let vertices = decode_positions(doc, blob, position)?
            .into_iter()
            .map(axis::position_to_z_up)
            .collect();
        let uv1 = match first.attribute(TEXCOORD_1) {
            Some(index) => Some(decode_tex_coords(doc, blob, index)?),
            None => None,
        };

        Ok(Self {
            indices: decode_indices(doc, blob, indices)?,
            vertices,
            uv0: decode_tex_coords(doc, blob, uv0)?,
            uv1,
        })
    }

    /// Shared index at `position`, plus `base_vertex`, validated against every vertex stream.
    fn vertex(&self, position: usize, base_vertex: usize) -> Result<usize, Err> {
        let raw = self.indices[position] as usize;
        let vertex = raw.checked_add(base_vertex).ok_or(Err::VertexOutOfRange {
            vertex: raw,
            len: self.vertices.len(),
        })?;
        let len = self
            .vertices
            .len()
            .min(self.uv0.len())
            .min(self.uv1.as_ref().map_or(usize::MAX, Vec::len));
        if vertex >= len {
            return Err(Err::VertexOutOfRange { vertex, len });
        }
        Ok(vertex)
    }

    fn corner(&self, vertex: usize, material: Option<usize>) -> Corner {
        Corner {
            vertex: vertex as u32,
            material,
            uv0: axis::flip_uv(self.uv0[vertex]),
            uv1: self.uv1.as_ref().map(|uv| axis::flip_uv(uv[vertex])),
        }
    }

    /// Emits the triangles of one sub-primitive, winding reversed.
    fn emit(&self, range: AsoboRange, material: Option<usize>, out: &mut Vec<Corner>) -> Result<(), Err> {
        let len = self.indices.len();
        for triangle in 0..range.primitive_count {
            let out_of_range = Err::IndexOutOfRange { start: range.start_index, triangle, len };
            let first = triangle
                .checked_mul(3)
                .and_then(|o| o.checked_add(range.start_index))
                .ok_or_else(|| out_of_range.clone())?;
            if first.checked_add(2).map_or(true, |last| last >= len) {
                return Err(out_of_range);
            }
            for position in [first + 2, first + 1, first] {
                let vertex = self.vertex(position, range.base_vertex)?;
                out.push(self.corner(vertex, material));
            }
        }
        Ok(())
    }
}

/// Builds the material table of `mesh`: one slot per distinct material name, in
/// order of first use. Returns the table and the slot of every primitive.
pub fn material_table(doc: &Document, mesh: &Mesh) -> (Vec<MaterialSlot>, Vec<Option<usize>>) {
    let mut by_name: IndexMap<String, usize> = IndexMap::new();
    let slots: Vec<Option<usize>> = mesh
        .primitives
        .iter()
        .map(|primitive| {
            let index = primitive.material?;
            let name = doc.material_name(index)?;
            let entry = by_name.entry(name);
            let slot = entry.index();
            entry.or_insert(index);
            Some(slot)
        })
        .collect();

    let table = by_name
        .into_iter()
        .map(|(name, document_index)| MaterialSlot { name, document_index })
        .collect();
    (table, slots)
}

/// Assembles mesh `mesh_index` from its Asobo sub-primitives.
///
/// Primitives without a usable vendor block, or with a topology other than
/// triangle lists, are skipped and reported in `diagnostics`. Any other failure
/// abandons the whole mesh and reports nothing about its primitives.
pub fn assemble(
    doc: &Document,
    blob: &[u8],
    mesh_index: usize,
    diagnostics: &mut Diagnostics,
) -> Result<AssembledMesh, Err> {
    let mesh = doc.meshes.get(mesh_index).ok_or(Err::NoSuchMesh(mesh_index))?;
    let name = doc.mesh_name(mesh_index);
    let (material_table, slots) = material_table(doc, mesh);
    let pool = SharedPool::decode(doc, blob, mesh)?;

    // Skipped primitives are only reported once the mesh as a whole succeeds.
    let mut skipped = Vec::new();
    let mut corners = Vec::new();
    for (primitive_index, (primitive, material)) in mesh.primitives.iter().zip(slots).enumerate() {
        if let Some(mode) = primitive.mode.filter(|&m| m != MODE_TRIANGLES) {
            skipped.push(Diagnostic::UnsupportedTopology {
                mesh: name.clone(),
                primitive: primitive_index,
                mode,
            });
            continue;
        }
        let Some(range) = primitive.asobo_range() else {
            skipped.push(Diagnostic::MissingVendorData {
                mesh: name.clone(),
                primitive: primitive_index,
            });
            continue;
        };
        pool.emit(range, material, &mut corners)?;
    }
    for diagnostic in skipped {
        diagnostics.push(diagnostic);
    }

    log::debug!(
        "Assembled mesh \"{}\": {} vertices, {} triangles, {} materials",
        name,
        pool.vertices.len(),
        corners.len() / 3,
        material_table.len()
    );
    Ok(AssembledMesh { name, vertices: pool.vertices, corners, material_table })
}

/// Assembles every mesh of the document in document order.
///
/// A mesh that fails is replaced by an empty placeholder that keeps its name and
/// material table, and a [`Diagnostic::MeshAssemblyFailed`] is recorded.
pub fn assemble_all(doc: &Document, blob: &[u8], diagnostics: &mut Diagnostics) -> Vec<AssembledMesh> {
    (0..doc.meshes.len())
        .map(|mesh_index| match assemble(doc, blob, mesh_index, diagnostics) {
            Ok(mesh) => mesh,
            Err(err) => {
                let name = doc.mesh_name(mesh_index);
                diagnostics.push(Diagnostic::MeshAssemblyFailed {
                    mesh: name.clone(),
                    reason: err.to_string(),
                });
                let (table, _) = material_table(doc, &doc.meshes[mesh_index]);
                AssembledMesh::empty(name, table)
            }
        })
        .collect()
}
