pub mod assembler;

use schemars::JsonSchema;
use serde::Serialize;

/// One triangle corner. Three consecutive corners form a triangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, JsonSchema)]
pub struct Corner {
    /// Index into [`AssembledMesh::vertices`].
    pub vertex: u32,
    /// Index into [`AssembledMesh::material_table`], `None` for no material.
    pub material: Option<usize>,
    pub uv0: [f32; 2],
    pub uv1: Option<[f32; 2]>,
}

/// Entry of a mesh's material table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct MaterialSlot {
    pub name: String,
    /// Index of the first material in the document carrying this name.
    pub document_index: usize,
}

/// Polygon mesh built from all sub-primitives of one glTF mesh, in the Z-up frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, JsonSchema)]
pub struct AssembledMesh {
    pub name: String,
    pub vertices: Vec<[f32; 3]>,
    pub corners: Vec<Corner>,
    pub material_table: Vec<MaterialSlot>,
}

impl AssembledMesh {
    /// Placeholder standing in for a mesh that could not be assembled.
    pub fn empty(name: String, material_table: Vec<MaterialSlot>) -> Self {
        Self { name, vertices: Vec::new(), corners: Vec::new(), material_table }
    }

    pub fn is_empty(&self) -> bool {
        self.corners.is_empty()
    }

    pub fn triangle_count(&self) -> usize {
        self.corners.len() / 3
    }

    pub fn triangles(&self) -> impl Iterator<Item = &[Corner]> {
        self.corners.chunks_exact(3)
    }

    /// Material slot of the `i`th triangle.
    pub fn triangle_material(&self, i: usize) -> Option<&MaterialSlot> {
        let corner = self.corners.get(i * 3)?;
        self.material_table.get(corner.material?)
    }
}
