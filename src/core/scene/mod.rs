use schemars::JsonSchema;
use serde::Serialize;

use crate::core::axis;
use crate::core::document::{Document, Node};

type PlacementIdx = usize;
type NodeIdx = usize;
type MeshIdx = usize;

#[remain::sorted]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Err {
    #[error("Node {node} is its own ancestor")]
    CycleDetected { node: NodeIdx },
    #[error("Node {0} does not exist")]
    NodeOutOfRange(NodeIdx),
}

// Row-major, column vectors: translation lives in data[0..3][3].
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct Matrix4d {
    pub data: [[f64; 4]; 4],
}

impl Matrix4d {
    pub fn identity() -> Self {
        Self {
            data: [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    pub fn transform_point(&self, p: Vector3d) -> Vector3d {
        let d = &self.data;
        Vector3d::new(
            d[0][0] * p.x + d[0][1] * p.y + d[0][2] * p.z + d[0][3],
            d[1][0] * p.x + d[1][1] * p.y + d[1][2] * p.z + d[1][3],
            d[2][0] * p.x + d[2][1] * p.y + d[2][2] * p.z + d[2][3],
        )
    }
}

impl Default for Matrix4d {
    fn default() -> Self {
        Self::identity()
    }
}

impl std::ops::Mul for &Matrix4d {
    type Output = Matrix4d;

    fn mul(self, other: Self) -> Matrix4d {
        let mut result = Matrix4d::identity();
        for i in 0..4 {
            for j in 0..4 {
                result.data[i][j] = self.data[i][0] * other.data[0][j]
                    + self.data[i][1] * other.data[1][j]
                    + self.data[i][2] * other.data[2][j]
                    + self.data[i][3] * other.data[3][j];
            }
        }
        result
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, JsonSchema)]
pub struct Vector3d {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3d {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    pub fn one() -> Self {
        Self::new(1.0, 1.0, 1.0)
    }

    pub fn from_f32(v: [f32; 3]) -> Self {
        Self::new(v[0] as f64, v[1] as f64, v[2] as f64)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, JsonSchema)]
pub struct Quaterniond {
    pub w: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Quaterniond {
    pub fn new(w: f64, x: f64, y: f64, z: f64) -> Self {
        Self { w, x, y, z }
    }

    pub fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 0.0)
    }

    pub fn to_matrix4(&self) -> Matrix4d {
        let w = self.w;
        let x = self.x;
        let y = self.y;
        let z = self.z;

        let xx = x * x;
        let yy = y * y;
        let zz = z * z;
        let xy = x * y;
        let xz = x * z;
        let xw = x * w;
        let yz = y * z;
        let yw = y * w;
        let zw = z * w;

        Matrix4d {
            data: [
                [1.0 - 2.0 * (yy + zz), 2.0 * (xy - zw), 2.0 * (xz + yw), 0.0],
                [2.0 * (xy + zw), 1.0 - 2.0 * (xx + zz), 2.0 * (yz - xw), 0.0],
                [2.0 * (xz - yw), 2.0 * (yz + xw), 1.0 - 2.0 * (xx + yy), 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }
}

impl Default for Quaterniond {
    fn default() -> Self {
        Self::identity()
    }
}

/// Translation, rotation and scale of one node, already in the Z-up frame.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct LocalTransform {
    pub translation: Vector3d,
    pub rotation: Quaterniond,
    pub scale: Vector3d,
}

impl Default for LocalTransform {
    fn default() -> Self {
        Self {
            translation: Vector3d::zero(),
            rotation: Quaterniond::identity(),
            scale: Vector3d::one(),
        }
    }
}

impl LocalTransform {
    /// Converts the glTF TRS of `node` to the Z-up frame.
    pub fn from_node(node: &Node) -> Self {
        Self {
            translation: axis::translation_to_z_up(node.translation),
            rotation: axis::rotation_to_z_up(node.rotation),
            scale: Vector3d::from_f32(axis::scale_to_z_up(node.scale)),
        }
    }

    /// `T * R * S`
    pub fn to_matrix(&self) -> Matrix4d {
        let mut m = self.rotation.to_matrix4();
        for row in 0..3 {
            m.data[row][0] *= self.scale.x;
            m.data[row][1] *= self.scale.y;
            m.data[row][2] *= self.scale.z;
        }
        m.data[0][3] = self.translation.x;
        m.data[1][3] = self.translation.y;
        m.data[2][3] = self.translation.z;
        m
    }

    pub fn transform_point(&self, p: Vector3d) -> Vector3d {
        self.to_matrix().transform_point(p)
    }
}

/// One instantiated node.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct Placement {
    /// Index of the node in the document.
    pub node: NodeIdx,
    pub name: String,
    /// Index of the parent placement; parents always precede their children.
    pub parent: Option<PlacementIdx>,
    /// `None` for nodes without a mesh and for nodes referencing a mesh that
    /// does not exist; both are kept as empty placeholders.
    pub mesh: Option<MeshIdx>,
    pub transform: LocalTransform,
}

enum Step {
    Enter { node: NodeIdx, parent: Option<PlacementIdx> },
    Exit(NodeIdx),
}

/// Instantiates the node tree of the first scene, depth first.
///
/// Nodes that are not reachable from `scenes[0]` are left out. A node reachable
/// through several parents is instantiated once per path; a node that is its
/// own ancestor fails with [`Err::CycleDetected`].
pub fn resolve(doc: &Document) -> Result<Vec<Placement>, Err> {
    let roots = match doc.scenes.first() {
        Some(scene) => &scene.nodes,
        None => return Ok(Vec::new()),
    };

    let mut placements = Vec::new();
    let mut on_path = vec![false; doc.nodes.len()];
    let mut stack: Vec<Step> = roots
        .iter()
        .rev()
        .map(|&node| Step::Enter { node, parent: None })
        .collect();

    while let Some(step) = stack.pop() {
        let (node_idx, parent) = match step {
            Step::Exit(node) => {
                on_path[node] = false;
                continue;
            }
            Step::Enter { node, parent } => (node, parent),
        };

        let node = doc.nodes.get(node_idx).ok_or(Err::NodeOutOfRange(node_idx))?;
        if on_path[node_idx] {
            return Err(Err::CycleDetected { node: node_idx });
        }
        on_path[node_idx] = true;

        let placement_idx = placements.len();
        placements.push(Placement {
            node: node_idx,
            name: doc.node_name(node_idx),
            parent,
            mesh: node.mesh.filter(|&m| m < doc.meshes.len()),
            transform: LocalTransform::from_node(node),
        });

        stack.push(Step::Exit(node_idx));
        for &child in node.children.iter().rev() {
            stack.push(Step::Enter { node: child, parent: Some(placement_idx) });
        }
    }

    log::debug!("Resolved {} placements from {} nodes", placements.len(), doc.nodes.len());
    Ok(placements)
}

/// World matrix of every placement (`parent world * local`).
pub fn world_matrices(placements: &[Placement]) -> Vec<Matrix4d> {
    let mut out: Vec<Matrix4d> = Vec::with_capacity(placements.len());
    for placement in placements {
        let local = placement.transform.to_matrix();
        let world = match placement.parent.and_then(|p| out.get(p)) {
            Some(parent) => parent * &local,
            None => local,
        };
        out.push(world);
    }
    out
}
