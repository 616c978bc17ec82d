use bytemuck::{Pod, Zeroable};

/// Interleaved vertex consumed by the mesh pipeline's vertex stage.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub texcoord: [f32; 2],
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Submesh {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
}

/// Geometry handed over by an external model loader.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub submeshes: Vec<Submesh>,
}

impl MeshData {
    pub fn is_empty(&self) -> bool {
        self.submeshes.iter().all(|mesh| mesh.indices.is_empty())
    }

    /// Unit cube centered on the origin, one submesh per face.
    pub fn cube() -> Self {
        const FACES: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
            ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
            ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
            ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
            ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
        ];

        let submeshes = FACES
            .iter()
            .map(|&(normal, right, up)| {
                let corner = |sx: f32, sy: f32| -> [f32; 3] {
                    [
                        0.5 * (normal[0] + sx * right[0] + sy * up[0]),
                        0.5 * (normal[1] + sx * right[1] + sy * up[1]),
                        0.5 * (normal[2] + sx * right[2] + sy * up[2]),
                    ]
                };
                let vertices = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)]
                    .into_iter()
                    .map(|(sx, sy)| MeshVertex {
                        position: corner(sx, sy),
                        normal,
                        texcoord: [(sx + 1.0) * 0.5, (sy + 1.0) * 0.5],
                    })
                    .collect();
                Submesh {
                    vertices,
                    indices: vec![0, 1, 2, 0, 2, 3],
                }
            })
            .collect();

        Self { submeshes }
    }
}

/// Model-view and projection matrices for the mesh vertex stage, column-major.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct MeshTransforms {
    pub model_view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
}

impl Default for MeshTransforms {
    fn default() -> Self {
        let identity = glam::Mat4::IDENTITY.to_cols_array_2d();
        Self {
            model_view: identity,
            projection: identity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_faces_are_outward_and_unit_sized() {
        let cube = MeshData::cube();
        assert_eq!(cube.submeshes.len(), 6);
        for face in &cube.submeshes {
            assert_eq!(face.vertices.len(), 4);
            assert_eq!(face.indices.len(), 6);
            for vertex in &face.vertices {
                let along_normal: f32 = vertex
                    .position
                    .iter()
                    .zip(vertex.normal.iter())
                    .map(|(p, n)| p * n)
                    .sum();
                assert!((along_normal - 0.5).abs() < 1e-6);
                assert!(vertex.position.iter().all(|c| c.abs() <= 0.5 + 1e-6));
            }
        }
        assert!(!cube.is_empty());
    }
}
