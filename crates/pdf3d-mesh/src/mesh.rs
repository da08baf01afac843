//! Indexed triangle mesh.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use nalgebra::{Point3, Vector3};
use tracing::debug;

use crate::error::MeshError;

/// An indexed triangle mesh: ordered vertices and vertex-index triples.
///
/// Operations that change geometry return a new mesh; a loaded mesh is never
/// modified in place.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    vertices: Vec<Point3<f64>>,
    faces: Vec<[usize; 3]>,
}

impl Mesh {
    /// Build a mesh, checking every face index against the vertex list.
    pub fn new(vertices: Vec<Point3<f64>>, faces: Vec<[usize; 3]>) -> Result<Self, MeshError> {
        let vertex_count = vertices.len();
        for (face, indices) in faces.iter().enumerate() {
            if let Some(&index) = indices.iter().find(|&&i| i >= vertex_count) {
                return Err(MeshError::InvalidIndex {
                    face,
                    index,
                    vertex_count,
                });
            }
        }
        Ok(Self { vertices, faces })
    }

    /// Load an STL artifact (binary or ASCII).
    pub fn load_stl(path: &Path) -> Result<Self, MeshError> {
        let load_err = |source| MeshError::Load {
            path: path.to_path_buf(),
            source,
        };

        let file = File::open(path).map_err(load_err)?;
        let mut reader = BufReader::new(file);
        let stl = stl_io::read_stl(&mut reader).map_err(load_err)?;

        if stl.faces.is_empty() {
            return Err(MeshError::Empty);
        }

        let vertices = stl
            .vertices
            .iter()
            .map(|v| Point3::new(f64::from(v[0]), f64::from(v[1]), f64::from(v[2])))
            .collect();
        let faces = stl.faces.iter().map(|f| f.vertices).collect();

        let mesh = Self::new(vertices, faces)?;
        debug!(
            path = %path.display(),
            vertices = mesh.vertex_count(),
            faces = mesh.face_count(),
            "Loaded STL mesh"
        );
        Ok(mesh)
    }

    /// Write the mesh as binary STL with per-face normals.
    pub fn write_stl(&self, path: &Path) -> Result<(), MeshError> {
        let triangles: Vec<stl_io::Triangle> = self
            .faces
            .iter()
            .map(|&[a, b, c]| {
                let (pa, pb, pc) = (self.vertices[a], self.vertices[b], self.vertices[c]);
                let n = (pb - pa)
                    .cross(&(pc - pa))
                    .try_normalize(f64::EPSILON)
                    .unwrap_or_else(Vector3::zeros);
                stl_io::Triangle {
                    normal: stl_io::Normal::new([n.x as f32, n.y as f32, n.z as f32]),
                    vertices: [pa, pb, pc]
                        .map(|p| stl_io::Vertex::new([p.x as f32, p.y as f32, p.z as f32])),
                }
            })
            .collect();

        let mut writer = BufWriter::new(File::create(path)?);
        stl_io::write_stl(&mut writer, triangles.iter())?;
        Ok(())
    }

    /// Vertex positions.
    pub fn vertices(&self) -> &[Point3<f64>] {
        &self.vertices
    }

    /// Faces as vertex-index triples.
    pub fn faces(&self) -> &[[usize; 3]] {
        &self.faces
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of faces.
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Mean of all vertex positions; the origin for a mesh without vertices.
    pub fn centroid(&self) -> Point3<f64> {
        if self.vertices.is_empty() {
            return Point3::origin();
        }
        let sum = self
            .vertices
            .iter()
            .fold(Vector3::zeros(), |acc, p| acc + p.coords);
        Point3::from(sum / self.vertices.len() as f64)
    }

    /// Largest distance of any vertex from the origin.
    pub fn max_radius(&self) -> f64 {
        self.vertices
            .iter()
            .map(|p| p.coords.norm())
            .fold(0.0, f64::max)
    }

    /// A new mesh with the same faces and the given vertices.
    pub(crate) fn with_vertices(&self, vertices: Vec<Point3<f64>>) -> Self {
        Self {
            vertices,
            faces: self.faces.clone(),
        }
    }

    /// A new mesh with the same vertices and the given faces.
    pub(crate) fn with_faces(&self, faces: Vec<[usize; 3]>) -> Self {
        Self {
            vertices: self.vertices.clone(),
            faces,
        }
    }
}
