//! Mesh centering, uniform rescaling, and attribute decoration.

use std::path::Path;

use nalgebra::{Point3, Vector3};
use tracing::{debug, info, warn};

use pdf3d_core::config::mesh::MeshConfig;

use crate::attributes::{orient_faces, vertex_normals};
use crate::error::MeshError;
use crate::mesh::Mesh;

/// A normalized mesh with its derived appearance attributes.
///
/// Attributes that could not be computed are `None`; the mesh is still usable.
#[derive(Debug, Clone, PartialEq)]
pub struct DecoratedMesh {
    /// Centered, rescaled geometry (consistently wound when `oriented`).
    pub mesh: Mesh,
    /// Per-vertex unit normals.
    pub normals: Option<Vec<Vector3<f64>>>,
    /// Uniform RGBA face color.
    pub face_color: Option<[u8; 4]>,
    /// Whether face winding was made consistent.
    pub oriented: bool,
}

/// Brings heterogeneous meshes to a common frame: centroid at the origin and
/// farthest vertex at the canonical radius.
#[derive(Debug, Clone)]
pub struct MeshNormalizer {
    canonical_radius: f64,
    face_color: [u8; 4],
}

impl MeshNormalizer {
    /// Create a normalizer from configuration.
    pub fn new(config: &MeshConfig) -> Self {
        Self {
            canonical_radius: config.canonical_radius,
            face_color: config.face_color,
        }
    }

    /// Target bounding-sphere radius.
    pub fn canonical_radius(&self) -> f64 {
        self.canonical_radius
    }

    /// Center at the vertex centroid, then scale to the canonical radius.
    ///
    /// A mesh whose vertices all coincide is centered but not scaled.
    pub fn normalize(&self, mesh: &Mesh) -> Result<Mesh, MeshError> {
        if mesh.vertices().iter().any(|p| !p.coords.iter().all(|c| c.is_finite())) {
            return Err(MeshError::NonFinite("vertex coordinate".to_string()));
        }

        let centroid = mesh.centroid();
        let centered: Vec<Point3<f64>> = mesh
            .vertices()
            .iter()
            .map(|p| Point3::from(p - centroid))
            .collect();
        let centered = mesh.with_vertices(centered);

        let max_distance = centered.max_radius();
        if max_distance <= 0.0 {
            debug!("All vertices coincide, skipping scale");
            return Ok(centered);
        }

        let scale = self.canonical_radius / max_distance;
        if !scale.is_finite() {
            return Err(MeshError::NonFinite(format!(
                "scale factor for max distance {max_distance}"
            )));
        }
        debug!(
            centroid = ?[centroid.x, centroid.y, centroid.z],
            max_distance,
            scale,
            "Normalizing mesh"
        );

        let scaled = centered
            .vertices()
            .iter()
            .map(|p| Point3::from(p.coords * scale))
            .collect();
        Ok(centered.with_vertices(scaled))
    }

    /// Orient faces, compute normals, and apply the uniform color.
    ///
    /// Each step is independent; a failing step is logged and its attribute
    /// left unset.
    pub fn decorate(&self, mesh: Mesh) -> DecoratedMesh {
        let (mesh, oriented) = match orient_faces(&mesh) {
            Ok(faces) => (mesh.with_faces(faces), true),
            Err(e) => {
                warn!(error = %e, "Face orientation skipped");
                (mesh, false)
            }
        };

        let normals = match vertex_normals(&mesh) {
            Ok(normals) => Some(normals),
            Err(e) => {
                warn!(error = %e, "Normal computation skipped");
                None
            }
        };

        let face_color = (mesh.face_count() > 0).then_some(self.face_color);

        DecoratedMesh {
            mesh,
            normals,
            face_color,
            oriented,
        }
    }

    /// Load an artifact, normalize it, and decorate the result.
    pub fn process(&self, artifact: &Path) -> Result<DecoratedMesh, MeshError> {
        let source = Mesh::load_stl(artifact)?;
        let normalized = self.normalize(&source)?;
        let decorated = self.decorate(normalized);
        info!(
            artifact = %artifact.display(),
            vertices = decorated.mesh.vertex_count(),
            faces = decorated.mesh.face_count(),
            oriented = decorated.oriented,
            normals = decorated.normals.is_some(),
            "Mesh normalized"
        );
        Ok(decorated)
    }
}
