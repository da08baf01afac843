//! # pdf3d-mesh
//!
//! Turns the exported STL artifact into the interactive 3D asset: the mesh is
//! recentered at its vertex centroid, scaled uniformly to a canonical radius,
//! decorated with consistent winding, vertex normals, and a face color, then
//! serialized as IDTF and encoded to U3D.

pub mod attributes;
pub mod encoder;
pub mod error;
pub mod idtf;
pub mod mesh;
pub mod normalizer;

pub use attributes::{orient_faces, vertex_normals};
pub use encoder::{AssetEncoder, IdtfConverter};
pub use error::{AttributeError, MeshError};
pub use idtf::IdtfWriter;
pub use mesh::Mesh;
pub use normalizer::{DecoratedMesh, MeshNormalizer};
