//! IDTF (Intermediate Data Text Format) serialization.
//!
//! IDTF is the text input of the U3D converter. The writer emits one model
//! node, one mesh resource, and one shader/material pair carrying the face
//! color.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::debug;

use crate::error::MeshError;
use crate::normalizer::DecoratedMesh;

const IDENTITY: [[f64; 4]; 4] = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];

/// Neutral gray used when no face color was assigned.
const FALLBACK_COLOR: [u8; 4] = [200, 200, 200, 255];

/// Serializes a [`DecoratedMesh`] as an IDTF scene.
#[derive(Debug, Clone)]
pub struct IdtfWriter {
    name: String,
}

impl IdtfWriter {
    /// Create a writer naming the model node and its resources.
    pub fn new(name: &str) -> Self {
        let name: String = name
            .chars()
            .map(|c| if c == '"' || c.is_control() { '_' } else { c })
            .collect();
        Self {
            name: if name.is_empty() { "model".to_string() } else { name },
        }
    }

    /// Write the scene to `path`, replacing any existing file.
    pub fn write(&self, mesh: &DecoratedMesh, path: &Path) -> Result<(), MeshError> {
        let mut out = BufWriter::new(File::create(path)?);
        self.write_to(mesh, &mut out)?;
        out.flush()?;
        debug!(path = %path.display(), "IDTF scene written");
        Ok(())
    }

    /// Write the scene to any sink.
    pub fn write_to<W: Write>(&self, mesh: &DecoratedMesh, out: &mut W) -> std::io::Result<()> {
        let name = &self.name;
        let color = mesh.face_color.unwrap_or(FALLBACK_COLOR);
        let rgba = color.map(|c| f64::from(c) / 255.0);

        writeln!(out, "FILE_FORMAT \"IDTF\"")?;
        writeln!(out, "FORMAT_VERSION 100")?;
        writeln!(out)?;

        writeln!(out, "NODE \"MODEL\" {{")?;
        writeln!(out, "\tNODE_NAME \"{name}\"")?;
        writeln!(out, "\tPARENT_LIST {{")?;
        writeln!(out, "\t\tPARENT_COUNT 1")?;
        writeln!(out, "\t\tPARENT 0 {{")?;
        writeln!(out, "\t\t\tPARENT_NAME \"<NULL>\"")?;
        writeln!(out, "\t\t\tPARENT_TM {{")?;
        for row in IDENTITY {
            writeln!(
                out,
                "\t\t\t\t{:.6} {:.6} {:.6} {:.6}",
                row[0], row[1], row[2], row[3]
            )?;
        }
        writeln!(out, "\t\t\t}}")?;
        writeln!(out, "\t\t}}")?;
        writeln!(out, "\t}}")?;
        writeln!(out, "\tRESOURCE_NAME \"{name}\"")?;
        writeln!(out, "}}")?;
        writeln!(out)?;

        self.write_mesh_resource(mesh, out)?;

        writeln!(out, "RESOURCE_LIST \"SHADER\" {{")?;
        writeln!(out, "\tRESOURCE_COUNT 1")?;
        writeln!(out, "\tRESOURCE 0 {{")?;
        writeln!(out, "\t\tRESOURCE_NAME \"{name}_shader\"")?;
        writeln!(out, "\t\tATTRIBUTE_USE_VERTEX_COLOR \"FALSE\"")?;
        writeln!(out, "\t\tSHADER_MATERIAL_NAME \"{name}_material\"")?;
        writeln!(out, "\t\tSHADER_ACTIVE_TEXTURE_COUNT 0")?;
        writeln!(out, "\t}}")?;
        writeln!(out, "}}")?;
        writeln!(out)?;

        writeln!(out, "RESOURCE_LIST \"MATERIAL\" {{")?;
        writeln!(out, "\tRESOURCE_COUNT 1")?;
        writeln!(out, "\tRESOURCE 0 {{")?;
        writeln!(out, "\t\tRESOURCE_NAME \"{name}_material\"")?;
        writeln!(out, "\t\tMATERIAL_AMBIENT {:.6} {:.6} {:.6}", rgba[0], rgba[1], rgba[2])?;
        writeln!(out, "\t\tMATERIAL_DIFFUSE {:.6} {:.6} {:.6}", rgba[0], rgba[1], rgba[2])?;
        writeln!(out, "\t\tMATERIAL_SPECULAR 0.200000 0.200000 0.200000")?;
        writeln!(out, "\t\tMATERIAL_EMISSIVE 0.000000 0.000000 0.000000")?;
        writeln!(out, "\t\tMATERIAL_REFLECTIVITY 0.100000")?;
        writeln!(out, "\t\tMATERIAL_OPACITY {:.6}", rgba[3])?;
        writeln!(out, "\t}}")?;
        writeln!(out, "}}")?;
        writeln!(out)?;

        writeln!(out, "MODIFIER \"SHADING\" {{")?;
        writeln!(out, "\tMODIFIER_NAME \"{name}\"")?;
        writeln!(out, "\tPARAMETERS {{")?;
        writeln!(out, "\t\tSHADER_LIST_COUNT 1")?;
        writeln!(out, "\t\tSHADER_LIST_LIST {{")?;
        writeln!(out, "\t\t\tSHADER_LIST 0 {{")?;
        writeln!(out, "\t\t\t\tSHADER_COUNT 1")?;
        writeln!(out, "\t\t\t\tSHADER_NAME_LIST {{")?;
        writeln!(out, "\t\t\t\t\tSHADER 0 NAME: \"{name}_shader\"")?;
        writeln!(out, "\t\t\t\t}}")?;
        writeln!(out, "\t\t\t}}")?;
        writeln!(out, "\t\t}}")?;
        writeln!(out, "\t}}")?;
        writeln!(out, "}}")?;
        Ok(())
    }

    fn write_mesh_resource<W: Write>(&self, decorated: &DecoratedMesh, out: &mut W) -> std::io::Result<()> {
        let mesh = &decorated.mesh;
        let normals = decorated.normals.as_deref().unwrap_or_default();

        writeln!(out, "RESOURCE_LIST \"MODEL\" {{")?;
        writeln!(out, "\tRESOURCE_COUNT 1")?;
        writeln!(out, "\tRESOURCE 0 {{")?;
        writeln!(out, "\t\tRESOURCE_NAME \"{}\"", self.name)?;
        writeln!(out, "\t\tMODEL_TYPE \"MESH\"")?;
        writeln!(out, "\t\tMESH {{")?;
        writeln!(out, "\t\t\tFACE_COUNT {}", mesh.face_count())?;
        writeln!(out, "\t\t\tMODEL_POSITION_COUNT {}", mesh.vertex_count())?;
        writeln!(out, "\t\t\tMODEL_NORMAL_COUNT {}", normals.len())?;
        writeln!(out, "\t\t\tMODEL_DIFFUSE_COLOR_COUNT 0")?;
        writeln!(out, "\t\t\tMODEL_SPECULAR_COLOR_COUNT 0")?;
        writeln!(out, "\t\t\tMODEL_TEXTURE_COORD_COUNT 0")?;
        writeln!(out, "\t\t\tMODEL_BONE_COUNT 0")?;
        writeln!(out, "\t\t\tMODEL_SHADING_COUNT 1")?;
        writeln!(out, "\t\t\tMODEL_SHADING_DESCRIPTION_LIST {{")?;
        writeln!(out, "\t\t\t\tSHADING_DESCRIPTION 0 {{")?;
        writeln!(out, "\t\t\t\t\tTEXTURE_LAYER_COUNT 0")?;
        writeln!(out, "\t\t\t\t\tSHADER_ID 0")?;
        writeln!(out, "\t\t\t\t}}")?;
        writeln!(out, "\t\t\t}}")?;

        writeln!(out, "\t\t\tMESH_FACE_POSITION_LIST {{")?;
        for [a, b, c] in mesh.faces() {
            writeln!(out, "\t\t\t\t{a} {b} {c}")?;
        }
        writeln!(out, "\t\t\t}}")?;

        // Normals are per vertex, so face normal indices equal position indices.
        if !normals.is_empty() {
            writeln!(out, "\t\t\tMESH_FACE_NORMAL_LIST {{")?;
            for [a, b, c] in mesh.faces() {
                writeln!(out, "\t\t\t\t{a} {b} {c}")?;
            }
            writeln!(out, "\t\t\t}}")?;
        }

        writeln!(out, "\t\t\tMESH_FACE_SHADING_LIST {{")?;
        for _ in mesh.faces() {
            writeln!(out, "\t\t\t\t0")?;
        }
        writeln!(out, "\t\t\t}}")?;

        writeln!(out, "\t\t\tMODEL_POSITION_LIST {{")?;
        for p in mesh.vertices() {
            writeln!(out, "\t\t\t\t{:.6} {:.6} {:.6}", p.x, p.y, p.z)?;
        }
        writeln!(out, "\t\t\t}}")?;

        if !normals.is_empty() {
            writeln!(out, "\t\t\tMODEL_NORMAL_LIST {{")?;
            for n in normals {
                writeln!(out, "\t\t\t\t{:.6} {:.6} {:.6}", n.x, n.y, n.z)?;
            }
            writeln!(out, "\t\t\t}}")?;
        }

        writeln!(out, "\t\t}}")?;
        writeln!(out, "\t}}")?;
        writeln!(out, "}}")?;
        writeln!(out)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::tests::tetrahedron;
    use crate::normalizer::MeshNormalizer;
    use pdf3d_core::config::mesh::MeshConfig;

    fn render(mesh: &DecoratedMesh, name: &str) -> String {
        let mut buf = Vec::new();
        IdtfWriter::new(name).write_to(mesh, &mut buf).expect("write");
        String::from_utf8(buf).expect("utf8")
    }

    #[test]
    fn test_counts_and_lists() {
        let decorated = MeshNormalizer::new(&MeshConfig::default()).decorate(tetrahedron());
        let text = render(&decorated, "part_a");

        assert!(text.starts_with("FILE_FORMAT \"IDTF\"\nFORMAT_VERSION 100\n"));
        assert!(text.contains("NODE_NAME \"part_a\""));
        assert!(text.contains("FACE_COUNT 4\n"));
        assert!(text.contains("MODEL_POSITION_COUNT 4\n"));
        assert!(text.contains("MODEL_NORMAL_COUNT 4\n"));
        assert!(text.contains("MESH_FACE_NORMAL_LIST"));
        assert!(text.contains("\t\t\t\t0 2 1\n"));
    }

    #[test]
    fn test_material_uses_face_color() {
        let decorated = MeshNormalizer::new(&MeshConfig::default()).decorate(tetrahedron());
        let text = render(&decorated, "m");
        assert!(text.contains("MATERIAL_DIFFUSE 0.784314 0.784314 0.784314"));
        assert!(text.contains("MATERIAL_OPACITY 1.000000"));
    }

    #[test]
    fn test_missing_normals_omit_lists() {
        let mut decorated = MeshNormalizer::new(&MeshConfig::default()).decorate(tetrahedron());
        decorated.normals = None;
        let text = render(&decorated, "m");
        assert!(text.contains("MODEL_NORMAL_COUNT 0\n"));
        assert!(!text.contains("MESH_FACE_NORMAL_LIST"));
        assert!(!text.contains("MODEL_NORMAL_LIST"));
    }

    #[test]
    fn test_name_sanitized() {
        let writer = IdtfWriter::new("bad\"name");
        assert_eq!(writer.name, "bad_name");
        assert_eq!(IdtfWriter::new("").name, "model");
    }

    #[test]
    fn test_write_file() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("part_a.idtf");
        let decorated = MeshNormalizer::new(&MeshConfig::default()).decorate(tetrahedron());
        IdtfWriter::new("part_a").write(&decorated, &path).expect("write");
        let text = std::fs::read_to_string(&path).expect("read");
        assert!(text.ends_with("}\n"));
    }
}
