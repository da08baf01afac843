//! Derived visual attributes: consistent winding and vertex normals.

use std::collections::{HashMap, VecDeque};

use nalgebra::{Point3, Vector3};

use crate::error::AttributeError;
use crate::mesh::Mesh;

/// Faces incident to each undirected edge.
fn edge_faces(faces: &[[usize; 3]]) -> Result<HashMap<(usize, usize), Vec<usize>>, AttributeError> {
    let mut edges: HashMap<(usize, usize), Vec<usize>> = HashMap::new();
    for (f, face) in faces.iter().enumerate() {
        for (a, b) in directed_edges(face) {
            if a == b {
                continue;
            }
            let incident = edges.entry((a.min(b), a.max(b))).or_default();
            incident.push(f);
            if incident.len() > 2 {
                return Err(AttributeError::NonManifoldEdge(a.min(b), a.max(b)));
            }
        }
    }
    Ok(edges)
}

fn directed_edges(face: &[usize; 3]) -> [(usize, usize); 3] {
    [(face[0], face[1]), (face[1], face[2]), (face[2], face[0])]
}

fn flipped(face: [usize; 3]) -> [usize; 3] {
    [face[0], face[2], face[1]]
}

fn has_directed_edge(face: &[usize; 3], a: usize, b: usize) -> bool {
    directed_edges(face).contains(&(a, b))
}

/// Six times the signed volume enclosed by a set of faces.
fn signed_volume(vertices: &[Point3<f64>], faces: &[[usize; 3]]) -> f64 {
    faces
        .iter()
        .map(|&[a, b, c]| {
            vertices[a]
                .coords
                .dot(&vertices[b].coords.cross(&vertices[c].coords))
        })
        .sum()
}

/// Make winding consistent across every connected component.
///
/// Winding is propagated breadth-first from the first face of each component:
/// two faces sharing an edge must traverse it in opposite directions. Closed
/// components whose enclosed volume comes out negative are then flipped so
/// their normals point outward.
pub fn orient_faces(mesh: &Mesh) -> Result<Vec<[usize; 3]>, AttributeError> {
    let faces = mesh.faces();
    let edges = edge_faces(faces)?;

    let mut oriented: Vec<Option<[usize; 3]>> = vec![None; faces.len()];
    let mut queue = VecDeque::new();

    for seed in 0..faces.len() {
        if oriented[seed].is_some() {
            continue;
        }
        oriented[seed] = Some(faces[seed]);
        queue.push_back(seed);
        let mut component = vec![seed];
        let mut closed = true;

        while let Some(f) = queue.pop_front() {
            let Some(current) = oriented[f] else {
                continue;
            };
            for (a, b) in directed_edges(&current) {
                if a == b {
                    continue;
                }
                let incident = &edges[&(a.min(b), a.max(b))];
                if incident.len() < 2 {
                    closed = false;
                    continue;
                }
                for &g in incident.iter().filter(|&&g| g != f) {
                    match oriented[g] {
                        Some(existing) if has_directed_edge(&existing, a, b) => {
                            return Err(AttributeError::NonOrientable(g));
                        }
                        Some(_) => {}
                        None => {
                            let candidate = if has_directed_edge(&faces[g], a, b) {
                                flipped(faces[g])
                            } else {
                                faces[g]
                            };
                            oriented[g] = Some(candidate);
                            component.push(g);
                            queue.push_back(g);
                        }
                    }
                }
            }
        }

        if closed {
            let members: Vec<[usize; 3]> = component.iter().filter_map(|&f| oriented[f]).collect();
            if signed_volume(mesh.vertices(), &members) < 0.0 {
                for &f in &component {
                    oriented[f] = oriented[f].map(flipped);
                }
            }
        }
    }

    Ok(oriented.into_iter().flatten().collect())
}

/// Area-weighted unit normal per vertex.
///
/// Vertices touched only by degenerate faces get a zero normal. Fails when
/// every face is degenerate.
pub fn vertex_normals(mesh: &Mesh) -> Result<Vec<Vector3<f64>>, AttributeError> {
    let vertices = mesh.vertices();
    let mut accumulated = vec![Vector3::zeros(); vertices.len()];
    let mut contributing = 0usize;

    for &[a, b, c] in mesh.faces() {
        // Cross product length is twice the face area.
        let weighted = (vertices[b] - vertices[a]).cross(&(vertices[c] - vertices[a]));
        if weighted.norm_squared() <= f64::EPSILON * f64::EPSILON {
            continue;
        }
        contributing += 1;
        for i in [a, b, c] {
            accumulated[i] += weighted;
        }
    }

    if contributing == 0 {
        return Err(AttributeError::Degenerate(mesh.face_count()));
    }

    Ok(accumulated
        .into_iter()
        .map(|n| n.try_normalize(f64::EPSILON).unwrap_or_else(Vector3::zeros))
        .collect())
}
