//! Wavefront OBJ ingestion via `tobj`.

use std::path::Path;

use lumen_math::{Vec2, Vec3};

use crate::mesh::{MeshData, MeshError, MeshResult};

/// Load every model in an OBJ file into a single mesh.
///
/// Faces are triangulated and attributes re-indexed so one index addresses
/// position, normal and UV together. Missing normals are computed and missing
/// UVs default to zero. The result is validated before it is returned.
pub fn load_obj<P: AsRef<Path>>(path: P) -> MeshResult<MeshData> {
    let path = path.as_ref();
    let (models, _materials) = tobj::load_obj(
        path,
        &tobj::LoadOptions {
            single_index: true,
            triangulate: true,
            ..Default::default()
        },
    )?;

    if models.is_empty() {
        return Err(MeshError::NoModels);
    }

    let mut mesh = MeshData::default();
    let mut has_normals = true;
    let mut has_uvs = true;

    for model in &models {
        let source = &model.mesh;
        let base = mesh.positions.len() as u32;
        let vertex_count = source.positions.len() / 3;

        mesh.positions.extend(
            source
                .positions
                .chunks_exact(3)
                .map(|p| Vec3::new(p[0], p[1], p[2])),
        );

        has_normals &= source.normals.len() == vertex_count * 3;
        if has_normals {
            mesh.normals.extend(
                source
                    .normals
                    .chunks_exact(3)
                    .map(|n| Vec3::new(n[0], n[1], n[2]).normalize_or_zero()),
            );
        }

        has_uvs &= source.texcoords.len() == vertex_count * 2;
        if has_uvs {
            mesh.uvs
                .extend(source.texcoords.chunks_exact(2).map(|t| Vec2::new(t[0], t[1])));
        }

        mesh.indices.extend(source.indices.iter().map(|&i| i + base));
    }

    log::info!(
        "Loaded OBJ {}: {} models, {} vertices, {} triangles (normals: {}, uvs: {})",
        path.display(),
        models.len(),
        mesh.vertex_count(),
        mesh.triangle_count(),
        has_normals,
        has_uvs
    );

    if !has_normals {
        mesh.normals.clear();
    }
    if !has_uvs {
        mesh.uvs.clear();
    }
    mesh.ensure_attributes();
    mesh.validate()?;
    Ok(mesh)
}
