use std::path::{Path, PathBuf};

use crate::geometry::RawGeometry;

/// Handle to a mesh stored in [`SceneAssets`].
///
/// A newtype so texture indices can't be passed where meshes are expected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MeshId(pub(crate) usize);

impl MeshId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Handle to a texture stored in [`SceneAssets`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureId(pub(crate) usize);

impl TextureId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// CPU-side storage for everything the scene draws.
///
/// Entries are append-only, so a renderer can upload new entries by index
/// and keep its GPU copies in step.
#[derive(Default)]
pub struct SceneAssets {
    meshes: Vec<RawGeometry>,
    textures: Vec<PathBuf>,
}

impl SceneAssets {
    pub fn add_mesh(&mut self, geometry: RawGeometry) -> MeshId {
        self.meshes.push(geometry);
        MeshId(self.meshes.len() - 1)
    }

    /// Registers an image file. It is decoded when first drawn.
    pub fn add_texture(&mut self, path: impl Into<PathBuf>) -> TextureId {
        self.textures.push(path.into());
        TextureId(self.textures.len() - 1)
    }

    pub fn mesh(&self, id: MeshId) -> Option<&RawGeometry> {
        self.meshes.get(id.0)
    }

    pub fn texture_path(&self, id: TextureId) -> Option<&Path> {
        self.textures.get(id.0).map(PathBuf::as_path)
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }
}
