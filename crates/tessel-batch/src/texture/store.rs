use std::collections::HashMap;

use super::{AtlasTexture, IdAllocator, ImageTexture, Texture, TextureId};

/// Which map a texture lives in.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TextureKind {
    NonAtlas,
    Atlas,
}

/// Owns every live texture, keyed by id.
///
/// Both maps draw ids from one allocator, so an id is in at most one of them.
#[derive(Default)]
pub struct TextureStore {
    ids: IdAllocator,
    non_atlas: HashMap<TextureId, ImageTexture>,
    atlases: HashMap<TextureId, AtlasTexture>,
}

impl TextureStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves the id for the next texture, or `None` once ids run out.
    pub fn allocate_id(&mut self) -> Option<TextureId> {
        let id = self.ids.allocate();
        if id.is_none() {
            log::error!("texture ids exhausted; no further textures can be created");
        }
        id
    }

    #[cfg(test)]
    pub(crate) fn with_first_id(first: i32) -> Self {
        Self { ids: IdAllocator::starting_at(first), ..Self::default() }
    }

    pub fn insert_non_atlas(&mut self, texture: ImageTexture) -> TextureId {
        let id = texture.id();
        debug_assert!(!self.atlases.contains_key(&id));
        self.non_atlas.insert(id, texture);
        id
    }

    pub fn insert_atlas(&mut self, atlas: AtlasTexture) -> TextureId {
        let id = atlas.id();
        debug_assert!(!self.non_atlas.contains_key(&id));
        self.atlases.insert(id, atlas);
        id
    }

    pub fn kind(&self, id: TextureId) -> Option<TextureKind> {
        if self.non_atlas.contains_key(&id) {
            Some(TextureKind::NonAtlas)
        } else if self.atlases.contains_key(&id) {
            Some(TextureKind::Atlas)
        } else {
            None
        }
    }

    pub fn contains_non_atlas(&self, id: TextureId) -> bool {
        self.non_atlas.contains_key(&id)
    }

    pub fn non_atlas(&self, id: TextureId) -> Option<&ImageTexture> {
        self.non_atlas.get(&id)
    }

    pub fn atlas(&self, id: TextureId) -> Option<&AtlasTexture> {
        self.atlases.get(&id)
    }

    pub fn atlas_mut(&mut self, id: TextureId) -> Option<&mut AtlasTexture> {
        self.atlases.get_mut(&id)
    }

    /// Removes a non-atlas texture, disposing it.
    pub fn remove_non_atlas(&mut self, id: TextureId) -> bool {
        match self.non_atlas.remove(&id) {
            Some(mut texture) => {
                texture.dispose();
                true
            }
            None => false,
        }
    }

    /// Any live texture with this id.
    pub fn get_mut(&mut self, id: TextureId) -> Option<&mut dyn Texture> {
        if let Some(texture) = self.non_atlas.get_mut(&id) {
            return Some(texture);
        }
        self.atlases.get_mut(&id).map(|atlas| atlas as &mut dyn Texture)
    }

    pub fn len(&self) -> usize {
        self.non_atlas.len() + self.atlases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Disposes and drops every texture.
    pub fn dispose_all(&mut self) {
        for (_, mut texture) in self.non_atlas.drain() {
            texture.dispose();
        }
        for (_, mut atlas) in self.atlases.drain() {
            atlas.dispose();
        }
    }
}
