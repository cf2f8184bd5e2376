//! Load-time copies of every mesh's materials.

use std::collections::HashMap;

use corelib::{
    material::MaterialSlot,
    scene::{Model, NodeId},
};

/// Owned clones of the materials each mesh had right after load. Never
/// mutated after capture; callers clone out of it.
#[derive(Clone, Debug, Default)]
pub struct MaterialSnapshot {
    slots: HashMap<NodeId, MaterialSlot>,
}

impl MaterialSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the snapshot with the current materials of `model`.
    pub fn capture(&mut self, model: &Model) {
        self.slots.clear();
        self.slots.extend(
            model
                .meshes()
                .iter()
                .map(|mesh| (mesh.id, mesh.material.clone())),
        );
        log::debug!("Captured original materials of {} meshes", self.slots.len());
    }

    pub fn get(&self, id: NodeId) -> Option<&MaterialSlot> {
        self.slots.get(&id)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
