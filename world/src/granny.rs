//! Special granny actors.

use horde_core::{GrannyId, GrannySnapshot, Vec3};

use crate::registry::Member;

#[derive(Clone, Debug)]
pub(crate) struct Granny {
    id: GrannyId,
    position: Vec3,
    alive: bool,
    frozen: bool,
}

impl Granny {
    pub(crate) fn spawn(id: GrannyId, position: Vec3, frozen: bool) -> Self {
        Self {
            id,
            position,
            alive: true,
            frozen,
        }
    }

    pub(crate) fn set_frozen(&mut self, frozen: bool) {
        self.frozen = frozen;
    }

    pub(crate) fn snapshot(&self) -> GrannySnapshot {
        GrannySnapshot {
            id: self.id,
            position: self.position,
            alive: self.alive,
            frozen: self.frozen,
        }
    }
}

impl Member for Granny {
    type Id = GrannyId;

    fn id(&self) -> GrannyId {
        self.id
    }

    fn position(&self) -> Vec3 {
        self.position
    }
}
