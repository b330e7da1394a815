/// Flat `[x0, y0, x1, y1, ...]` mirror of enemy then bomber positions.
///
/// The entities themselves stay authoritative; this cache only has to stay
/// index-aligned with `enemies` followed by `bombers`.

use tracing::warn;

use crate::entities::{Bomber, Enemy};

#[derive(Clone, Debug, Default)]
pub struct PositionStore {
    coords: Vec<f32>,
    len: usize,
}

impl PositionStore {
    pub fn with_capacity(capacity: usize) -> Self {
        PositionStore {
            coords: vec![0.0; capacity * 2],
            len: 0,
        }
    }

    /// Append an entity, returning its slot, or `None` when full.
    pub fn add_entity(&mut self, x: f32, y: f32) -> Option<usize> {
        if self.len >= self.capacity() {
            return None;
        }
        let index = self.len;
        self.coords[index * 2] = x;
        self.coords[index * 2 + 1] = y;
        self.len += 1;
        Some(index)
    }

    pub fn update_position(&mut self, index: usize, x: f32, y: f32) {
        if index < self.len {
            self.coords[index * 2] = x;
            self.coords[index * 2 + 1] = y;
        }
    }

    pub fn position(&self, index: usize) -> Option<(f32, f32)> {
        (index < self.len).then(|| (self.coords[index * 2], self.coords[index * 2 + 1]))
    }

    pub fn clear(&mut self) {
        self.coords.iter_mut().for_each(|c| *c = 0.0);
        self.len = 0;
    }

    /// Rebuild from scratch after entities were removed.
    pub fn sync(&mut self, enemies: &[Enemy], bombers: &[Bomber]) {
        self.clear();
        let bodies = enemies
            .iter()
            .map(|e| &e.body)
            .chain(bombers.iter().map(|b| &b.body));
        for body in bodies {
            if self.add_entity(body.x, body.y).is_none() {
                warn!(capacity = self.capacity(), "position store full, entity not cached");
                break;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.coords.len() / 2
    }
}
