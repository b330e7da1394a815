/// Reusable storage for player bullets.
///
/// Active bullets occupy the prefix `slots[..active]`; everything after it
/// is parked and gets reinitialised by the next `create`.  Removal is a
/// swap-remove, so order within the active prefix is not meaningful.
/// Indices are only valid until the next `create`/`deactivate` call.

use crate::entities::GameObject;

#[derive(Clone, Debug, Default)]
pub struct BulletPool {
    slots: Vec<GameObject>,
    active: usize,
    next_id: u64,
    width: f32,
    height: f32,
}

impl BulletPool {
    pub fn new(width: f32, height: f32) -> Self {
        BulletPool {
            slots: Vec::new(),
            active: 0,
            next_id: 0,
            width,
            height,
        }
    }

    /// Activate a bullet at `(x, y)`, reusing a parked slot when one exists.
    /// Never fails; the pool grows on demand.
    pub fn create(&mut self, x: f32, y: f32) -> &GameObject {
        let id = self.next_id;
        self.next_id += 1;

        let index = self.active;
        if index < self.slots.len() {
            let slot = &mut self.slots[index];
            slot.id = id;
            slot.x = x;
            slot.y = y;
            slot.width = self.width;
            slot.height = self.height;
            slot.active = true;
        } else {
            self.slots
                .push(GameObject::new(id, x, y, self.width, self.height));
        }
        self.active += 1;
        &self.slots[index]
    }

    pub fn active_bullets(&self) -> &[GameObject] {
        &self.slots[..self.active]
    }

    pub fn active_bullets_mut(&mut self) -> &mut [GameObject] {
        &mut self.slots[..self.active]
    }

    /// Park the bullet at `index` by swapping it with the last active slot.
    /// Out-of-range indices are ignored.
    pub fn deactivate(&mut self, index: usize) {
        if index >= self.active {
            return;
        }
        let last = self.active - 1;
        self.slots[index].active = false;
        self.slots.swap(index, last);
        self.active = last;
    }

    /// Park every bullet.  Backing storage is kept for reuse.
    pub fn reset(&mut self) {
        for slot in &mut self.slots {
            slot.active = false;
        }
        self.active = 0;
    }

    pub fn active_count(&self) -> usize {
        self.active
    }

    /// Number of slots ever allocated, active or parked.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }
}
