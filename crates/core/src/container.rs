use crate::{Edition, EffectEntity};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("no entity slots")]
    NoSlots,
}

/// Ordered, capacity-bounded home of the active entities. Order is
/// positional and score-relevant; every index-taking operation bounds
/// checks and reports failure instead of panicking.
#[derive(Debug, Clone)]
pub struct EntityContainer {
    base_slots: usize,
    entities: Vec<EffectEntity>,
}

impl EntityContainer {
    pub fn new(base_slots: usize) -> Self {
        Self {
            base_slots,
            entities: Vec::new(),
        }
    }

    /// Effective capacity. Negative-edition entities each widen the
    /// container by one slot while present; derived, never stored, so
    /// removal retracts the bonus immediately.
    pub fn capacity(&self) -> usize {
        self.base_slots + self.negative_bonus()
    }

    pub fn negative_bonus(&self) -> usize {
        self.entities
            .iter()
            .filter(|entity| entity.edition == Some(Edition::Negative))
            .count()
    }

    pub fn free_slots(&self) -> usize {
        self.capacity().saturating_sub(self.entities.len())
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn entities(&self) -> &[EffectEntity] {
        &self.entities
    }

    pub fn get(&self, index: usize) -> Option<&EffectEntity> {
        self.entities.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut EffectEntity> {
        self.entities.get_mut(index)
    }

    pub fn add(&mut self, entity: EffectEntity) -> Result<(), ContainerError> {
        let mut capacity = self.capacity();
        if entity.edition == Some(Edition::Negative) {
            // The incoming entity brings its own extra slot.
            capacity = capacity.saturating_add(1);
        }
        if self.entities.len() >= capacity {
            return Err(ContainerError::NoSlots);
        }
        self.entities.push(entity);
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> Option<EffectEntity> {
        if index >= self.entities.len() {
            return None;
        }
        Some(self.entities.remove(index))
    }

    pub fn move_entity(&mut self, from: usize, to: usize) -> bool {
        if from >= self.entities.len() || to >= self.entities.len() {
            return false;
        }
        let entity = self.entities.remove(from);
        self.entities.insert(to, entity);
        true
    }

    pub fn swap(&mut self, a: usize, b: usize) -> bool {
        if a >= self.entities.len() || b >= self.entities.len() {
            return false;
        }
        self.entities.swap(a, b);
        true
    }

    pub fn left_of(&self, index: usize) -> Option<&EffectEntity> {
        index.checked_sub(1).and_then(|left| self.entities.get(left))
    }

    pub fn right_of(&self, index: usize) -> Option<&EffectEntity> {
        self.entities.get(index.checked_add(1)?)
    }

    pub fn leftmost(&self) -> Option<&EffectEntity> {
        self.entities.first()
    }

    pub fn rightmost(&self) -> Option<&EffectEntity> {
        self.entities.last()
    }
}
