use std::collections::BTreeMap;

use crate::error::EngineError;
use crate::message::ObjectId;
use crate::object::SceneObject;

/// Arena of every game object, addressed by stable id.
#[derive(Debug, Default, Clone)]
pub struct ObjectRegistry {
    objects: Vec<SceneObject>,
    by_id: BTreeMap<ObjectId, usize>,
    by_name: BTreeMap<String, ObjectId>,
}

impl ObjectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, object: SceneObject) -> Result<(), EngineError> {
        if self.by_id.contains_key(&object.id) {
            return Err(EngineError::DuplicateObject(object.id));
        }
        self.by_id.insert(object.id, self.objects.len());
        self.by_name.entry(object.name.clone()).or_insert(object.id);
        self.objects.push(object);
        Ok(())
    }

    pub fn find(&self, id: ObjectId) -> Option<&SceneObject> {
        self.by_id.get(&id).map(|&slot| &self.objects[slot])
    }

    pub fn find_mut(&mut self, id: ObjectId) -> Option<&mut SceneObject> {
        let slot = *self.by_id.get(&id)?;
        self.objects.get_mut(slot)
    }

    /// First object registered under `name`.
    pub fn find_by_name(&self, name: &str) -> Option<&SceneObject> {
        self.by_name.get(name).and_then(|id| self.find(*id))
    }

    /// Ids in registration order.
    pub fn ids(&self) -> Vec<ObjectId> {
        self.objects.iter().map(|object| object.id).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SceneObject> {
        self.objects.iter()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}
