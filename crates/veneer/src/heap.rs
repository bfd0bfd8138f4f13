//! Arena storage for identity-bearing objects.
//!
//! A slot's index is the object's identity. Released slots are tombstoned and
//! never reused, so a stale [`HeapId`] reports "use of released object"
//! instead of silently aliasing a newer object.

use std::collections::BTreeMap;

use crate::{
    exception::{ExcType, RunResult},
    types::{ClassId, ClassTable, HeapObject},
};

/// Unique identifier for objects stored inside the heap arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HeapId(usize);

impl HeapId {
    #[must_use]
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Returns the raw index value.
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Snapshot of heap occupancy.
///
/// The `objects_by_class` map uses `BTreeMap` for deterministic iteration order,
/// making snapshots suitable for display and comparison without sort overhead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeapStats {
    /// Total number of live objects on the heap.
    pub live_objects: usize,
    /// Number of slots whose object has been released.
    pub released_slots: usize,
    /// Total heap capacity (live + released).
    pub total_slots: usize,
    /// Live objects per real class name.
    pub objects_by_class: BTreeMap<String, usize>,
}

#[derive(Debug, Default)]
pub(crate) struct Heap {
    entries: Vec<Option<HeapObject>>,
}

impl Heap {
    pub fn allocate(&mut self, object: HeapObject) -> HeapId {
        let id = HeapId(self.entries.len());
        self.entries.push(Some(object));
        id
    }

    pub fn get(&self, id: HeapId) -> RunResult<&HeapObject> {
        self.entries
            .get(id.0)
            .and_then(Option::as_ref)
            .ok_or_else(ExcType::released_object)
    }

    pub fn get_mut(&mut self, id: HeapId) -> RunResult<&mut HeapObject> {
        self.entries
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or_else(ExcType::released_object)
    }

    /// Drops the object in `id`. Objects it referenced are untouched.
    pub fn release(&mut self, id: HeapId) -> RunResult<()> {
        match self.entries.get_mut(id.0) {
            Some(slot @ Some(_)) => {
                *slot = None;
                Ok(())
            }
            _ => Err(ExcType::released_object()),
        }
    }

    /// Iterates live objects in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = (HeapId, &HeapObject)> {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|object| (HeapId(index), object)))
    }

    pub fn stats(&self, classes: &ClassTable) -> HeapStats {
        let mut objects_by_class: BTreeMap<String, usize> = BTreeMap::new();
        let mut live_objects = 0;
        for (_, object) in self.iter() {
            live_objects += 1;
            *objects_by_class
                .entry(classes.get(object.class).name().to_owned())
                .or_insert(0) += 1;
        }
        HeapStats {
            live_objects,
            released_slots: self.entries.len() - live_objects,
            total_slots: self.entries.len(),
            objects_by_class,
        }
    }

    /// Ids of live objects whose real class is `class` or one of its subclasses.
    pub fn ids_of_kind(&self, classes: &ClassTable, class: ClassId) -> Vec<HeapId> {
        self.iter()
            .filter(|(_, object)| classes.is_subclass_of(object.class, class))
            .map(|(id, _)| id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn released_slots_are_not_reused() {
        let mut classes = ClassTable::default();
        let object_class = classes.define("Object", None).unwrap();
        let mut heap = Heap::default();

        let a = heap.allocate(HeapObject::instance(object_class));
        heap.release(a).unwrap();
        let b = heap.allocate(HeapObject::instance(object_class));

        assert_ne!(a, b);
        assert_eq!(heap.get(a).unwrap_err().exc_type(), ExcType::RuntimeError);
        assert!(heap.get(b).is_ok());
        assert!(heap.release(a).is_err());

        let stats = heap.stats(&classes);
        assert_eq!(stats.live_objects, 1);
        assert_eq!(stats.released_slots, 1);
        assert_eq!(stats.objects_by_class.get("Object"), Some(&1));
    }
}
