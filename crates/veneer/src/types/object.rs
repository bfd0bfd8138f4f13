use indexmap::IndexMap;

use super::{BoundMethod, ClassId, MethodTable, TargetCell};
use crate::value::Value;

/// Kind-specific payload of a heap object.
#[derive(Debug, Clone)]
pub(crate) enum HeapData {
    /// Plain instance; all state lives in instance variables.
    Instance,
    Delegator(TargetCell),
    Method(BoundMethod),
}

/// An identity-bearing object.
///
/// Every object shares the same header: its real class, instance variables,
/// optional per-object methods, and a frozen flag.
#[derive(Debug, Clone)]
pub(crate) struct HeapObject {
    pub class: ClassId,
    /// Insertion-ordered so `inspect` and `instance_variables` are deterministic.
    pub ivars: IndexMap<String, Value>,
    pub singleton: Option<MethodTable>,
    pub frozen: bool,
    pub data: HeapData,
}

impl HeapObject {
    pub fn instance(class: ClassId) -> Self {
        Self::with_data(class, HeapData::Instance)
    }

    pub fn with_data(class: ClassId, data: HeapData) -> Self {
        Self {
            class,
            ivars: IndexMap::new(),
            singleton: None,
            frozen: false,
            data,
        }
    }

    pub fn target_cell(&self) -> Option<&TargetCell> {
        match &self.data {
            HeapData::Delegator(cell) => Some(cell),
            _ => None,
        }
    }

    pub fn target_cell_mut(&mut self) -> Option<&mut TargetCell> {
        match &mut self.data {
            HeapData::Delegator(cell) => Some(cell),
            _ => None,
        }
    }

    pub fn bound_method(&self) -> Option<&BoundMethod> {
        match &self.data {
            HeapData::Method(method) => Some(method),
            _ => None,
        }
    }
}
