//! Class objects and the class table.
//!
//! Classes use single inheritance; the ancestor chain of a class is the class
//! itself followed by its superclasses up to `BasicObject`. Method lookup
//! walks that chain and stops at the first table that mentions the name,
//! whether it defines the method or marks it undefined.

use std::sync::atomic::{AtomicU32, Ordering};

use ahash::AHashMap;

use super::method_table::{FoundMethod, Lookup, MethodEntry, MethodOwner, MethodTable};
use crate::exception::{ExcType, Exception, RunResult};

/// Tags handed to class tables as they are created.
static NEXT_TABLE_TAG: AtomicU32 = AtomicU32::new(0);

/// Identifier of a class in a runtime's class table.
///
/// Ids carry the tag of the table that issued them; any other runtime
/// rejects them with `TypeError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId {
    table: u32,
    index: u32,
}

impl ClassId {
    #[must_use]
    pub(crate) fn new(table: u32, index: u32) -> Self {
        Self { table, index }
    }

    #[inline]
    #[must_use]
    pub fn index(self) -> u32 {
        self.index
    }
}

/// What `new`/`allocate` builds for a class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ClassKind {
    /// Plain heap instances with instance variables.
    Plain,
    /// Delegators: heap objects holding a target cell. Only classes descending
    /// from the prepared `Delegator` base have this kind.
    Delegator,
    /// Builtin value classes (`Integer`, `String`, `Class`, `Method`, ...) with no allocator.
    NoAllocator,
}

#[derive(Debug)]
pub(crate) struct ClassObject {
    name: String,
    superclass: Option<ClassId>,
    pub(crate) methods: MethodTable,
    kind: ClassKind,
    /// Set by the case-match extension; see [`crate::case_match`].
    case_match_ext: bool,
}

impl ClassObject {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn superclass(&self) -> Option<ClassId> {
        self.superclass
    }

    pub fn kind(&self) -> ClassKind {
        self.kind
    }

    pub fn case_match_ext(&self) -> bool {
        self.case_match_ext
    }
}

#[derive(Debug)]
pub(crate) struct ClassTable {
    tag: u32,
    classes: Vec<ClassObject>,
    by_name: AHashMap<String, ClassId>,
}

impl Default for ClassTable {
    fn default() -> Self {
        Self {
            tag: NEXT_TABLE_TAG.fetch_add(1, Ordering::Relaxed),
            classes: Vec::new(),
            by_name: AHashMap::default(),
        }
    }
}

impl ClassTable {
    /// Defines a class, or returns the existing one when reopening with the same superclass.
    ///
    /// New classes inherit their superclass's kind.
    pub fn define(&mut self, name: &str, superclass: Option<ClassId>) -> RunResult<ClassId> {
        if let Some(parent) = superclass {
            self.check(parent)?;
        }
        if let Some(&existing) = self.by_name.get(name) {
            if self.get(existing).superclass == superclass {
                return Ok(existing);
            }
            return Err(ExcType::type_error(format!("superclass mismatch for class {name}")));
        }
        if name.is_empty() {
            return Err(ExcType::type_error("class name must not be empty"));
        }
        let kind = superclass.map_or(ClassKind::Plain, |parent| self.get(parent).kind);
        let index = u32::try_from(self.classes.len()).map_err(|_| Exception::runtime_error("too many classes"))?;
        let id = ClassId::new(self.tag, index);
        self.classes.push(ClassObject {
            name: name.to_owned(),
            superclass,
            methods: MethodTable::default(),
            kind,
            case_match_ext: false,
        });
        self.by_name.insert(name.to_owned(), id);
        Ok(id)
    }

    /// Confirms that `id` was issued by this table.
    ///
    /// Host-supplied ids go through here before any of the indexing accessors.
    pub fn check(&self, id: ClassId) -> RunResult<ClassId> {
        if self.contains(id) {
            Ok(id)
        } else {
            Err(ExcType::type_error(format!("unknown class (id {})", id.index)))
        }
    }

    pub fn contains(&self, id: ClassId) -> bool {
        id.table == self.tag && (id.index as usize) < self.classes.len()
    }

    pub fn get(&self, id: ClassId) -> &ClassObject {
        &self.classes[id.index as usize]
    }

    pub fn get_mut(&mut self, id: ClassId) -> &mut ClassObject {
        &mut self.classes[id.index as usize]
    }

    pub fn named(&self, name: &str) -> Option<ClassId> {
        self.by_name.get(name).copied()
    }

    pub fn set_kind(&mut self, id: ClassId, kind: ClassKind) {
        self.get_mut(id).kind = kind;
    }

    pub fn set_case_match_ext(&mut self, id: ClassId) {
        self.get_mut(id).case_match_ext = true;
    }

    /// The class itself followed by its superclasses.
    pub fn ancestors(&self, id: ClassId) -> Vec<ClassId> {
        let mut out = vec![id];
        let mut current = self.get(id).superclass;
        while let Some(parent) = current {
            out.push(parent);
            current = self.get(parent).superclass;
        }
        out
    }

    /// True when `other` is `id` or one of its superclasses.
    pub fn is_subclass_of(&self, id: ClassId, other: ClassId) -> bool {
        let mut current = Some(id);
        while let Some(class) = current {
            if class == other {
                return true;
            }
            current = self.get(class).superclass;
        }
        false
    }

    /// Looks `name` up starting at `start` and walking superclasses.
    pub fn find_from(&self, start: Option<ClassId>, name: &str) -> Lookup {
        let mut current = start;
        while let Some(class) = current {
            let object = self.get(class);
            match object.methods.get(name) {
                Some(MethodEntry::Defined { body, visibility }) => {
                    return Lookup::Found(FoundMethod {
                        owner: MethodOwner::Class(class),
                        body: body.clone(),
                        visibility: *visibility,
                    });
                }
                Some(MethodEntry::Undefined) => return Lookup::Undefined,
                None => current = object.superclass,
            }
        }
        Lookup::Missing
    }
}
