//! Runtime values.
//!
//! `Value` is cheap to clone: immediates are copied, strings and arrays are
//! reference counted, and objects are referenced by [`HeapId`].

use std::{
    hash::{BuildHasher, Hash, Hasher},
    rc::Rc,
};

use crate::{heap::HeapId, types::ClassId};

/// Seeds for hashing that must agree across every `Value` in a process.
const HASH_SEEDS: (u64, u64, u64, u64) = (0x5eed_0001, 0x5eed_0002, 0x5eed_0003, 0x5eed_0004);

/// A value the runtime can pass around, store and send messages to.
///
/// The derived `PartialEq` is structural and meant for host-side assertions;
/// runtime equality is whatever the receiver's `==` says (see
/// [`Runtime::equals`](crate::Runtime::equals)).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Rc<str>),
    Symbol(Rc<str>),
    Array(Rc<[Value]>),
    /// A class object.
    Class(ClassId),
    /// An identity-bearing object on the heap.
    Ref(HeapId),
}

impl Value {
    #[must_use]
    pub fn str(s: &str) -> Self {
        Self::Str(Rc::from(s))
    }

    #[must_use]
    pub fn symbol(s: &str) -> Self {
        Self::Symbol(Rc::from(s))
    }

    #[must_use]
    pub fn array(items: Vec<Self>) -> Self {
        Self::Array(Rc::from(items))
    }

    /// `nil` and `false` are falsy; everything else is truthy.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Self::Nil | Self::Bool(false))
    }

    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the name carried by a symbol or a string, the two forms accepted as operation names.
    #[must_use]
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Self::Str(s) | Self::Symbol(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_array(&self) -> Option<&[Self]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_class(&self) -> Option<ClassId> {
        match self {
            Self::Class(id) => Some(*id),
            _ => None,
        }
    }

    #[must_use]
    pub fn heap_id(&self) -> Option<HeapId> {
        match self {
            Self::Ref(id) => Some(*id),
            _ => None,
        }
    }

    /// Identity comparison, the meaning of `equal?`.
    ///
    /// Immediates are identical when equal; strings and arrays only when they
    /// share an allocation; objects and classes when their ids match.
    #[must_use]
    pub fn identical(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Nil, Self::Nil) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::Symbol(a), Self::Symbol(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => Rc::ptr_eq(a, b),
            (Self::Array(a), Self::Array(b)) => Rc::ptr_eq(a, b),
            (Self::Class(a), Self::Class(b)) => a == b,
            (Self::Ref(a), Self::Ref(b)) => a == b,
            _ => false,
        }
    }

    /// Identity token, the meaning of `object_id` and `__id__`.
    ///
    /// Integers map to odd numbers, objects and classes to distinct multiples
    /// of sixteen offset by kind, so tokens of different kinds never collide.
    #[must_use]
    pub fn object_id(&self) -> i64 {
        match self {
            Self::Bool(false) => 0,
            Self::Nil => 8,
            Self::Bool(true) => 20,
            Self::Int(i) => i.wrapping_mul(2).wrapping_add(1),
            Self::Float(f) => ((f.to_bits() >> 4) << 4) as i64 | 6,
            Self::Symbol(s) => ((stable_hash(&**s) >> 5) << 4) as i64 | 12,
            Self::Str(s) => (Rc::as_ptr(s).cast::<u8>() as usize as i64) | 2,
            Self::Array(a) => (Rc::as_ptr(a).cast::<u8>() as usize as i64) | 2,
            Self::Class(id) => 16 * (i64::from(id.index()) + 2) + 4,
            Self::Ref(id) => 16 * (id.index() as i64 + 2),
        }
    }

    /// Returns a copy that is equal but not identical, for values with allocation identity.
    #[must_use]
    pub(crate) fn shallow_copy(&self) -> Self {
        match self {
            Self::Str(s) => Self::Str(Rc::from(&**s)),
            Self::Array(items) => Self::Array(Rc::from(items.to_vec())),
            other => other.clone(),
        }
    }
}

/// Process-stable hash used for `hash` and symbol ids.
#[must_use]
pub(crate) fn stable_hash<T: Hash + ?Sized>(value: &T) -> u64 {
    let state = ahash::RandomState::with_seeds(HASH_SEEDS.0, HASH_SEEDS.1, HASH_SEEDS.2, HASH_SEEDS.3);
    let mut hasher = state.build_hasher();
    value.hash(&mut hasher);
    hasher.finish()
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::str(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Str(Rc::from(value))
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Self::array(value)
    }
}

impl From<ClassId> for Value {
    fn from(value: ClassId) -> Self {
        Self::Class(value)
    }
}

impl From<HeapId> for Value {
    fn from(value: HeapId) -> Self {
        Self::Ref(value)
    }
}
