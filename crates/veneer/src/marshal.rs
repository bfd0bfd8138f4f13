//! Serialization of object graphs.
//!
//! A value graph is first detached into a [`MarshalValue`] tree, then encoded
//! with postcard. Strings, arrays and heap objects get a memo index in
//! pre-order as they are first visited; later visits become
//! [`MarshalValue::Link`]s, so shared references and cycles survive a round
//! trip. Objects responding to `marshal_dump` are stored as their class name
//! plus the dumped payload and rebuilt by sending `marshal_load` to a bare
//! instance; a delegator's payload is `[:__v1__, target]`.

use std::fmt;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::{
    args::ArgValues,
    builtins::kernel::respond_to,
    exception::{ExcType, Exception},
    heap::HeapId,
    runtime::Runtime,
    value::Value,
};

/// Version written in every stream header.
pub const MARSHAL_FORMAT_VERSION: u16 = 1;

/// A detached, serializable copy of a value graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MarshalValue {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Symbol(String),
    Array(Vec<MarshalValue>),
    /// A class reference, by name.
    Class(String),
    /// A plain instance and its instance variables.
    Instance {
        class: String,
        ivars: Vec<(String, MarshalValue)>,
    },
    /// An object rebuilt through `marshal_load(payload)`.
    UserMarshal { class: String, payload: Box<MarshalValue> },
    /// Back-reference to the object with this memo index.
    Link(u32),
}

/// A versioned stream: the unit [`Runtime::marshal_dump`] encodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarshalStream {
    pub version: u16,
    pub root: MarshalValue,
}

impl MarshalStream {
    #[must_use]
    pub fn new(root: MarshalValue) -> Self {
        Self {
            version: MARSHAL_FORMAT_VERSION,
            root,
        }
    }

    /// Encodes the stream with postcard.
    pub fn dump(&self) -> Result<Vec<u8>, MarshalError> {
        postcard::to_allocvec(self).map_err(MarshalError::Encode)
    }

    /// Decodes a stream and checks its version.
    pub fn load(bytes: &[u8]) -> Result<Self, MarshalError> {
        let stream: Self = postcard::from_bytes(bytes).map_err(MarshalError::Decode)?;
        if stream.version != MARSHAL_FORMAT_VERSION {
            return Err(MarshalError::UnsupportedVersion(stream.version));
        }
        Ok(stream)
    }
}

/// Error type for marshalling, separating codec failures from runtime ones.
#[derive(Debug)]
pub enum MarshalError {
    Encode(postcard::Error),
    Decode(postcard::Error),
    /// The stream names a class this runtime does not define.
    UnknownClass(String),
    /// A link points at a memo index that is out of range or still being built.
    BadLink(u32),
    UnsupportedVersion(u16),
    /// An exception raised while dumping or loading, including those from
    /// `marshal_dump`/`marshal_load` themselves.
    Runtime(Exception),
}

impl fmt::Display for MarshalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Encode(error) => write!(f, "marshal encode failed: {error}"),
            Self::Decode(error) => write!(f, "marshal decode failed: {error}"),
            Self::UnknownClass(name) => write!(f, "undefined class/module {name}"),
            Self::BadLink(index) => write!(f, "dangling marshal link {index}"),
            Self::UnsupportedVersion(version) => write!(f, "unsupported marshal format version {version}"),
            Self::Runtime(error) => write!(f, "{error}"),
        }
    }
}

impl std::error::Error for MarshalError {}

impl From<Exception> for MarshalError {
    fn from(error: Exception) -> Self {
        Self::Runtime(error)
    }
}

impl MarshalError {
    /// The runtime exception, when the failure was one.
    #[must_use]
    pub fn exception(&self) -> Option<&Exception> {
        match self {
            Self::Runtime(error) => Some(error),
            _ => None,
        }
    }
}

impl Runtime {
    /// Serializes the graph reachable from `value`.
    pub fn marshal_dump(&mut self, value: &Value) -> Result<Vec<u8>, MarshalError> {
        self.marshal_snapshot(value)?.dump()
    }

    /// Rebuilds a graph serialized by [`Runtime::marshal_dump`].
    pub fn marshal_load(&mut self, bytes: &[u8]) -> Result<Value, MarshalError> {
        let stream = MarshalStream::load(bytes)?;
        self.marshal_restore(&stream)
    }

    /// Detaches the graph reachable from `value` without encoding it.
    pub fn marshal_snapshot(&mut self, value: &Value) -> Result<MarshalStream, MarshalError> {
        let mut dumper = Dumper {
            rt: self,
            memo: AHashMap::new(),
            pinned: Vec::new(),
        };
        let root = dumper.dump(value)?;
        Ok(MarshalStream::new(root))
    }

    /// Rebuilds a graph from a detached stream.
    ///
    /// On failure every object allocated for the graph is released again.
    pub fn marshal_restore(&mut self, stream: &MarshalStream) -> Result<Value, MarshalError> {
        let mut loader = Loader {
            rt: self,
            objects: Vec::new(),
            allocated: Vec::new(),
        };
        match loader.load(&stream.root) {
            Ok(value) => Ok(value),
            Err(err) => {
                let Loader { rt, allocated, .. } = loader;
                for id in allocated {
                    rt.heap.release(id)?;
                }
                Err(err)
            }
        }
    }
}

struct Dumper<'rt> {
    rt: &'rt mut Runtime,
    /// Memo index by identity token.
    memo: AHashMap<i64, u32>,
    /// Keeps dumped strings and arrays alive so their identity tokens stay unique.
    pinned: Vec<Value>,
}

impl Dumper<'_> {
    fn dump(&mut self, value: &Value) -> Result<MarshalValue, MarshalError> {
        Ok(match value {
            Value::Nil => MarshalValue::Nil,
            Value::Bool(b) => MarshalValue::Bool(*b),
            Value::Int(i) => MarshalValue::Int(*i),
            Value::Float(f) => MarshalValue::Float(*f),
            Value::Symbol(s) => MarshalValue::Symbol(s.to_string()),
            Value::Class(class) => MarshalValue::Class(self.rt.class_name(*class)?.to_owned()),
            Value::Str(s) => {
                if let Some(link) = self.remember(value)? {
                    return Ok(link);
                }
                MarshalValue::Str(s.to_string())
            }
            Value::Array(items) => {
                if let Some(link) = self.remember(value)? {
                    return Ok(link);
                }
                let mut dumped = Vec::with_capacity(items.len());
                for item in items.iter() {
                    dumped.push(self.dump(item)?);
                }
                MarshalValue::Array(dumped)
            }
            Value::Ref(id) => {
                if let Some(link) = self.remember(value)? {
                    return Ok(link);
                }
                self.dump_object(value, *id)?
            }
        })
    }

    /// Assigns the next memo index to `value`, or returns a link if it already has one.
    fn remember(&mut self, value: &Value) -> Result<Option<MarshalValue>, MarshalError> {
        let token = value.object_id();
        if let Some(&index) = self.memo.get(&token) {
            return Ok(Some(MarshalValue::Link(index)));
        }
        let index = u32::try_from(self.memo.len())
            .map_err(|_| Exception::new(ExcType::RangeError, "too many objects to marshal"))?;
        self.memo.insert(token, index);
        self.pinned.push(value.clone());
        Ok(None)
    }

    fn dump_object(&mut self, value: &Value, id: HeapId) -> Result<MarshalValue, MarshalError> {
        let object = self.rt.heap.get(id)?;
        let class = self.rt.classes.get(object.class).name().to_owned();
        if object.bound_method().is_some() {
            return Err(ExcType::type_error(format!("no _dump_data is defined for class {class}")).into());
        }
        if object.singleton.as_ref().is_some_and(|table| !table.is_empty()) {
            return Err(ExcType::type_error("singleton can't be dumped").into());
        }
        let ivars: Vec<(String, Value)> = object
            .ivars
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        if respond_to(self.rt, value, "marshal_dump", true)? {
            let payload = self.rt.send(value, "marshal_dump", ArgValues::new())?;
            let payload = Box::new(self.dump(&payload)?);
            return Ok(MarshalValue::UserMarshal { class, payload });
        }
        let mut dumped = Vec::with_capacity(ivars.len());
        for (name, ivar) in ivars {
            dumped.push((name, self.dump(&ivar)?));
        }
        Ok(MarshalValue::Instance { class, ivars: dumped })
    }
}

struct Loader<'rt> {
    rt: &'rt mut Runtime,
    /// Objects by memo index; `None` while still being built.
    objects: Vec<Option<Value>>,
    allocated: Vec<HeapId>,
}

impl Loader<'_> {
    fn load(&mut self, marshalled: &MarshalValue) -> Result<Value, MarshalError> {
        Ok(match marshalled {
            MarshalValue::Nil => Value::Nil,
            MarshalValue::Bool(b) => Value::Bool(*b),
            MarshalValue::Int(i) => Value::Int(*i),
            MarshalValue::Float(f) => Value::Float(*f),
            MarshalValue::Symbol(s) => Value::symbol(s),
            MarshalValue::Class(name) => Value::Class(self.class(name)?),
            MarshalValue::Str(s) => {
                let value = Value::str(s);
                self.objects.push(Some(value.clone()));
                value
            }
            MarshalValue::Array(items) => {
                let slot = self.reserve();
                let mut loaded = Vec::with_capacity(items.len());
                for item in items {
                    loaded.push(self.load(item)?);
                }
                let value = Value::array(loaded);
                self.objects[slot] = Some(value.clone());
                value
            }
            MarshalValue::Instance { class, ivars } => {
                // a delegator's target is only ever set through `marshal_load`
                if self.rt.is_delegator_class(self.class(class)?) {
                    return Err(ExcType::type_error(format!(
                        "delegator {class} can only be loaded through marshal_load"
                    ))
                    .into());
                }
                let object = self.allocate(class)?;
                for (name, ivar) in ivars {
                    let ivar = self.load(ivar)?;
                    self.rt.ivar_set(&object, name, ivar)?;
                }
                object
            }
            MarshalValue::UserMarshal { class, payload } => {
                let object = self.allocate(class)?;
                let payload = self.load(payload)?;
                self.rt.send(&object, "marshal_load", [payload].into())?;
                object
            }
            MarshalValue::Link(index) => self
                .objects
                .get(*index as usize)
                .cloned()
                .flatten()
                .ok_or(MarshalError::BadLink(*index))?,
        })
    }

    fn class(&self, name: &str) -> Result<crate::ClassId, MarshalError> {
        self.rt
            .class_named(name)
            .ok_or_else(|| MarshalError::UnknownClass(name.to_owned()))
    }

    fn reserve(&mut self) -> usize {
        self.objects.push(None);
        self.objects.len() - 1
    }

    /// A bare heap object, registered before its contents load so links to it resolve.
    fn allocate(&mut self, class_name: &str) -> Result<Value, MarshalError> {
        let class = self.class(class_name)?;
        let id = self.rt.allocate(class)?;
        self.allocated.push(id);
        let value = Value::Ref(id);
        self.objects.push(Some(value.clone()));
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_strings_are_linked() {
        let mut rt = Runtime::new();
        let shared = Value::str("oat");
        let pair = Value::array(vec![shared.clone(), shared, Value::str("oat")]);
        let stream = rt.marshal_snapshot(&pair).unwrap();
        assert_eq!(
            stream.root,
            MarshalValue::Array(vec![
                MarshalValue::Str("oat".to_owned()),
                MarshalValue::Link(1),
                MarshalValue::Str("oat".to_owned()),
            ])
        );
    }

    #[test]
    fn version_mismatch_is_rejected() {
        let mut stream = MarshalStream::new(MarshalValue::Nil);
        stream.version = 9;
        let bytes = postcard::to_allocvec(&stream).unwrap();
        assert!(matches!(MarshalStream::load(&bytes), Err(MarshalError::UnsupportedVersion(9))));
    }

    #[test]
    fn dangling_links_fail_and_release_partial_objects() {
        let mut rt = Runtime::new();
        let plain = rt.define_class("Plain", None).unwrap();
        let name = rt.class_name(plain).unwrap().to_owned();
        let stream = MarshalStream::new(MarshalValue::Instance {
            class: name,
            ivars: vec![("@next".to_owned(), MarshalValue::Link(7))],
        });
        let err = rt.marshal_restore(&stream).unwrap_err();
        assert!(matches!(err, MarshalError::BadLink(7)));
        assert_eq!(rt.heap_stats().live_objects, 0);
    }
}
