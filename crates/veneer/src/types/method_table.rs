use std::{fmt, rc::Rc};

use indexmap::IndexMap;

use crate::{args::CallFrame, builtins::Builtin, exception::RunResult, runtime::Runtime, types::ClassId, value::Value};

/// A method body supplied by the embedding host.
///
/// Receives the runtime (to send further messages, call `super`, or touch
/// instance state) and the call frame describing the invocation.
pub type HostFn = Rc<dyn Fn(&mut Runtime, &CallFrame) -> RunResult<Value>>;

/// Method visibility.
///
/// Private methods can only be reached through `send`/`__send__`, `call_super`
/// and the runtime's own hooks; a public call to one goes to `method_missing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Visibility {
    #[default]
    Public,
    Private,
}

#[derive(Clone)]
pub(crate) enum MethodBody {
    Builtin(Builtin),
    Host(HostFn),
}

impl fmt::Debug for MethodBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Builtin(builtin) => write!(f, "Builtin({builtin:?})"),
            Self::Host(_) => f.write_str("Host(..)"),
        }
    }
}

/// One name in a method table.
#[derive(Debug, Clone)]
pub(crate) enum MethodEntry {
    Defined { body: MethodBody, visibility: Visibility },
    /// Stops lookup: the name is treated as absent even if an ancestor defines it.
    Undefined,
}

/// Where a method was found; `call_super` resumes lookup above this point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodOwner {
    /// Per-object method; super continues at the object's real class.
    Singleton,
    Class(ClassId),
}

/// A successful lookup.
#[derive(Debug, Clone)]
pub(crate) struct FoundMethod {
    pub owner: MethodOwner,
    pub body: MethodBody,
    pub visibility: Visibility,
}

#[derive(Debug, Clone)]
pub(crate) enum Lookup {
    Found(FoundMethod),
    /// Hit an undefined marker.
    Undefined,
    /// No table in the chain mentions the name.
    Missing,
}

impl Lookup {
    /// Returns the method if it is callable with the given visibility allowance.
    pub fn callable(self, allow_private: bool) -> Option<FoundMethod> {
        match self {
            Self::Found(found) if allow_private || found.visibility == Visibility::Public => Some(found),
            _ => None,
        }
    }
}

/// Insertion-ordered name -> entry map, so `methods` output is deterministic.
#[derive(Debug, Clone, Default)]
pub(crate) struct MethodTable(IndexMap<String, MethodEntry>);

impl MethodTable {
    pub fn get(&self, name: &str) -> Option<&MethodEntry> {
        self.0.get(name)
    }

    pub fn define(&mut self, name: &str, body: MethodBody, visibility: Visibility) {
        self.0
            .insert(name.to_owned(), MethodEntry::Defined { body, visibility });
    }

    pub fn undefine(&mut self, name: &str) {
        self.0.insert(name.to_owned(), MethodEntry::Undefined);
    }

    /// Removes the entry, returning whether there was one.
    pub fn remove(&mut self, name: &str) -> bool {
        self.0.shift_remove(name).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MethodEntry)> {
        self.0.iter().map(|(name, entry)| (name.as_str(), entry))
    }
}
