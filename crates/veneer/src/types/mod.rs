//! Object model types: classes, method tables and heap object layouts.

pub mod bound_method;
pub mod class;
pub mod delegator;
pub mod method_table;
pub mod object;

pub(crate) use bound_method::BoundMethod;
pub use class::ClassId;
pub(crate) use class::{ClassKind, ClassTable};
pub(crate) use delegator::TargetCell;
pub use method_table::{HostFn, MethodOwner, Visibility};
pub(crate) use method_table::{FoundMethod, Lookup, MethodBody, MethodEntry, MethodTable};
pub(crate) use object::{HeapData, HeapObject};
