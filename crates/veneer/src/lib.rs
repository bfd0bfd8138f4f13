#![doc = include_str!("../../../README.md")]
#![expect(clippy::cast_possible_wrap, reason = "identity tokens reinterpret address and hash bits")]
mod args;
mod builtins;
mod case_match;
mod dispatch;
mod exception;
mod heap;
mod identity;
mod introspection;
mod marshal;
mod resource;
mod runtime;
pub mod tracer;
mod types;
mod value;

pub use crate::{
    args::{ArgValues, Block, CallFrame},
    exception::{ExcType, Exception, MissingOperation, RunResult},
    heap::{HeapId, HeapStats},
    introspection::{LayerReport, TypeIdentity},
    marshal::{MARSHAL_FORMAT_VERSION, MarshalError, MarshalStream, MarshalValue},
    resource::{DEFAULT_MAX_DISPATCH_DEPTH, DispatchLimits, ResourceError},
    runtime::{CoreClasses, Runtime},
    tracer::{
        DispatchTracer, NoopTracer, ProfilingReport, ProfilingTracer, RecordingTracer, StderrTracer, TraceEvent,
    },
    types::{ClassId, HostFn, MethodOwner, Visibility},
    value::Value,
};
