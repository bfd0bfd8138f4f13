//! The object runtime: heap, class table, and the host-facing API.

use std::{any::Any, rc::Rc};

use crate::{
    args::{ArgValues, CallFrame},
    builtins,
    exception::{ExcType, Exception, RunResult},
    heap::{Heap, HeapId, HeapStats},
    resource::DispatchLimits,
    tracer::{DispatchTracer, NoopTracer},
    types::{ClassId, ClassKind, ClassTable, HeapData, HeapObject, HostFn, MethodBody, MethodTable, TargetCell, Visibility},
    value::Value,
};

/// Ids of the classes every runtime starts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoreClasses {
    pub basic_object: ClassId,
    pub object: ClassId,
    pub class: ClassId,
    pub method: ClassId,
    pub nil: ClassId,
    pub true_class: ClassId,
    pub false_class: ClassId,
    pub integer: ClassId,
    pub float: ClassId,
    pub string: ClassId,
    pub symbol: ClassId,
    pub array: ClassId,
    /// The prepared base every delegator class descends from.
    pub delegator: ClassId,
}

impl CoreClasses {
    fn bootstrap(classes: &mut ClassTable) -> RunResult<Self> {
        let basic_object = classes.define("BasicObject", None)?;
        let object = classes.define("Object", Some(basic_object))?;
        let mut value_class = |name: &str| -> RunResult<ClassId> {
            let id = classes.define(name, Some(object))?;
            classes.set_kind(id, ClassKind::NoAllocator);
            Ok(id)
        };
        let class = value_class("Class")?;
        let method = value_class("Method")?;
        let nil = value_class("NilClass")?;
        let true_class = value_class("TrueClass")?;
        let false_class = value_class("FalseClass")?;
        let integer = value_class("Integer")?;
        let float = value_class("Float")?;
        let string = value_class("String")?;
        let symbol = value_class("Symbol")?;
        let array = value_class("Array")?;
        let delegator = classes.define("Delegator", Some(basic_object))?;
        Ok(Self {
            basic_object,
            object,
            class,
            method,
            nil,
            true_class,
            false_class,
            integer,
            float,
            string,
            symbol,
            array,
            delegator,
        })
    }
}

/// How `dup`/`clone` copy an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CopyKind {
    /// Instance variables only.
    Dup,
    /// Also singleton methods and the frozen flag.
    Clone,
}

/// A single-threaded object runtime.
///
/// Owns every heap object and class. All interaction with objects goes
/// through message sends ([`Runtime::call`], [`Runtime::send`]); the
/// remaining methods are host conveniences built on those sends or
/// bookkeeping that has no message equivalent.
///
/// ```
/// use veneer::{ArgValues, Runtime, Value};
///
/// let mut rt = Runtime::new();
/// let coffee = rt.define_class("Coffee", None).unwrap();
/// rt.define_method(coffee, "cost", |_, _| Ok(Value::Int(2))).unwrap();
///
/// let milk = rt.define_delegator_class("Milk").unwrap();
/// rt.define_method(milk, "cost", |rt, frame| {
///     let inner = rt.call_super(frame, ArgValues::new())?;
///     rt.call(&inner, "+", [Value::Float(0.4)].into())
/// })
/// .unwrap();
///
/// let plain = rt.instantiate(coffee, ArgValues::new()).unwrap();
/// let with_milk = rt.wrap(milk, plain).unwrap();
/// let cost = rt.call(&with_milk, "cost", ArgValues::new()).unwrap();
/// assert_eq!(rt.to_s(&cost).unwrap(), "2.4");
/// ```
#[derive(Debug)]
pub struct Runtime {
    pub(crate) heap: Heap,
    pub(crate) classes: ClassTable,
    pub(crate) core: CoreClasses,
    pub(crate) limits: DispatchLimits,
    pub(crate) tracer: Box<dyn DispatchTracer>,
    /// Current dispatch nesting.
    pub(crate) depth: usize,
    delegator_prepared: bool,
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl Runtime {
    /// A runtime with default limits and no tracing.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(DispatchLimits::default(), NoopTracer)
    }

    /// A runtime with the given limits and tracer.
    #[must_use]
    pub fn with_config(limits: DispatchLimits, tracer: impl DispatchTracer) -> Self {
        let mut classes = ClassTable::default();
        let core = match CoreClasses::bootstrap(&mut classes) {
            Ok(core) => core,
            // the class table is empty, so none of the bootstrap definitions can clash
            Err(err) => unreachable!("core class bootstrap failed: {err}"),
        };
        builtins::install(&mut classes, &core);
        let mut rt = Self {
            heap: Heap::default(),
            classes,
            core,
            limits,
            tracer: Box::new(tracer),
            depth: 0,
            delegator_prepared: false,
        };
        if let Err(err) = rt.prepare_delegator_base() {
            unreachable!("delegator base prepared twice during bootstrap: {err}");
        }
        rt
    }

    /// Strips and installs the `Delegator` surface. Runs once, before any instance exists.
    pub(crate) fn prepare_delegator_base(&mut self) -> RunResult<()> {
        if self.delegator_prepared {
            return Err(Exception::runtime_error("Delegator base is already prepared"));
        }
        builtins::delegator::prepare_surface(&mut self.classes, &self.core);
        self.classes.set_kind(self.core.delegator, ClassKind::Delegator);
        self.delegator_prepared = true;
        Ok(())
    }

    #[must_use]
    pub fn core(&self) -> &CoreClasses {
        &self.core
    }

    #[must_use]
    pub fn limits(&self) -> DispatchLimits {
        self.limits
    }

    /// The installed tracer, if it is a `T`.
    #[must_use]
    pub fn tracer<T: DispatchTracer>(&self) -> Option<&T> {
        let tracer: &dyn Any = &*self.tracer;
        tracer.downcast_ref()
    }

    /// Mutable access to the installed tracer, if it is a `T`.
    pub fn tracer_mut<T: DispatchTracer>(&mut self) -> Option<&mut T> {
        let tracer: &mut dyn Any = &mut *self.tracer;
        tracer.downcast_mut()
    }

    // ------------------------------------------------------------------------
    // Classes
    // ------------------------------------------------------------------------

    /// Defines (or reopens) a class. `None` means a subclass of `Object`.
    pub fn define_class(&mut self, name: &str, superclass: Option<ClassId>) -> RunResult<ClassId> {
        self.classes.define(name, Some(superclass.unwrap_or(self.core.object)))
    }

    /// Defines a wrapper class directly below the `Delegator` base.
    ///
    /// Deeper wrapper hierarchies use [`Runtime::define_class`] with a
    /// delegator class as the superclass.
    pub fn define_delegator_class(&mut self, name: &str) -> RunResult<ClassId> {
        self.classes.define(name, Some(self.core.delegator))
    }

    #[must_use]
    pub fn class_named(&self, name: &str) -> Option<ClassId> {
        self.classes.named(name)
    }

    pub fn class_name(&self, class: ClassId) -> RunResult<&str> {
        let class = self.classes.check(class)?;
        Ok(self.classes.get(class).name())
    }

    /// The class followed by its superclasses.
    pub fn ancestors(&self, class: ClassId) -> RunResult<Vec<ClassId>> {
        let class = self.classes.check(class)?;
        Ok(self.classes.ancestors(class))
    }

    pub fn superclass(&self, class: ClassId) -> RunResult<Option<ClassId>> {
        let class = self.classes.check(class)?;
        Ok(self.classes.get(class).superclass())
    }

    /// True for `Delegator` and every class descending from it.
    #[must_use]
    pub fn is_delegator_class(&self, class: ClassId) -> bool {
        self.classes.contains(class) && self.classes.get(class).kind() == ClassKind::Delegator
    }

    /// Defines a public instance method.
    pub fn define_method(
        &mut self,
        class: ClassId,
        name: &str,
        body: impl Fn(&mut Self, &CallFrame) -> RunResult<Value> + 'static,
    ) -> RunResult<()> {
        self.define_method_with(class, name, Rc::new(body), Visibility::Public)
    }

    /// Defines a private instance method, reachable through `send` and `super` only.
    pub fn define_private_method(
        &mut self,
        class: ClassId,
        name: &str,
        body: impl Fn(&mut Self, &CallFrame) -> RunResult<Value> + 'static,
    ) -> RunResult<()> {
        self.define_method_with(class, name, Rc::new(body), Visibility::Private)
    }

    pub fn define_method_with(&mut self, class: ClassId, name: &str, body: HostFn, visibility: Visibility) -> RunResult<()> {
        check_method_name(name)?;
        let class = self.classes.check(class)?;
        self.classes
            .get_mut(class)
            .methods
            .define(name, MethodBody::Host(body), visibility);
        Ok(())
    }

    /// Defines a method on one object only.
    pub fn define_singleton_method(
        &mut self,
        object: &Value,
        name: &str,
        body: impl Fn(&mut Self, &CallFrame) -> RunResult<Value> + 'static,
    ) -> RunResult<()> {
        check_method_name(name)?;
        let id = object
            .heap_id()
            .ok_or_else(|| ExcType::type_error("can't define singleton"))?;
        let class_name = self.class_name_of(object)?;
        let heap_object = self.heap.get_mut(id)?;
        if heap_object.frozen {
            return Err(ExcType::frozen(&class_name));
        }
        heap_object.singleton.get_or_insert_with(MethodTable::default).define(
            name,
            MethodBody::Host(Rc::new(body)),
            Visibility::Public,
        );
        Ok(())
    }

    /// Marks `name` undefined in `class`, hiding any inherited definition.
    pub fn undef_method(&mut self, class: ClassId, name: &str) -> RunResult<()> {
        check_method_name(name)?;
        let class = self.classes.check(class)?;
        self.classes.get_mut(class).methods.undefine(name);
        Ok(())
    }

    /// Removes `class`'s own entry for `name`, exposing any inherited definition.
    pub fn remove_method(&mut self, class: ClassId, name: &str) -> RunResult<()> {
        let class = self.classes.check(class)?;
        if self.classes.get_mut(class).methods.remove(name) {
            Ok(())
        } else {
            let class_name = self.classes.get(class).name().to_owned();
            Err(Exception::new(
                ExcType::NotFound,
                format!("method '{name}' not defined in {class_name}"),
            ))
        }
    }

    // ------------------------------------------------------------------------
    // Objects
    // ------------------------------------------------------------------------

    /// Allocates an instance of `class` and runs its `initialize` with `args`.
    ///
    /// A failed `initialize` releases the half-built object.
    pub fn instantiate(&mut self, class: ClassId, args: ArgValues) -> RunResult<Value> {
        let id = self.allocate(class)?;
        let object = Value::Ref(id);
        match self.send(&object, "initialize", args) {
            Ok(_) => Ok(object),
            Err(err) => {
                self.heap.release(id)?;
                Err(err)
            }
        }
    }

    /// Wraps `target` in a new instance of the delegator class `class`.
    pub fn wrap(&mut self, class: ClassId, target: Value) -> RunResult<Value> {
        if !self.is_delegator_class(class) {
            let name = self.class_name(class)?.to_owned();
            return Err(ExcType::type_error(format!("{name} is not a delegator class")));
        }
        self.instantiate(class, [target].into())
    }

    /// A bare object of `class`, with no `initialize` run.
    pub(crate) fn allocate(&mut self, class: ClassId) -> RunResult<HeapId> {
        let class = self.classes.check(class)?;
        let data = match self.classes.get(class).kind() {
            ClassKind::Plain => HeapData::Instance,
            ClassKind::Delegator => HeapData::Delegator(TargetCell::unset()),
            ClassKind::NoAllocator => {
                let name = self.classes.get(class).name().to_owned();
                return Err(ExcType::type_error(format!("allocator undefined for {name}")));
            }
        };
        Ok(self.heap.allocate(HeapObject::with_data(class, data)))
    }

    /// True when `value` is a delegator instance.
    #[must_use]
    pub fn is_delegator(&self, value: &Value) -> bool {
        value
            .heap_id()
            .and_then(|id| self.heap.get(id).ok())
            .is_some_and(|object| object.target_cell().is_some())
    }

    /// The delegator's current target.
    pub fn target_of(&self, delegator: &Value) -> RunResult<Value> {
        let cell = self.target_cell(delegator)?;
        Ok(cell.get().clone())
    }

    /// Replaces the delegator's target, as `__setobj__` does.
    pub fn set_target(&mut self, delegator: &Value, target: Value) -> RunResult<Value> {
        self.send(delegator, "__setobj__", [target].into())
    }

    fn target_cell(&self, delegator: &Value) -> RunResult<&TargetCell> {
        let not_a_delegator = || ExcType::type_error("not a delegator");
        let id = delegator.heap_id().ok_or_else(not_a_delegator)?;
        self.heap.get(id)?.target_cell().ok_or_else(not_a_delegator)
    }

    /// Stores a new target in the delegator's cell.
    pub(crate) fn store_target(&mut self, delegator: &Value, target: Value) -> RunResult<()> {
        let id = delegator
            .heap_id()
            .ok_or_else(|| ExcType::type_error("not a delegator"))?;
        let class_name = self.class_name_of(delegator)?;
        let target_type = self.class_name_of(&target)?;
        let object = self.heap.get_mut(id)?;
        if object.frozen {
            return Err(ExcType::frozen(&class_name));
        }
        let cell = object
            .target_cell_mut()
            .ok_or_else(|| ExcType::type_error("not a delegator"))?;
        cell.set(id, target)?;
        self.tracer.on_target_set(delegator.object_id(), &target_type);
        Ok(())
    }

    /// Reads an instance variable; unset variables read as `nil`.
    pub fn ivar_get(&self, object: &Value, name: &str) -> RunResult<Value> {
        match object {
            Value::Ref(id) => Ok(self.heap.get(*id)?.ivars.get(name).cloned().unwrap_or(Value::Nil)),
            _ => Ok(Value::Nil),
        }
    }

    pub fn ivar_set(&mut self, object: &Value, name: &str, value: Value) -> RunResult<()> {
        let class_name = self.class_name_of(object)?;
        let Value::Ref(id) = object else {
            return Err(ExcType::frozen(&class_name));
        };
        let heap_object = self.heap.get_mut(*id)?;
        if heap_object.frozen {
            return Err(ExcType::frozen(&class_name));
        }
        heap_object.ivars.insert(name.to_owned(), value);
        Ok(())
    }

    /// Copies `value` for `dup`/`clone` and runs the copy hook on the result.
    pub(crate) fn copy_object(&mut self, value: &Value, kind: CopyKind) -> RunResult<Value> {
        let Value::Ref(id) = value else {
            return Ok(value.shallow_copy());
        };
        let original = self.heap.get(*id)?;
        let data = match &original.data {
            HeapData::Instance => HeapData::Instance,
            HeapData::Delegator(_) => HeapData::Delegator(TargetCell::unset()),
            HeapData::Method(method) => HeapData::Method(method.clone()),
        };
        let mut copy = HeapObject::with_data(original.class, data);
        copy.ivars = original.ivars.clone();
        let freeze_after = kind == CopyKind::Clone && original.frozen;
        if kind == CopyKind::Clone {
            copy.singleton = original.singleton.clone();
        }
        let copy_id = self.heap.allocate(copy);
        let copy = Value::Ref(copy_id);
        let hook = match kind {
            CopyKind::Dup => "initialize_dup",
            CopyKind::Clone => "initialize_clone",
        };
        if let Err(err) = self.send(&copy, hook, [value.clone()].into()) {
            self.heap.release(copy_id)?;
            return Err(err);
        }
        if freeze_after {
            self.heap.get_mut(copy_id)?.frozen = true;
        }
        Ok(copy)
    }

    /// Live objects whose real class is `class` or a subclass of it.
    #[must_use]
    pub fn each_object(&self, class: ClassId) -> Vec<Value> {
        self.heap
            .ids_of_kind(&self.classes, class)
            .into_iter()
            .map(Value::Ref)
            .collect()
    }

    /// Drops an object from the heap; later use of it fails.
    pub fn release(&mut self, object: &Value) -> RunResult<()> {
        let id = object
            .heap_id()
            .ok_or_else(|| ExcType::type_error("only heap objects can be released"))?;
        self.heap.release(id)
    }

    #[must_use]
    pub fn heap_stats(&self) -> HeapStats {
        self.heap.stats(&self.classes)
    }

    // ------------------------------------------------------------------------
    // Real class
    // ------------------------------------------------------------------------

    /// The class `value` really is, without dispatch.
    pub(crate) fn class_of(&self, value: &Value) -> RunResult<ClassId> {
        Ok(match value {
            Value::Nil => self.core.nil,
            Value::Bool(true) => self.core.true_class,
            Value::Bool(false) => self.core.false_class,
            Value::Int(_) => self.core.integer,
            Value::Float(_) => self.core.float,
            Value::Str(_) => self.core.string,
            Value::Symbol(_) => self.core.symbol,
            Value::Array(_) => self.core.array,
            Value::Class(_) => self.core.class,
            Value::Ref(id) => self.heap.get(*id)?.class,
        })
    }

    /// Name of the class `value` really is.
    pub fn class_name_of(&self, value: &Value) -> RunResult<String> {
        let class = self.class_of(value)?;
        Ok(self.classes.get(class).name().to_owned())
    }
}

fn check_method_name(name: &str) -> RunResult<()> {
    if name.is_empty() {
        Err(ExcType::type_error("method name must not be empty"))
    } else {
        Ok(())
    }
}
