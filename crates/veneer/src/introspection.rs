//! Method listings and type reports.

use ahash::AHashSet;
use indexmap::IndexSet;

use crate::{
    args::ArgValues,
    builtins::kernel::is_public,
    exception::{ExcType, RunResult},
    runtime::Runtime,
    types::{ClassId, MethodTable},
    value::Value,
};

/// What a value claims to be, layer by layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeIdentity {
    /// The class `class` reports: the innermost target's class.
    pub reported: ClassId,
    /// `reported` followed by its superclasses.
    pub ancestors: Vec<ClassId>,
    /// Real classes of the delegators wrapped around the value, outermost first.
    pub wrapper_layers: Vec<ClassId>,
}

impl TypeIdentity {
    /// True when `class` is the reported class, one of its ancestors, or a wrapper layer.
    #[must_use]
    pub fn includes(&self, class: ClassId) -> bool {
        self.ancestors.contains(&class) || self.wrapper_layers.contains(&class)
    }
}

/// A delegator's own operations, split by whether its immediate target also has them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayerReport {
    /// Defined by the wrapper layer and missing from the target's `methods`.
    pub wrapper_only: Vec<String>,
    /// Defined by the wrapper layer and also listed by the target.
    pub shared: Vec<String>,
}

impl Runtime {
    /// Names `value` responds to, as `methods` lists them.
    pub fn available_operations(&mut self, value: &Value) -> RunResult<IndexSet<String>> {
        let listed = self.call(value, "methods", ArgValues::new())?;
        let names = listed
            .as_array()
            .ok_or_else(|| ExcType::type_error("methods did not return an Array"))?;
        Ok(names.iter().filter_map(Value::as_name).map(str::to_owned).collect())
    }

    /// `method(name)`: a `Method` object bound to `value`.
    pub fn method_object(&mut self, value: &Value, name: &str) -> RunResult<Value> {
        self.call(value, "method", [Value::symbol(name)].into())
    }

    /// The reported class plus the wrapper classes around it.
    pub fn type_identity(&mut self, value: &Value) -> RunResult<TypeIdentity> {
        let reported = self.reported_class(value)?;
        let mut wrapper_layers = Vec::new();
        let mut current = value.clone();
        while self.is_delegator(&current) && wrapper_layers.len() < self.limits.max_depth {
            wrapper_layers.push(self.class_of(&current)?);
            current = self.target_of(&current)?;
        }
        Ok(TypeIdentity {
            reported,
            ancestors: self.classes.ancestors(reported),
            wrapper_layers,
        })
    }

    /// Splits the operations `proxy`'s wrapper layer defines into wrapper-only and shared.
    ///
    /// The wrapper layer is the proxy's singleton methods plus every class
    /// from its real class up to, not including, the `Delegator` base. The
    /// comparison is against the immediate target's `methods`, which for a
    /// nested delegator already includes everything below it.
    pub fn layer_report(&mut self, proxy: &Value) -> RunResult<LayerReport> {
        if !self.is_delegator(proxy) {
            let class_name = self.class_name_of(proxy)?;
            return Err(ExcType::type_error(format!("{class_name} is not a delegator")));
        }
        let own = self.wrapper_layer_names(proxy)?;
        let target = self.target_of(proxy)?;
        let target_names = self.available_operations(&target)?;
        let mut report = LayerReport::default();
        for name in own {
            if target_names.contains(&name) {
                report.shared.push(name);
            } else {
                report.wrapper_only.push(name);
            }
        }
        Ok(report)
    }

    fn wrapper_layer_names(&self, proxy: &Value) -> RunResult<IndexSet<String>> {
        let mut collector = NameCollector::default();
        if let Some(table) = self.singleton_table(proxy)? {
            collector.collect(table);
        }
        let real = self.class_of(proxy)?;
        for class in self.classes.ancestors(real) {
            if class == self.core.delegator {
                break;
            }
            collector.collect(&self.classes.get(class).methods);
        }
        Ok(collector.names)
    }

    /// Public names answered by `value`'s own surface; with `all == false`, singleton methods only.
    pub(crate) fn method_names(&self, value: &Value, all: bool) -> RunResult<IndexSet<String>> {
        let mut collector = NameCollector::default();
        if let Some(table) = self.singleton_table(value)? {
            collector.collect(table);
        }
        if all {
            for class in self.classes.ancestors(self.class_of(value)?) {
                collector.collect(&self.classes.get(class).methods);
            }
        }
        Ok(collector.names)
    }

    pub(crate) fn singleton_method_names(&self, value: &Value) -> RunResult<IndexSet<String>> {
        let mut collector = NameCollector::default();
        if let Some(table) = self.singleton_table(value)? {
            collector.collect(table);
        }
        Ok(collector.names)
    }

    /// Public instance methods of `class`; with `all == false`, its own table only.
    pub(crate) fn instance_method_names(&self, class: ClassId, all: bool) -> IndexSet<String> {
        let mut collector = NameCollector::default();
        for ancestor in self.classes.ancestors(class) {
            collector.collect(&self.classes.get(ancestor).methods);
            if !all {
                break;
            }
        }
        collector.names
    }

    fn singleton_table(&self, value: &Value) -> RunResult<Option<&MethodTable>> {
        match value {
            Value::Ref(id) => Ok(self.heap.get(*id)?.singleton.as_ref()),
            _ => Ok(None),
        }
    }
}

/// Gathers public names nearest-table-first; a private or undefined entry hides the name further up.
#[derive(Default)]
struct NameCollector {
    names: IndexSet<String>,
    hidden: AHashSet<String>,
}

impl NameCollector {
    fn collect(&mut self, table: &MethodTable) {
        for (name, entry) in table.iter() {
            if self.names.contains(name) || self.hidden.contains(name) {
                continue;
            }
            if is_public(entry) {
                self.names.insert(name.to_owned());
            } else {
                self.hidden.insert(name.to_owned());
            }
        }
    }
}
