use std::{fmt, rc::Rc};

use smallvec::SmallVec;

use crate::{
    exception::{ExcType, Exception, RunResult},
    runtime::Runtime,
    types::MethodOwner,
    value::Value,
};

/// A block (deferred callback) passed along with a call.
///
/// Blocks are host closures; `yield` is a plain call of the closure with the
/// yielded values. `instance_eval` and `instance_exec` pass their receiver as
/// the first yielded value.
pub type Block = Rc<dyn Fn(&mut Runtime, ArgValues) -> RunResult<Value>>;

/// Arguments of a call: positional values plus an optional block.
///
/// Most calls carry at most a few arguments, so they are stored inline.
#[derive(Clone, Default)]
pub struct ArgValues {
    args: SmallVec<[Value; 4]>,
    block: Option<Block>,
}

impl ArgValues {
    /// No arguments and no block.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_vec(args: Vec<Value>) -> Self {
        Self {
            args: SmallVec::from_vec(args),
            block: None,
        }
    }

    /// Attaches a block.
    #[must_use]
    pub fn with_block(mut self, block: impl Fn(&mut Runtime, ArgValues) -> RunResult<Value> + 'static) -> Self {
        self.block = Some(Rc::new(block));
        self
    }

    /// Attaches an already shared block, or clears it.
    #[must_use]
    pub fn with_shared_block(mut self, block: Option<Block>) -> Self {
        self.block = block;
        self
    }

    pub fn push(&mut self, value: Value) {
        self.args.push(value);
    }

    /// Puts `value` in front of the positional arguments.
    pub(crate) fn prepend(&mut self, value: Value) {
        self.args.insert(0, value);
    }

    #[must_use]
    pub fn positional(&self) -> &[Value] {
        &self.args
    }

    #[must_use]
    pub fn block(&self) -> Option<&Block> {
        self.block.as_ref()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.args.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// Splits off the first positional argument, keeping the rest and the block.
    pub(crate) fn split_first(mut self) -> Option<(Value, Self)> {
        if self.args.is_empty() {
            return None;
        }
        let first = self.args.remove(0);
        Some((first, self))
    }

    /// Checks that zero arguments were passed.
    pub fn check_zero_args(&self, name: &str) -> RunResult<()> {
        if self.args.is_empty() {
            Ok(())
        } else {
            Err(ExcType::arg_count(name, "0", self.args.len()))
        }
    }

    /// Checks that exactly one positional argument was passed, returning it.
    pub fn get_one_arg(&self, name: &str) -> RunResult<&Value> {
        match self.args.as_slice() {
            [a] => Ok(a),
            other => Err(ExcType::arg_count(name, "1", other.len())),
        }
    }

    /// Checks that exactly two positional arguments were passed.
    pub fn get_two_args(&self, name: &str) -> RunResult<(&Value, &Value)> {
        match self.args.as_slice() {
            [a, b] => Ok((a, b)),
            other => Err(ExcType::arg_count(name, "2", other.len())),
        }
    }

    /// Checks for one required and one optional argument.
    pub fn get_one_two_args(&self, name: &str) -> RunResult<(&Value, Option<&Value>)> {
        match self.args.as_slice() {
            [a] => Ok((a, None)),
            [a, b] => Ok((a, Some(b))),
            other => Err(ExcType::arg_count(name, "1..2", other.len())),
        }
    }

    /// Checks for at most one optional argument.
    pub fn get_zero_one_arg(&self, name: &str) -> RunResult<Option<&Value>> {
        match self.args.as_slice() {
            [] => Ok(None),
            [a] => Ok(Some(a)),
            other => Err(ExcType::arg_count(name, "0..1", other.len())),
        }
    }

    /// Returns the block or fails with `InvalidOperand`.
    pub fn require_block(&self, name: &str) -> RunResult<&Block> {
        self.block
            .as_ref()
            .ok_or_else(|| Exception::new(ExcType::InvalidOperand, format!("no block given to '{name}'")))
    }
}

impl fmt::Debug for ArgValues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArgValues")
            .field("args", &self.args)
            .field("block", &self.block.as_ref().map(|_| ".."))
            .finish()
    }
}

impl From<Vec<Value>> for ArgValues {
    fn from(args: Vec<Value>) -> Self {
        Self::from_vec(args)
    }
}

impl<const N: usize> From<[Value; N]> for ArgValues {
    fn from(args: [Value; N]) -> Self {
        Self {
            args: args.into_iter().collect(),
            block: None,
        }
    }
}

/// Everything a method body gets to know about its invocation.
#[derive(Debug, Clone)]
pub struct CallFrame {
    pub(crate) receiver: Value,
    pub(crate) name: Rc<str>,
    pub(crate) owner: MethodOwner,
    pub(crate) args: ArgValues,
}

impl CallFrame {
    /// `self` of the method.
    #[must_use]
    pub fn receiver(&self) -> &Value {
        &self.receiver
    }

    /// Name the method was invoked under.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Where the running method was found; `call_super` resumes above it.
    #[must_use]
    pub fn owner(&self) -> MethodOwner {
        self.owner
    }

    #[must_use]
    pub fn args(&self) -> &ArgValues {
        &self.args
    }

    /// Positional argument `index`, if passed.
    #[must_use]
    pub fn arg(&self, index: usize) -> Option<&Value> {
        self.args.positional().get(index)
    }

    #[must_use]
    pub fn block(&self) -> Option<&Block> {
        self.args.block()
    }
}
