//! `String` and `Symbol`.

use strum::{EnumIter, IntoStaticStr};

use super::{BuiltinSurface, int_arg, kernel::hash_int};
use crate::{
    args::CallFrame,
    exception::{ExcType, Exception, RunResult},
    runtime::Runtime,
    value::{Value, stable_hash},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub(crate) enum StringMethod {
    #[strum(serialize = "+")]
    Add,
    #[strum(serialize = "*")]
    Mul,
    #[strum(serialize = "==")]
    Eq,
    #[strum(serialize = "<=>")]
    Cmp,
    #[strum(serialize = "eql?")]
    Eql,
    Hash,
    Length,
    Size,
    #[strum(serialize = "empty?")]
    Empty,
    #[strum(serialize = "include?")]
    Include,
    #[strum(serialize = "start_with?")]
    StartWith,
    Upcase,
    Downcase,
    Reverse,
    ToS,
    ToStr,
    ToSym,
    Inspect,
}

impl BuiltinSurface for StringMethod {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub(crate) enum SymbolMethod {
    #[strum(serialize = "<=>")]
    Cmp,
    Length,
    ToS,
    ToSym,
    Inspect,
}

impl BuiltinSurface for SymbolMethod {}

fn string_operand<'a>(rt: &Runtime, value: &'a Value) -> RunResult<&'a str> {
    match value {
        Value::Str(s) => Ok(&**s),
        other => {
            let class_name = rt.class_name_of(other)?;
            Err(ExcType::type_error(format!(
                "no implicit conversion of {class_name} into String"
            )))
        }
    }
}

fn ordering_value(ordering: std::cmp::Ordering) -> Value {
    Value::Int(ordering as i64)
}

/// Double-quoted with escapes, for `inspect`.
pub(crate) fn quote(s: &str) -> String {
    format!("{s:?}")
}

pub(crate) fn call_string(rt: &mut Runtime, method: StringMethod, frame: &CallFrame) -> RunResult<Value> {
    let Value::Str(s) = frame.receiver() else {
        return Err(ExcType::type_error("String method on a non-string receiver"));
    };
    let args = frame.args();
    let name = frame.name();
    match method {
        StringMethod::Add => {
            let other = string_operand(rt, args.get_one_arg(name)?)?;
            Ok(Value::from(format!("{s}{other}")))
        }
        StringMethod::Mul => {
            let count = int_arg(rt, args.get_one_arg(name)?, "String#*")?;
            let count = usize::try_from(count)
                .map_err(|_| Exception::new(ExcType::InvalidOperand, "negative argument"))?;
            Ok(Value::from(s.repeat(count)))
        }
        StringMethod::Eq | StringMethod::Eql => {
            let other = args.get_one_arg(name)?;
            Ok(Value::Bool(other.as_str() == Some(&**s)))
        }
        StringMethod::Cmp => Ok(match args.get_one_arg(name)?.as_str() {
            Some(other) => ordering_value((**s).cmp(other)),
            None => Value::Nil,
        }),
        StringMethod::Hash => {
            args.check_zero_args(name)?;
            Ok(Value::Int(hash_int(stable_hash(&**s))))
        }
        StringMethod::Length | StringMethod::Size => {
            args.check_zero_args(name)?;
            length(s)
        }
        StringMethod::Empty => {
            args.check_zero_args(name)?;
            Ok(Value::Bool(s.is_empty()))
        }
        StringMethod::Include => {
            let needle = string_operand(rt, args.get_one_arg(name)?)?;
            Ok(Value::Bool(s.contains(needle)))
        }
        StringMethod::StartWith => {
            let prefix = string_operand(rt, args.get_one_arg(name)?)?;
            Ok(Value::Bool(s.starts_with(prefix)))
        }
        StringMethod::Upcase => {
            args.check_zero_args(name)?;
            Ok(Value::from(s.to_uppercase()))
        }
        StringMethod::Downcase => {
            args.check_zero_args(name)?;
            Ok(Value::from(s.to_lowercase()))
        }
        StringMethod::Reverse => {
            args.check_zero_args(name)?;
            Ok(Value::from(s.chars().rev().collect::<String>()))
        }
        StringMethod::ToS | StringMethod::ToStr => {
            args.check_zero_args(name)?;
            Ok(frame.receiver().clone())
        }
        StringMethod::ToSym => {
            args.check_zero_args(name)?;
            Ok(Value::symbol(s))
        }
        StringMethod::Inspect => {
            args.check_zero_args(name)?;
            Ok(Value::from(quote(s)))
        }
    }
}

pub(crate) fn call_symbol(_rt: &mut Runtime, method: SymbolMethod, frame: &CallFrame) -> RunResult<Value> {
    let Value::Symbol(s) = frame.receiver() else {
        return Err(ExcType::type_error("Symbol method on a non-symbol receiver"));
    };
    let args = frame.args();
    let name = frame.name();
    match method {
        SymbolMethod::Cmp => Ok(match args.get_one_arg(name)? {
            Value::Symbol(other) => ordering_value((**s).cmp(&**other)),
            _ => Value::Nil,
        }),
        SymbolMethod::Length => {
            args.check_zero_args(name)?;
            length(s)
        }
        SymbolMethod::ToS => {
            args.check_zero_args(name)?;
            Ok(Value::str(s))
        }
        SymbolMethod::ToSym => {
            args.check_zero_args(name)?;
            Ok(frame.receiver().clone())
        }
        SymbolMethod::Inspect => {
            args.check_zero_args(name)?;
            Ok(Value::from(format!(":{s}")))
        }
    }
}

fn length(s: &str) -> RunResult<Value> {
    let count = i64::try_from(s.chars().count()).map_err(|_| Exception::new(ExcType::RangeError, "string too long"))?;
    Ok(Value::Int(count))
}
