use strum::{EnumIter, IntoStaticStr};

use super::{BuiltinSurface, int_arg, inspect_value, kernel::hash_int, to_s_value};
use crate::{
    args::{ArgValues, CallFrame},
    exception::{ExcType, Exception, RunResult},
    runtime::Runtime,
    value::{Value, stable_hash},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub(crate) enum ArrayMethod {
    #[strum(serialize = "==")]
    Eq,
    #[strum(serialize = "eql?")]
    Eql,
    Hash,
    Length,
    Size,
    #[strum(serialize = "empty?")]
    Empty,
    #[strum(serialize = "[]")]
    Index,
    Fetch,
    First,
    Last,
    #[strum(serialize = "include?")]
    Include,
    Join,
    Inspect,
    ToS,
    ToA,
    Each,
    Map,
    #[strum(serialize = "|")]
    Union,
    #[strum(serialize = "+")]
    Concat,
}

impl BuiltinSurface for ArrayMethod {}

pub(crate) fn call(rt: &mut Runtime, method: ArrayMethod, frame: &CallFrame) -> RunResult<Value> {
    let Value::Array(items) = frame.receiver() else {
        return Err(ExcType::type_error("Array method on a non-array receiver"));
    };
    let items = items.clone();
    let args = frame.args();
    let name = frame.name();
    match method {
        ArrayMethod::Eq | ArrayMethod::Eql => {
            let other = args.get_one_arg(name)?;
            let Some(other) = other.as_array() else {
                return Ok(Value::Bool(false));
            };
            if other.len() != items.len() {
                return Ok(Value::Bool(false));
            }
            let element_op = if method == ArrayMethod::Eq { "==" } else { "eql?" };
            for (left, right) in items.iter().zip(other.to_vec()) {
                if !rt.call(left, element_op, [right].into())?.is_truthy() {
                    return Ok(Value::Bool(false));
                }
            }
            Ok(Value::Bool(true))
        }
        ArrayMethod::Hash => {
            args.check_zero_args(name)?;
            let mut hashes = Vec::with_capacity(items.len());
            for item in items.iter() {
                hashes.push(rt.call(item, "hash", ArgValues::new())?.as_int().unwrap_or_default());
            }
            Ok(Value::Int(hash_int(stable_hash(&hashes))))
        }
        ArrayMethod::Length | ArrayMethod::Size => {
            args.check_zero_args(name)?;
            let len = i64::try_from(items.len()).map_err(|_| Exception::new(ExcType::RangeError, "array too long"))?;
            Ok(Value::Int(len))
        }
        ArrayMethod::Empty => {
            args.check_zero_args(name)?;
            Ok(Value::Bool(items.is_empty()))
        }
        ArrayMethod::Index => {
            let index = int_arg(rt, args.get_one_arg(name)?, "Array#[]")?;
            Ok(element_at(&items, index))
        }
        ArrayMethod::Fetch => {
            let index = int_arg(rt, args.get_one_arg(name)?, "Array#fetch")?;
            if resolve_index(items.len(), index).is_some() {
                Ok(element_at(&items, index))
            } else {
                Err(Exception::new(
                    ExcType::IndexError,
                    format!("index {index} outside of array bounds: -{len}...{len}", len = items.len()),
                ))
            }
        }
        ArrayMethod::First => {
            args.check_zero_args(name)?;
            Ok(items.first().cloned().unwrap_or(Value::Nil))
        }
        ArrayMethod::Last => {
            args.check_zero_args(name)?;
            Ok(items.last().cloned().unwrap_or(Value::Nil))
        }
        ArrayMethod::Include => {
            let needle = args.get_one_arg(name)?;
            for item in items.iter() {
                if rt.call(item, "==", [needle.clone()].into())?.is_truthy() {
                    return Ok(Value::Bool(true));
                }
            }
            Ok(Value::Bool(false))
        }
        ArrayMethod::Join => {
            let separator = match args.get_zero_one_arg(name)? {
                None | Some(Value::Nil) => String::new(),
                Some(Value::Str(s)) => s.to_string(),
                Some(_) => return Err(ExcType::type_error("separator must be a String")),
            };
            let mut parts = Vec::with_capacity(items.len());
            for item in items.iter() {
                parts.push(to_s_value(rt, item)?);
            }
            Ok(Value::from(parts.join(&separator)))
        }
        ArrayMethod::Inspect | ArrayMethod::ToS => {
            args.check_zero_args(name)?;
            let mut parts = Vec::with_capacity(items.len());
            for item in items.iter() {
                parts.push(inspect_value(rt, item)?);
            }
            Ok(Value::from(format!("[{}]", parts.join(", "))))
        }
        ArrayMethod::ToA => {
            args.check_zero_args(name)?;
            Ok(frame.receiver().clone())
        }
        ArrayMethod::Each => {
            let block = args.require_block(name)?;
            for item in items.iter() {
                block(rt, [item.clone()].into())?;
            }
            Ok(frame.receiver().clone())
        }
        ArrayMethod::Map => {
            let block = args.require_block(name)?;
            let mut mapped = Vec::with_capacity(items.len());
            for item in items.iter() {
                mapped.push(block(rt, [item.clone()].into())?);
            }
            Ok(Value::array(mapped))
        }
        ArrayMethod::Union => {
            let other = array_operand(args.get_one_arg(name)?)?;
            let mut out: Vec<Value> = Vec::with_capacity(items.len() + other.len());
            for candidate in items.iter().chain(other.iter()) {
                let mut seen = false;
                for kept in &out {
                    if rt.call(kept, "eql?", [candidate.clone()].into())?.is_truthy() {
                        seen = true;
                        break;
                    }
                }
                if !seen {
                    out.push(candidate.clone());
                }
            }
            Ok(Value::array(out))
        }
        ArrayMethod::Concat => {
            let other = array_operand(args.get_one_arg(name)?)?;
            Ok(Value::array(items.iter().chain(other.iter()).cloned().collect()))
        }
    }
}

fn array_operand(value: &Value) -> RunResult<Vec<Value>> {
    value
        .as_array()
        .map(<[Value]>::to_vec)
        .ok_or_else(|| ExcType::type_error("no implicit conversion into Array"))
}

/// Index from the front, or from the back when negative; `nil` out of range.
fn element_at(items: &[Value], index: i64) -> Value {
    resolve_index(items.len(), index)
        .and_then(|i| items.get(i))
        .cloned()
        .unwrap_or(Value::Nil)
}

fn resolve_index(len: usize, index: i64) -> Option<usize> {
    let resolved = if index < 0 {
        usize::try_from(index.unsigned_abs())
            .ok()
            .and_then(|back| len.checked_sub(back))
    } else {
        usize::try_from(index).ok()
    };
    resolved.filter(|&i| i < len)
}
