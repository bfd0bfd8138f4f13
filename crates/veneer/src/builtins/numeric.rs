//! `Integer` and `Float`.
//!
//! Integers are 64-bit; overflow raises `RangeError` instead of promoting.
//! Mixed integer/float arithmetic produces floats.

use std::cmp::Ordering;

use strum::{EnumIter, IntoStaticStr};

use super::{BuiltinSurface, kernel::hash_int};
use crate::{
    args::CallFrame,
    exception::{ExcType, Exception, RunResult},
    runtime::Runtime,
    value::{Value, stable_hash},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub(crate) enum IntegerMethod {
    #[strum(serialize = "+")]
    Add,
    #[strum(serialize = "-")]
    Sub,
    #[strum(serialize = "*")]
    Mul,
    #[strum(serialize = "/")]
    Div,
    #[strum(serialize = "%")]
    Mod,
    #[strum(serialize = "<=>")]
    Cmp,
    #[strum(serialize = "==")]
    Eq,
    #[strum(serialize = "<")]
    Lt,
    #[strum(serialize = "<=")]
    Le,
    #[strum(serialize = ">")]
    Gt,
    #[strum(serialize = ">=")]
    Ge,
    #[strum(serialize = "eql?")]
    Eql,
    Hash,
    ToS,
    Inspect,
    ToI,
    ToF,
    Succ,
    Abs,
    #[strum(serialize = "zero?")]
    Zero,
}

impl BuiltinSurface for IntegerMethod {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub(crate) enum FloatMethod {
    #[strum(serialize = "+")]
    Add,
    #[strum(serialize = "-")]
    Sub,
    #[strum(serialize = "*")]
    Mul,
    #[strum(serialize = "/")]
    Div,
    #[strum(serialize = "<=>")]
    Cmp,
    #[strum(serialize = "==")]
    Eq,
    #[strum(serialize = "<")]
    Lt,
    #[strum(serialize = "<=")]
    Le,
    #[strum(serialize = ">")]
    Gt,
    #[strum(serialize = ">=")]
    Ge,
    #[strum(serialize = "eql?")]
    Eql,
    Hash,
    ToS,
    Inspect,
    ToI,
    ToF,
    Round,
    Abs,
    #[strum(serialize = "nan?")]
    Nan,
}

impl BuiltinSurface for FloatMethod {}

/// A numeric operand after coercion.
#[derive(Debug, Clone, Copy)]
enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    fn of(value: &Value) -> Option<Self> {
        match value {
            Value::Int(i) => Some(Self::Int(*i)),
            Value::Float(f) => Some(Self::Float(*f)),
            _ => None,
        }
    }

    fn to_f64(self) -> f64 {
        match self {
            Self::Int(i) => i as f64,
            Self::Float(f) => f,
        }
    }

    fn partial_cmp(self, other: Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => Some(a.cmp(&b)),
            (a, b) => a.to_f64().partial_cmp(&b.to_f64()),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Arith {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

fn overflow() -> Exception {
    Exception::new(ExcType::RangeError, "integer overflow")
}

fn divided_by_zero() -> Exception {
    Exception::new(ExcType::ZeroDivisionError, "divided by 0")
}

/// Floor division, rounding toward negative infinity.
fn floor_div(a: i64, b: i64) -> RunResult<i64> {
    if b == 0 {
        return Err(divided_by_zero());
    }
    let quotient = a.checked_div(b).ok_or_else(overflow)?;
    if a % b != 0 && ((a < 0) != (b < 0)) {
        Ok(quotient - 1)
    } else {
        Ok(quotient)
    }
}

/// Modulo taking the sign of the divisor.
fn floor_mod(a: i64, b: i64) -> RunResult<i64> {
    if b == 0 {
        return Err(divided_by_zero());
    }
    let remainder = a.checked_rem(b).ok_or_else(overflow)?;
    if remainder != 0 && ((remainder < 0) != (b < 0)) {
        Ok(remainder + b)
    } else {
        Ok(remainder)
    }
}

fn arith(rt: &Runtime, op: Arith, lhs: Num, rhs: &Value, class_name: &str) -> RunResult<Value> {
    let Some(rhs) = Num::of(rhs) else {
        let other = rt.class_name_of(rhs)?;
        return Err(ExcType::type_error(format!("{other} can't be coerced into {class_name}")));
    };
    match (lhs, rhs) {
        (Num::Int(a), Num::Int(b)) => {
            let result = match op {
                Arith::Add => a.checked_add(b).ok_or_else(overflow)?,
                Arith::Sub => a.checked_sub(b).ok_or_else(overflow)?,
                Arith::Mul => a.checked_mul(b).ok_or_else(overflow)?,
                Arith::Div => floor_div(a, b)?,
                Arith::Mod => floor_mod(a, b)?,
            };
            Ok(Value::Int(result))
        }
        (a, b) => {
            let (a, b) = (a.to_f64(), b.to_f64());
            let result = match op {
                Arith::Add => a + b,
                Arith::Sub => a - b,
                Arith::Mul => a * b,
                Arith::Div => a / b,
                Arith::Mod => a - b * (a / b).floor(),
            };
            Ok(Value::Float(result))
        }
    }
}

fn compare(rt: &Runtime, lhs: Num, rhs: &Value, class_name: &str, accept: fn(Ordering) -> bool) -> RunResult<Value> {
    let ordering = Num::of(rhs).and_then(|rhs| lhs.partial_cmp(rhs));
    match ordering {
        Some(ordering) => Ok(Value::Bool(accept(ordering))),
        None if Num::of(rhs).is_some() => Ok(Value::Bool(false)),
        None => {
            let other = rt.class_name_of(rhs)?;
            Err(ExcType::type_error(format!("comparison of {class_name} with {other} failed")))
        }
    }
}

fn spaceship(lhs: Num, rhs: &Value) -> Value {
    match Num::of(rhs).and_then(|rhs| lhs.partial_cmp(rhs)) {
        Some(Ordering::Less) => Value::Int(-1),
        Some(Ordering::Equal) => Value::Int(0),
        Some(Ordering::Greater) => Value::Int(1),
        None => Value::Nil,
    }
}

fn numeric_eq(lhs: Num, rhs: &Value) -> bool {
    Num::of(rhs).and_then(|rhs| lhs.partial_cmp(rhs)) == Some(Ordering::Equal)
}

/// Formats a float the way `to_s` prints it: always with a fractional part.
pub(crate) fn format_float(f: f64) -> String {
    if f.is_nan() {
        "NaN".to_owned()
    } else if f.is_infinite() {
        let sign = if f > 0.0 { "" } else { "-" };
        format!("{sign}Infinity")
    } else if f.fract() == 0.0 && f.abs() < 1e16 {
        format!("{f:.1}")
    } else {
        format!("{f}")
    }
}

#[expect(clippy::cast_possible_truncation, reason = "checked against the i64 range first")]
fn float_to_int(f: f64) -> RunResult<i64> {
    let truncated = f.trunc();
    if !truncated.is_finite() || truncated < -9.223_372_036_854_776e18 || truncated >= 9.223_372_036_854_776e18 {
        return Err(Exception::new(
            ExcType::RangeError,
            format!("{} out of range of integer", format_float(f)),
        ));
    }
    Ok(truncated as i64)
}

pub(crate) fn call_integer(rt: &mut Runtime, method: IntegerMethod, frame: &CallFrame) -> RunResult<Value> {
    let Value::Int(i) = *frame.receiver() else {
        return Err(ExcType::type_error("Integer method on a non-integer receiver"));
    };
    let args = frame.args();
    let name = frame.name();
    let lhs = Num::Int(i);
    match method {
        IntegerMethod::Add => arith(rt, Arith::Add, lhs, args.get_one_arg(name)?, "Integer"),
        IntegerMethod::Sub => arith(rt, Arith::Sub, lhs, args.get_one_arg(name)?, "Integer"),
        IntegerMethod::Mul => arith(rt, Arith::Mul, lhs, args.get_one_arg(name)?, "Integer"),
        IntegerMethod::Div => arith(rt, Arith::Div, lhs, args.get_one_arg(name)?, "Integer"),
        IntegerMethod::Mod => arith(rt, Arith::Mod, lhs, args.get_one_arg(name)?, "Integer"),
        IntegerMethod::Cmp => Ok(spaceship(lhs, args.get_one_arg(name)?)),
        IntegerMethod::Eq => Ok(Value::Bool(numeric_eq(lhs, args.get_one_arg(name)?))),
        IntegerMethod::Lt => compare(rt, lhs, args.get_one_arg(name)?, "Integer", Ordering::is_lt),
        IntegerMethod::Le => compare(rt, lhs, args.get_one_arg(name)?, "Integer", Ordering::is_le),
        IntegerMethod::Gt => compare(rt, lhs, args.get_one_arg(name)?, "Integer", Ordering::is_gt),
        IntegerMethod::Ge => compare(rt, lhs, args.get_one_arg(name)?, "Integer", Ordering::is_ge),
        IntegerMethod::Eql => Ok(Value::Bool(matches!(args.get_one_arg(name)?, Value::Int(other) if *other == i))),
        IntegerMethod::Hash => {
            args.check_zero_args(name)?;
            Ok(Value::Int(hash_int(stable_hash(&i))))
        }
        IntegerMethod::ToS | IntegerMethod::Inspect => {
            args.check_zero_args(name)?;
            Ok(Value::from(i.to_string()))
        }
        IntegerMethod::ToI => {
            args.check_zero_args(name)?;
            Ok(Value::Int(i))
        }
        IntegerMethod::ToF => {
            args.check_zero_args(name)?;
            Ok(Value::Float(lhs.to_f64()))
        }
        IntegerMethod::Succ => {
            args.check_zero_args(name)?;
            i.checked_add(1).map(Value::Int).ok_or_else(overflow)
        }
        IntegerMethod::Abs => {
            args.check_zero_args(name)?;
            i.checked_abs().map(Value::Int).ok_or_else(overflow)
        }
        IntegerMethod::Zero => {
            args.check_zero_args(name)?;
            Ok(Value::Bool(i == 0))
        }
    }
}

pub(crate) fn call_float(rt: &mut Runtime, method: FloatMethod, frame: &CallFrame) -> RunResult<Value> {
    let Value::Float(f) = *frame.receiver() else {
        return Err(ExcType::type_error("Float method on a non-float receiver"));
    };
    let args = frame.args();
    let name = frame.name();
    let lhs = Num::Float(f);
    match method {
        FloatMethod::Add => arith(rt, Arith::Add, lhs, args.get_one_arg(name)?, "Float"),
        FloatMethod::Sub => arith(rt, Arith::Sub, lhs, args.get_one_arg(name)?, "Float"),
        FloatMethod::Mul => arith(rt, Arith::Mul, lhs, args.get_one_arg(name)?, "Float"),
        FloatMethod::Div => arith(rt, Arith::Div, lhs, args.get_one_arg(name)?, "Float"),
        FloatMethod::Cmp => Ok(spaceship(lhs, args.get_one_arg(name)?)),
        FloatMethod::Eq => Ok(Value::Bool(numeric_eq(lhs, args.get_one_arg(name)?))),
        FloatMethod::Lt => compare(rt, lhs, args.get_one_arg(name)?, "Float", Ordering::is_lt),
        FloatMethod::Le => compare(rt, lhs, args.get_one_arg(name)?, "Float", Ordering::is_le),
        FloatMethod::Gt => compare(rt, lhs, args.get_one_arg(name)?, "Float", Ordering::is_gt),
        FloatMethod::Ge => compare(rt, lhs, args.get_one_arg(name)?, "Float", Ordering::is_ge),
        FloatMethod::Eql => Ok(Value::Bool(
            matches!(args.get_one_arg(name)?, Value::Float(other) if other.to_bits() == f.to_bits()),
        )),
        FloatMethod::Hash => {
            args.check_zero_args(name)?;
            Ok(Value::Int(hash_int(stable_hash(&f.to_bits()))))
        }
        FloatMethod::ToS | FloatMethod::Inspect => {
            args.check_zero_args(name)?;
            Ok(Value::from(format_float(f)))
        }
        FloatMethod::ToI => {
            args.check_zero_args(name)?;
            float_to_int(f).map(Value::Int)
        }
        FloatMethod::ToF => {
            args.check_zero_args(name)?;
            Ok(Value::Float(f))
        }
        FloatMethod::Round => {
            args.check_zero_args(name)?;
            float_to_int(f.round()).map(Value::Int)
        }
        FloatMethod::Abs => {
            args.check_zero_args(name)?;
            Ok(Value::Float(f.abs()))
        }
        FloatMethod::Nan => {
            args.check_zero_args(name)?;
            Ok(Value::Bool(f.is_nan()))
        }
    }
}
