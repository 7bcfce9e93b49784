// cinder-core - Numeric kernel
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Binary arithmetic and comparison shared by the variadic built-ins and
//! the bytecode backend's inline operators.
//!
//! ## Integer behaviour
//!
//! Integer arithmetic is checked: overflow is an `ArithmeticError` rather
//! than a silent wrap. Integer division that is not exact yields a float
//! (there is no ratio type). Dividing an integer by integer zero is an
//! error; float division follows IEEE 754.
//!
//! Faults name the operand to blame so callers can attribute the error to
//! the argument's source location.

use crate::context::Context;
use crate::error::Error;
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl ArithOp {
    pub fn name(self) -> &'static str {
        match self {
            ArithOp::Add => "+",
            ArithOp::Sub => "-",
            ArithOp::Mul => "*",
            ArithOp::Div => "/",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Lt,
    Gt,
    Le,
    Ge,
}

impl CmpOp {
    pub fn name(self) -> &'static str {
        match self {
            CmpOp::Lt => "<",
            CmpOp::Gt => ">",
            CmpOp::Le => "<=",
            CmpOp::Ge => ">=",
        }
    }
}

/// Which part of the expression a fault belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Blame {
    /// Operand 0 or 1 of the binary operation.
    Operand(usize),
    /// The operation as a whole (overflow).
    CallSite,
}

#[derive(Debug, Clone)]
pub struct NumFault {
    pub blame: Blame,
    pub error: Error,
}

impl NumFault {
    fn operand(index: usize, error: Error) -> Self {
        NumFault {
            blame: Blame::Operand(index),
            error,
        }
    }

    fn call_site(error: Error) -> Self {
        NumFault {
            blame: Blame::CallSite,
            error,
        }
    }

    /// Attribute the fault using the context's attribution table. Operand
    /// `k` of the kernel operation is argument `first + k` of the call.
    pub fn into_error(self, ctx: &Context, first: usize) -> Error {
        match self.blame {
            Blame::Operand(k) => ctx.arg_error(first + k, self.error),
            Blame::CallSite => self.error.or_at(ctx.sources.call_site()),
        }
    }
}

pub type NumResult<T> = std::result::Result<T, NumFault>;

fn not_a_number(op: &str, index: usize, v: Value) -> NumFault {
    NumFault::operand(index, Error::type_error_in(op, "number", v.type_name()))
}

fn overflow(op: &str) -> NumFault {
    NumFault::call_site(Error::arithmetic(format!("integer overflow in {}", op)))
}

fn divide_by_zero(index: usize) -> NumFault {
    NumFault::operand(index, Error::arithmetic("Divide by zero"))
}

/// Check that `v` is a number, blaming operand `index` otherwise.
pub fn check_number(op: &str, index: usize, v: Value) -> NumResult<Value> {
    if v.is_number() {
        Ok(v)
    } else {
        Err(not_a_number(op, index, v))
    }
}

fn as_f64(v: Value) -> f64 {
    match v {
        Value::Int(n) => n as f64,
        Value::Float(n) => n,
        _ => f64::NAN,
    }
}

pub fn arith(op: ArithOp, a: Value, b: Value) -> NumResult<Value> {
    let name = op.name();
    check_number(name, 0, a)?;
    check_number(name, 1, b)?;
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => {
            let result = match op {
                ArithOp::Add => x.checked_add(y),
                ArithOp::Sub => x.checked_sub(y),
                ArithOp::Mul => x.checked_mul(y),
                ArithOp::Div => {
                    if y == 0 {
                        return Err(divide_by_zero(1));
                    }
                    let rem = x.checked_rem(y).ok_or_else(|| overflow(name))?;
                    if rem != 0 {
                        return Ok(Value::Float(x as f64 / y as f64));
                    }
                    x.checked_div(y)
                }
            };
            result.map(Value::Int).ok_or_else(|| overflow(name))
        }
        _ => {
            let (x, y) = (as_f64(a), as_f64(b));
            Ok(Value::Float(match op {
                ArithOp::Add => x + y,
                ArithOp::Sub => x - y,
                ArithOp::Mul => x * y,
                ArithOp::Div => x / y,
            }))
        }
    }
}

pub fn compare(op: CmpOp, a: Value, b: Value) -> NumResult<bool> {
    let name = op.name();
    check_number(name, 0, a)?;
    check_number(name, 1, b)?;
    let ordering = match (a, b) {
        (Value::Int(x), Value::Int(y)) => x.partial_cmp(&y),
        _ => as_f64(a).partial_cmp(&as_f64(b)),
    };
    // NaN compares false under every operator
    let Some(ordering) = ordering else {
        return Ok(false);
    };
    Ok(match op {
        CmpOp::Lt => ordering.is_lt(),
        CmpOp::Gt => ordering.is_gt(),
        CmpOp::Le => ordering.is_le(),
        CmpOp::Ge => ordering.is_ge(),
    })
}

/// Unary minus.
pub fn negate(a: Value) -> NumResult<Value> {
    match check_number("-", 0, a)? {
        Value::Int(n) => n.checked_neg().map(Value::Int).ok_or_else(|| overflow("-")),
        v => Ok(Value::Float(-as_f64(v))),
    }
}

/// Integer-style division operators: `quot`, `rem`, `mod`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntDivOp {
    Quot,
    Rem,
    Mod,
}

impl IntDivOp {
    pub fn name(self) -> &'static str {
        match self {
            IntDivOp::Quot => "quot",
            IntDivOp::Rem => "rem",
            IntDivOp::Mod => "mod",
        }
    }
}

pub fn int_div(op: IntDivOp, a: Value, b: Value) -> NumResult<Value> {
    let name = op.name();
    check_number(name, 0, a)?;
    check_number(name, 1, b)?;
    match (a, b) {
        (Value::Int(_), Value::Int(0)) => Err(divide_by_zero(1)),
        (Value::Int(x), Value::Int(y)) => {
            let result = match op {
                IntDivOp::Quot => x.checked_div(y),
                IntDivOp::Rem => x.checked_rem(y),
                IntDivOp::Mod => x.checked_rem(y).map(|r| {
                    if r != 0 && (r < 0) != (y < 0) {
                        r + y
                    } else {
                        r
                    }
                }),
            };
            result.map(Value::Int).ok_or_else(|| overflow(name))
        }
        _ => {
            let (x, y) = (as_f64(a), as_f64(b));
            if y == 0.0 {
                return Err(divide_by_zero(1));
            }
            Ok(Value::Float(match op {
                IntDivOp::Quot => (x / y).trunc(),
                IntDivOp::Rem => x % y,
                IntDivOp::Mod => {
                    let r = x % y;
                    if r != 0.0 && (r < 0.0) != (y < 0.0) {
                        r + y
                    } else {
                        r
                    }
                }
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn int(v: NumResult<Value>) -> i64 {
        match v {
            Ok(Value::Int(n)) => n,
            other => panic!("expected int, got {:?}", other),
        }
    }

    #[test]
    fn integer_arithmetic() {
        assert_eq!(int(arith(ArithOp::Add, Value::Int(2), Value::Int(3))), 5);
        assert_eq!(int(arith(ArithOp::Div, Value::Int(10), Value::Int(2))), 5);
    }

    #[test]
    fn inexact_division_is_float() {
        assert!(matches!(
            arith(ArithOp::Div, Value::Int(1), Value::Int(2)),
            Ok(Value::Float(f)) if f == 0.5
        ));
    }

    #[test]
    fn divide_by_zero_blames_divisor() {
        let fault = arith(ArithOp::Div, Value::Int(10), Value::Int(0)).unwrap_err();
        assert_eq!(fault.blame, Blame::Operand(1));
        assert_eq!(fault.error.kind, ErrorKind::ArithmeticError);
        assert_eq!(fault.error.message, "Divide by zero");
    }

    #[test]
    fn float_division_by_zero_is_infinite() {
        assert!(matches!(
            arith(ArithOp::Div, Value::Float(1.0), Value::Int(0)),
            Ok(Value::Float(f)) if f.is_infinite()
        ));
    }

    #[test]
    fn type_mismatch_blames_operand() {
        let fault = arith(ArithOp::Add, Value::Int(1), Value::Nil).unwrap_err();
        assert_eq!(fault.blame, Blame::Operand(1));
        assert_eq!(fault.error.kind, ErrorKind::TypeMismatch);
        let fault = compare(CmpOp::Lt, Value::Bool(true), Value::Int(1)).unwrap_err();
        assert_eq!(fault.blame, Blame::Operand(0));
    }

    #[test]
    fn overflow_blames_call_site() {
        let fault = arith(ArithOp::Mul, Value::Int(i64::MAX), Value::Int(2)).unwrap_err();
        assert_eq!(fault.blame, Blame::CallSite);
        assert!(negate(Value::Int(i64::MIN)).is_err());
    }

    #[test]
    fn dividing_min_by_minus_one_overflows() {
        let fault = arith(ArithOp::Div, Value::Int(i64::MIN), Value::Int(-1)).unwrap_err();
        assert_eq!(fault.blame, Blame::CallSite);
        assert_eq!(fault.error.kind, ErrorKind::ArithmeticError);
        assert_eq!(fault.error.message, "integer overflow in /");
        assert!(int_div(IntDivOp::Quot, Value::Int(i64::MIN), Value::Int(-1)).is_err());
        assert_eq!(int(arith(ArithOp::Div, Value::Int(i64::MIN), Value::Int(1))), i64::MIN);
    }

    #[test]
    fn mod_follows_divisor_sign() {
        assert_eq!(int(int_div(IntDivOp::Mod, Value::Int(-7), Value::Int(3))), 2);
        assert_eq!(int(int_div(IntDivOp::Rem, Value::Int(-7), Value::Int(3))), -1);
        assert_eq!(int(int_div(IntDivOp::Quot, Value::Int(-7), Value::Int(2))), -3);
    }

    #[test]
    fn nan_compares_false() {
        assert_eq!(compare(CmpOp::Lt, Value::Float(f64::NAN), Value::Int(1)).ok(), Some(false));
    }
}
