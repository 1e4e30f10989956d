//! Constant folding for the emission engine. Every function answers `None`
//! when the operation has to be materialized as an instruction, either
//! because an operand is not constant or because folding would hide a trap.

use crate::ir::{BinOp, CastOp, ConstInt, IcmpPred, Type, Value};

fn min_of(width: u32) -> i64 {
    if width == 64 {
        i64::MIN
    } else {
        -(1i64 << (width - 1))
    }
}

pub(crate) fn binary(op: BinOp, lhs: Value, rhs: Value) -> Option<Value> {
    let a = lhs.as_const()?;
    let b = rhs.as_const()?;
    debug_assert_eq!(a.ty, b.ty);
    let ty = a.ty;
    let width = ty.int_width()?;
    let raw = match op {
        BinOp::Add => (i128::from(a.value) + i128::from(b.value)) as i64,
        BinOp::Sub => (i128::from(a.value) - i128::from(b.value)) as i64,
        BinOp::Mul => (i128::from(a.value) * i128::from(b.value)) as i64,
        BinOp::Sdiv => {
            // Division that would trap at runtime is left as an instruction.
            if b.value == 0 || (a.value == min_of(width) && b.value == -1) {
                return None;
            }
            a.value / b.value
        }
        BinOp::Udiv => {
            if b.value == 0 {
                return None;
            }
            (a.as_u64() / b.as_u64()) as i64
        }
        BinOp::And => a.value & b.value,
        BinOp::Or => a.value | b.value,
        BinOp::Xor => a.value ^ b.value,
        BinOp::Shl => {
            let amount = b.as_u64();
            if amount >= u64::from(width) {
                return None;
            }
            (a.as_u64() << amount) as i64
        }
        BinOp::Lshr => {
            let amount = b.as_u64();
            if amount >= u64::from(width) {
                return None;
            }
            (a.as_u64() >> amount) as i64
        }
        BinOp::Ashr => {
            let amount = b.as_u64();
            if amount >= u64::from(width) {
                return None;
            }
            a.value >> amount
        }
    };
    Some(Value::Const(ConstInt::new(ty, raw)))
}

pub(crate) fn icmp(pred: IcmpPred, lhs: Value, rhs: Value) -> Option<Value> {
    let a = lhs.as_const()?;
    let b = rhs.as_const()?;
    debug_assert_eq!(a.ty, b.ty);
    let holds = match pred {
        IcmpPred::Eq => a.value == b.value,
        IcmpPred::Ne => a.value != b.value,
        IcmpPred::Slt => a.value < b.value,
        IcmpPred::Sle => a.value <= b.value,
        IcmpPred::Sgt => a.value > b.value,
        IcmpPred::Sge => a.value >= b.value,
        IcmpPred::Ult => a.as_u64() < b.as_u64(),
        IcmpPred::Ule => a.as_u64() <= b.as_u64(),
        IcmpPred::Ugt => a.as_u64() > b.as_u64(),
        IcmpPred::Uge => a.as_u64() >= b.as_u64(),
    };
    Some(Value::Const(ConstInt::bool_value(holds)))
}

pub(crate) fn cast(op: CastOp, value: Value, to: Type) -> Option<Value> {
    let c = value.as_const()?;
    let raw = match op {
        CastOp::Trunc => c.value,
        CastOp::Zext => c.as_u64() as i64,
        // Bool stores 0 or 1, so sign extension maps 1 to all ones.
        CastOp::Sext => {
            if c.ty == Type::Bool {
                -c.value
            } else {
                c.value
            }
        }
    };
    Some(Value::Const(ConstInt::new(to, raw)))
}

pub(crate) fn select(cond: Value, if_true: Value, if_false: Value) -> Option<Value> {
    let c = cond.as_const()?;
    Some(if c.value != 0 { if_true } else { if_false })
}

pub(crate) fn ptr_add(base: Value, offset: Value) -> Option<Value> {
    let c = offset.as_const()?;
    (c.value == 0).then_some(base)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(ty: Type, value: i64) -> Value {
        Value::Const(ConstInt::new(ty, value))
    }

    #[test]
    fn add_wraps_at_width() {
        let folded = binary(BinOp::Add, c(Type::I8, 120), c(Type::I8, 10)).unwrap();
        assert_eq!(folded, c(Type::I8, -126));
    }

    #[test]
    fn trapping_division_is_not_folded() {
        assert!(binary(BinOp::Sdiv, c(Type::I32, 7), c(Type::I32, 0)).is_none());
        assert!(binary(BinOp::Udiv, c(Type::I32, 7), c(Type::I32, 0)).is_none());
        assert!(binary(BinOp::Sdiv, c(Type::I32, i64::from(i32::MIN)), c(Type::I32, -1)).is_none());
        assert_eq!(
            binary(BinOp::Sdiv, c(Type::I32, -9), c(Type::I32, 2)),
            Some(c(Type::I32, -4))
        );
    }

    #[test]
    fn oversized_shift_is_not_folded() {
        assert!(binary(BinOp::Shl, c(Type::I16, 1), c(Type::I16, 16)).is_none());
        assert_eq!(
            binary(BinOp::Shl, c(Type::I16, 1), c(Type::I16, 15)),
            Some(c(Type::I16, i64::from(i16::MIN)))
        );
    }

    #[test]
    fn signed_and_unsigned_compares_differ() {
        assert_eq!(
            icmp(IcmpPred::Slt, c(Type::I32, -1), c(Type::I32, 1)),
            Some(Value::Const(ConstInt::bool_value(true)))
        );
        assert_eq!(
            icmp(IcmpPred::Ult, c(Type::I32, -1), c(Type::I32, 1)),
            Some(Value::Const(ConstInt::bool_value(false)))
        );
    }

    #[test]
    fn sext_of_bool_is_all_ones() {
        assert_eq!(
            cast(CastOp::Sext, Value::Const(ConstInt::bool_value(true)), Type::I32),
            Some(c(Type::I32, -1))
        );
        assert_eq!(
            cast(CastOp::Zext, Value::Const(ConstInt::bool_value(true)), Type::I32),
            Some(c(Type::I32, 1))
        );
    }

    #[test]
    fn select_picks_an_arm() {
        let t = c(Type::I64, 10);
        let f = c(Type::I64, 20);
        assert_eq!(select(Value::Const(ConstInt::bool_value(false)), t, f), Some(f));
        assert_eq!(select(Value::Const(ConstInt::bool_value(true)), t, f), Some(t));
    }
}
